//! Keyframes, curves and snippets
//!
//! A snippet is the unit handed to the animation host: a named bundle of
//! per-channel keyframe curves with playback metadata. Its serialized form
//! is the wire shape hosts consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{VisemeId, VisemicResult};

/// Lowest intensity a keyframe can carry
pub const MIN_INTENSITY: f64 = 0.0;
/// Highest intensity a keyframe can carry
pub const MAX_INTENSITY: f64 = 100.0;

/// Priority of ambient (idle, breathing) animation
pub const AMBIENT_PRIORITY: i32 = 10;
/// Priority of lip-sync snippets; overrides ambient animation
pub const LIPSYNC_PRIORITY: i32 = 50;
/// Priority of the neutral-return snippet; overrides in-flight lip-sync
pub const NEUTRAL_RETURN_PRIORITY: i32 = 60;

/// One point on a channel curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds from snippet start
    pub time: f64,
    /// Channel intensity [0, 100]
    pub intensity: f64,
    /// Start from whatever the channel currently holds
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherit: bool,
}

impl Keyframe {
    /// Create a keyframe, clamping time to ≥0 and intensity to [0, 100]
    pub fn new(time: f64, intensity: f64) -> Self {
        Self {
            time: sanitize_time(time),
            intensity: clamp_intensity(intensity),
            inherit: false,
        }
    }

    /// Keyframe that holds the channel's current value
    pub fn inherit(time: f64) -> Self {
        Self {
            time: sanitize_time(time),
            intensity: 0.0,
            inherit: true,
        }
    }
}

#[inline]
fn sanitize_time(time: f64) -> f64 {
    if time.is_finite() {
        time.max(0.0)
    } else {
        0.0
    }
}

/// Clamp an intensity into [0, 100]. NaN collapses to 0.
#[inline]
pub fn clamp_intensity(intensity: f64) -> f64 {
    if intensity.is_nan() {
        MIN_INTENSITY
    } else {
        intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
    }
}

/// Time-ordered keyframes for a single channel
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw keyframes, then sort and collapse time collisions
    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Self {
        let mut curve = Curve { keyframes };
        curve.normalize();
        curve
    }

    /// Append a keyframe. Call [`Curve::normalize`] once all are in.
    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    /// Stable sort by time, then drop earlier-inserted duplicates so the
    /// later-inserted keyframe wins on an exact time collision.
    pub fn normalize(&mut self) {
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut kept: Vec<Keyframe> = Vec::with_capacity(self.keyframes.len());
        for kf in self.keyframes.iter().rev() {
            match kept.last() {
                Some(last) if last.time == kf.time => {}
                _ => kept.push(*kf),
            }
        }
        kept.reverse();
        self.keyframes = kept;
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe (0 for an empty curve)
    pub fn end_time(&self) -> f64 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Highest literal intensity on the curve
    pub fn peak(&self) -> f64 {
        self.keyframes
            .iter()
            .filter(|k| !k.inherit)
            .map(|k| k.intensity)
            .fold(0.0, f64::max)
    }

    /// Multiply every literal intensity, re-clamping
    pub fn scale(&mut self, factor: f64) {
        self.map_intensity(|i| i * factor);
    }

    /// Rewrite every literal intensity through `f`, re-clamping
    pub fn map_intensity(&mut self, mut f: impl FnMut(f64) -> f64) {
        for kf in self.keyframes.iter_mut().filter(|k| !k.inherit) {
            kf.intensity = clamp_intensity(f(kf.intensity));
        }
    }

    /// Times non-decreasing and intensities in range
    pub fn is_well_formed(&self) -> bool {
        self.keyframes.windows(2).all(|w| w[0].time <= w[1].time)
            && self
                .keyframes
                .iter()
                .all(|k| (MIN_INTENSITY..=MAX_INTENSITY).contains(&k.intensity))
    }
}

/// Per-channel curves, ordered by channel index
pub type CurveSet = BTreeMap<VisemeId, Curve>;

/// What kind of animation a snippet carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetCategory {
    /// Viseme channels only
    #[default]
    Viseme,
    /// Visemes plus facial action units
    Combined,
    /// Emotional expression
    Expression,
    /// Idle motion
    Ambient,
}

impl SnippetCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SnippetCategory::Viseme => "viseme",
            SnippetCategory::Combined => "combined",
            SnippetCategory::Expression => "expression",
            SnippetCategory::Ambient => "ambient",
        }
    }
}

/// A named, time-bounded bundle of channel curves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Unique name, doubles as the host-side key
    pub name: String,
    pub curves: CurveSet,
    /// Playback length in seconds, never before the last keyframe
    pub max_time: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub category: SnippetCategory,
    pub priority: i32,
    pub playback_rate: f64,
    pub intensity_scale: f64,
    pub jaw_scale: f64,
}

impl Snippet {
    /// Create a snippet, raising `max_time` to cover every keyframe
    pub fn new(name: impl Into<String>, curves: CurveSet, max_time: f64) -> Self {
        let mut snippet = Self {
            name: name.into(),
            curves,
            max_time: 0.0,
            looping: false,
            category: SnippetCategory::Viseme,
            priority: LIPSYNC_PRIORITY,
            playback_rate: 1.0,
            intensity_scale: 1.0,
            jaw_scale: 1.0,
        };
        snippet.max_time = max_time.max(snippet.latest_keyframe_time());
        snippet
    }

    pub fn with_category(mut self, category: SnippetCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = if rate > 0.0 && rate.is_finite() { rate } else { 1.0 };
        self
    }

    pub fn with_intensity_scale(mut self, scale: f64) -> Self {
        self.intensity_scale = scale;
        self
    }

    pub fn with_jaw_scale(mut self, scale: f64) -> Self {
        self.jaw_scale = scale;
        self
    }

    /// Latest keyframe time across all curves
    pub fn latest_keyframe_time(&self) -> f64 {
        self.curves
            .values()
            .map(Curve::end_time)
            .fold(0.0, f64::max)
    }

    /// Playback duration in wall-clock terms
    pub fn duration_secs(&self) -> f64 {
        self.max_time / self.playback_rate
    }

    /// Serialize to the host wire shape
    pub fn to_json(&self) -> VisemicResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> VisemicResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Host-issued identifier for a scheduled snippet
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnippetHandle(pub String);

impl SnippetHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnippetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArkitViseme;
    use proptest::prelude::*;

    #[test]
    fn test_keyframe_clamps() {
        let kf = Keyframe::new(-1.0, 250.0);
        assert_eq!(kf.time, 0.0);
        assert_eq!(kf.intensity, 100.0);

        let kf = Keyframe::new(0.5, f64::NAN);
        assert_eq!(kf.intensity, 0.0);
    }

    #[test]
    fn test_curve_normalize_keeps_later_insert() {
        let mut curve = Curve::new();
        curve.push(Keyframe::new(0.2, 10.0));
        curve.push(Keyframe::new(0.0, 0.0));
        curve.push(Keyframe::new(0.2, 40.0));
        curve.push(Keyframe::new(0.1, 30.0));
        curve.normalize();

        let times: Vec<f64> = curve.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 0.1, 0.2]);
        assert_eq!(curve.keyframes()[2].intensity, 40.0);
        assert!(curve.is_well_formed());
    }

    #[test]
    fn test_snippet_max_time_covers_keyframes() {
        let mut curves = CurveSet::new();
        curves.insert(
            ArkitViseme::Aa.into(),
            Curve::from_keyframes(vec![Keyframe::new(0.0, 0.0), Keyframe::new(0.4, 80.0)]),
        );
        let snippet = Snippet::new("test", curves, 0.1);
        assert!(snippet.max_time >= 0.4);
    }

    #[test]
    fn test_snippet_wire_shape() {
        let mut curves = CurveSet::new();
        curves.insert(
            ArkitViseme::PP.into(),
            Curve::from_keyframes(vec![Keyframe::inherit(0.0), Keyframe::new(0.15, 0.0)]),
        );
        let snippet = Snippet::new("neutral_return_1", curves, 0.15)
            .with_priority(NEUTRAL_RETURN_PRIORITY);

        let json = snippet.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "neutral_return_1");
        assert_eq!(value["loop"], false);
        assert_eq!(value["category"], "viseme");
        assert_eq!(value["priority"], NEUTRAL_RETURN_PRIORITY);
        assert!(value["maxTime"].is_number());
        assert!(value["playbackRate"].is_number());
        assert!(value["intensityScale"].is_number());
        assert!(value["jawScale"].is_number());

        let curve = &value["curves"]["1"];
        assert_eq!(curve[0]["inherit"], true);
        // inherit omitted when false
        assert!(curve[1].get("inherit").is_none());

        let back = Snippet::from_json(&json).unwrap();
        assert_eq!(back.name, snippet.name);
        assert_eq!(back.priority, snippet.priority);
        assert_eq!(back.curves.len(), 1);
        assert!(back.curves[&VisemeId::from(ArkitViseme::PP)].keyframes()[0].inherit);
    }

    #[test]
    fn test_playback_rate_guard() {
        let snippet = Snippet::new("s", CurveSet::new(), 1.0).with_playback_rate(0.0);
        assert_eq!(snippet.playback_rate, 1.0);
        assert_eq!(snippet.duration_secs(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_well_formed(
            raw in prop::collection::vec((0u8..20, -50.0f64..150.0), 0..40),
        ) {
            let mut curve = Curve::new();
            for (tick, intensity) in &raw {
                curve.push(Keyframe::new(*tick as f64 * 0.05, *intensity));
            }
            curve.normalize();

            prop_assert!(curve.is_well_formed());
            prop_assert!(curve.keyframes().windows(2).all(|w| w[0].time < w[1].time));

            // Last write wins on each time
            for kf in curve.keyframes() {
                let last = raw
                    .iter()
                    .rev()
                    .find(|(tick, _)| *tick as f64 * 0.05 == kf.time)
                    .map(|(_, i)| clamp_intensity(*i));
                prop_assert_eq!(Some(kf.intensity), last);
            }
        }

        #[test]
        fn prop_snippet_covers_keyframes(
            ends in prop::collection::vec(0.0f64..3.0, 1..15),
            max_time in 0.0f64..2.0,
        ) {
            let curves: CurveSet = ends
                .iter()
                .enumerate()
                .map(|(i, end)| {
                    let curve = Curve::from_keyframes(vec![Keyframe::new(0.0, 0.0), Keyframe::new(*end, 50.0)]);
                    (VisemeId::new(i as u8), curve)
                })
                .collect();
            let snippet = Snippet::new("p", curves, max_time);
            prop_assert!(snippet.max_time >= snippet.latest_keyframe_time());
            prop_assert!(snippet.max_time >= max_time);
        }
    }
}
