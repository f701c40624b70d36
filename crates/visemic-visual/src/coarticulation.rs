//! Coarticulation Model - Overlapping mouth shapes
//!
//! Turns an ordered run of viseme events into per-channel keyframe curves.
//! Each event gets a four-point envelope on its own channel; its neighbours
//! bleed in through short cross-channel bumps sized by the anticipatory and
//! carryover windows.
//!
//! All times are computed in milliseconds and converted to seconds once per
//! keyframe, so two events sharing a boundary emit the same `f64` time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;
use visemic_core::{clamp_intensity, ms_to_secs, Curve, CurveSet, Keyframe, PhoneticClass, VisemeId};

use crate::{dominance, BlendDirection, DominanceCurve};

/// Peak offset as a fraction of event duration
const ATTACK_FRACTION: f64 = 0.2;
/// Sustain offset as a fraction of event duration
const SUSTAIN_FRACTION: f64 = 0.8;
/// Sustain level relative to the peak
const SUSTAIN_LEVEL: f64 = 0.85;
/// Height of the bump on the next event's channel
const ANTICIPATORY_BUMP: f64 = 0.3;
/// Height of the bump on the previous event's channel
const CARRYOVER_BUMP: f64 = 0.25;

/// Largest accepted blend window
pub const MAX_WINDOW_MS: f64 = 500.0;

/// One viseme held over a span of the unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisemeEvent {
    pub viseme: VisemeId,
    pub offset_ms: f64,
    pub duration_ms: f64,
}

impl VisemeEvent {
    pub fn new(viseme: VisemeId, offset_ms: f64, duration_ms: f64) -> Self {
        Self {
            viseme,
            offset_ms: non_negative(offset_ms),
            duration_ms: non_negative(duration_ms),
        }
    }

    #[inline]
    pub fn end_ms(&self) -> f64 {
        self.offset_ms + self.duration_ms
    }

    #[inline]
    pub fn class(&self) -> PhoneticClass {
        self.viseme.channel().class()
    }
}

#[inline]
fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// Blend configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarticulationParams {
    pub dominance_curve: DominanceCurve,
    pub anticipatory_window_ms: f64,
    pub carryover_window_ms: f64,
    /// Neighbour influence [0, 1]
    pub blend_strength: f64,
    /// Scale windows by the phonetic class of each event
    pub context_sensitive: bool,
}

impl Default for CoarticulationParams {
    fn default() -> Self {
        Self {
            dominance_curve: DominanceCurve::Cosine,
            anticipatory_window_ms: 80.0,
            carryover_window_ms: 60.0,
            blend_strength: 0.6,
            context_sensitive: true,
        }
    }
}

impl CoarticulationParams {
    /// No neighbour influence at all
    pub fn none() -> Self {
        Self {
            blend_strength: 0.0,
            context_sensitive: false,
            ..Default::default()
        }
    }

    /// Copy with every field clamped into range
    pub fn sanitized(self) -> Self {
        Self {
            anticipatory_window_ms: clamp_window(self.anticipatory_window_ms),
            carryover_window_ms: clamp_window(self.carryover_window_ms),
            blend_strength: if self.blend_strength.is_nan() {
                0.0
            } else {
                self.blend_strength.clamp(0.0, 1.0)
            },
            ..self
        }
    }
}

fn clamp_window(ms: f64) -> f64 {
    if ms.is_nan() {
        0.0
    } else {
        ms.clamp(0.0, MAX_WINDOW_MS)
    }
}

/// Effective blend windows for one event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWindows {
    pub anticipatory_ms: f64,
    pub carryover_ms: f64,
}

/// Event list → blended channel curves
#[derive(Clone, Debug, Default)]
pub struct CoarticulationModel {
    params: CoarticulationParams,
}

impl CoarticulationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: CoarticulationParams) -> Self {
        Self {
            params: params.sanitized(),
        }
    }

    pub fn params(&self) -> &CoarticulationParams {
        &self.params
    }

    pub fn set_params(&mut self, params: CoarticulationParams) {
        self.params = params.sanitized();
    }

    /// Windows for `current`, widened or narrowed by its class and the
    /// class of the event after it.
    pub fn blend_windows(&self, current: &VisemeEvent, next: Option<&VisemeEvent>) -> BlendWindows {
        let mut windows = BlendWindows {
            anticipatory_ms: self.params.anticipatory_window_ms,
            carryover_ms: self.params.carryover_window_ms,
        };
        if !self.params.context_sensitive {
            return windows;
        }

        let class = current.class();
        if let Some(next_class) = next.map(VisemeEvent::class) {
            if class.is_vowel() && next_class.is_vowel() {
                windows.anticipatory_ms *= 1.5;
            }
            if class.is_consonant() && next_class.is_consonant() {
                windows.anticipatory_ms *= 0.7;
                windows.carryover_ms *= 0.7;
            }
        }
        match class {
            PhoneticClass::Stop => {
                windows.anticipatory_ms *= 0.5;
                windows.carryover_ms *= 0.5;
            }
            PhoneticClass::Nasal => windows.carryover_ms *= 1.3,
            PhoneticClass::Fricative => windows.anticipatory_ms *= 1.2,
            _ => {}
        }

        windows
    }

    /// Build blended curves for `events` at `base_intensity` [0, 100].
    ///
    /// Events are processed in offset order. On an exact time collision
    /// within a channel the keyframe written later wins.
    pub fn apply_coarticulation(&self, events: &[VisemeEvent], base_intensity: f64) -> CurveSet {
        let mut ordered = events.to_vec();
        ordered.sort_by(|a, b| a.offset_ms.total_cmp(&b.offset_ms));

        let base = clamp_intensity(base_intensity);
        let blend = self.params.blend_strength;
        let curve = self.params.dominance_curve;

        let mut raw: BTreeMap<VisemeId, Vec<Keyframe>> = BTreeMap::new();
        let mut push = |id: VisemeId, ms: f64, intensity: f64| {
            raw.entry(id)
                .or_default()
                .push(Keyframe::new(ms_to_secs(ms), intensity));
        };

        for (i, event) in ordered.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|p| ordered.get(p));
            let next = ordered.get(i + 1);
            let windows = self.blend_windows(event, next);

            let start = event.offset_ms;
            let end = event.end_ms();
            let duration = event.duration_ms;

            let onset = if prev.is_some() {
                base * dominance(curve, 0.0, BlendDirection::Carryover) * blend
            } else {
                0.0
            };
            let release = if next.is_some() {
                base * dominance(curve, 1.0, BlendDirection::Anticipatory) * blend
            } else {
                0.0
            };

            push(event.viseme, start, onset);
            push(event.viseme, start + duration * ATTACK_FRACTION, base);
            push(event.viseme, start + duration * SUSTAIN_FRACTION, base * SUSTAIN_LEVEL);
            push(event.viseme, end, release);

            if let Some(next) = next.filter(|n| n.viseme != event.viseme) {
                let from = (end - windows.anticipatory_ms).max(start);
                push(next.viseme, from, 0.0);
                push(next.viseme, end, base * ANTICIPATORY_BUMP * blend);
            }

            if let Some(prev) = prev.filter(|p| p.viseme != event.viseme) {
                let to = (start + windows.carryover_ms).min(end);
                push(prev.viseme, start, base * CARRYOVER_BUMP * blend);
                push(prev.viseme, to, 0.0);
            }
        }

        let curves: CurveSet = raw
            .into_iter()
            .map(|(id, keyframes)| (id, Curve::from_keyframes(keyframes)))
            .collect();

        trace!(events = ordered.len(), channels = curves.len(), "coarticulated");
        curves
    }

    /// Instantaneous blend weights `[wA, wB]` of two events at `time_ms`.
    ///
    /// The transition spans `[a.end - anticipatory, b.start + carryover]`.
    /// Before it `a` fully dominates, after it `b` does.
    pub fn calculate_blend_weights(&self, a: &VisemeEvent, b: &VisemeEvent, time_ms: f64) -> [f64; 2] {
        let region_start = a.end_ms() - self.params.anticipatory_window_ms;
        let region_end = b.offset_ms + self.params.carryover_window_ms;

        if time_ms.is_nan() || time_ms <= region_start {
            return [1.0, 0.0];
        }
        if time_ms >= region_end {
            return [0.0, 1.0];
        }

        let progress = (time_ms - region_start) / (region_end - region_start);
        let wb = dominance(self.params.dominance_curve, progress, BlendDirection::Anticipatory);
        [1.0 - wb, wb]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use visemic_core::{ArkitViseme, MAX_INTENSITY, VISEME_CHANNEL_COUNT};

    const EPS: f64 = 1e-9;

    fn ev(v: ArkitViseme, offset: f64, duration: f64) -> VisemeEvent {
        VisemeEvent::new(v.into(), offset, duration)
    }

    fn points(curves: &CurveSet, v: ArkitViseme) -> Vec<(f64, f64)> {
        curves[&VisemeId::from(v)]
            .keyframes()
            .iter()
            .map(|k| (k.time, k.intensity))
            .collect()
    }

    fn assert_points(actual: &[(f64, f64)], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.0 - e.0).abs() < EPS, "time {actual:?} vs {expected:?}");
            assert!((a.1 - e.1).abs() < 1e-6, "intensity {actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_single_event_envelope() {
        let model = CoarticulationModel::new();
        let curves = model.apply_coarticulation(&[ev(ArkitViseme::Aa, 0.0, 100.0)], 80.0);

        assert_eq!(curves.len(), 1);
        assert_points(
            &points(&curves, ArkitViseme::Aa),
            &[(0.0, 0.0), (0.02, 80.0), (0.08, 68.0), (0.1, 0.0)],
        );
    }

    #[test]
    fn test_two_event_blend() {
        let model = CoarticulationModel::new();
        let events = [ev(ArkitViseme::PP, 0.0, 100.0), ev(ArkitViseme::Aa, 100.0, 140.0)];
        let curves = model.apply_coarticulation(&events, 90.0);

        // Stop halves the 80ms anticipatory window; the bump at 0.1 is
        // then overwritten by the vowel's own onset.
        assert_points(
            &points(&curves, ArkitViseme::Aa),
            &[(0.06, 0.0), (0.1, 54.0), (0.128, 90.0), (0.212, 76.5), (0.24, 0.0)],
        );
        // Carryover bump lands after the release at the shared boundary
        assert_points(
            &points(&curves, ArkitViseme::PP),
            &[(0.0, 0.0), (0.02, 90.0), (0.08, 76.5), (0.1, 13.5), (0.16, 0.0)],
        );
    }

    #[test]
    fn test_same_channel_neighbours_skip_bumps() {
        let model = CoarticulationModel::new();
        let events = [ev(ArkitViseme::Aa, 0.0, 100.0), ev(ArkitViseme::Aa, 100.0, 100.0)];
        let curves = model.apply_coarticulation(&events, 50.0);

        assert_eq!(curves.len(), 1);
        let aa = points(&curves, ArkitViseme::Aa);
        // 4 + 4 keyframes sharing one boundary time
        assert_eq!(aa.len(), 7);
        assert!(curves.values().all(Curve::is_well_formed));
    }

    #[test]
    fn test_context_windows() {
        let model = CoarticulationModel::new();
        let vowel = ev(ArkitViseme::Aa, 0.0, 100.0);
        let vowel2 = ev(ArkitViseme::Oh, 100.0, 100.0);
        let stop = ev(ArkitViseme::DD, 0.0, 80.0);
        let fric = ev(ArkitViseme::SS, 0.0, 80.0);
        let nasal = ev(ArkitViseme::Nn, 0.0, 80.0);

        let w = model.blend_windows(&vowel, Some(&vowel2));
        assert!((w.anticipatory_ms - 120.0).abs() < EPS);
        assert!((w.carryover_ms - 60.0).abs() < EPS);

        // Stop followed by a fricative: 0.7 then 0.5
        let w = model.blend_windows(&stop, Some(&fric));
        assert!((w.anticipatory_ms - 28.0).abs() < EPS);
        assert!((w.carryover_ms - 21.0).abs() < EPS);

        let w = model.blend_windows(&nasal, None);
        assert!((w.carryover_ms - 78.0).abs() < EPS);

        let w = model.blend_windows(&fric, Some(&vowel));
        assert!((w.anticipatory_ms - 96.0).abs() < EPS);

        let flat = CoarticulationModel::with_params(CoarticulationParams {
            context_sensitive: false,
            ..Default::default()
        });
        let w = flat.blend_windows(&stop, Some(&fric));
        assert_eq!(w, BlendWindows { anticipatory_ms: 80.0, carryover_ms: 60.0 });
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let model = CoarticulationModel::new();
        let sorted = [ev(ArkitViseme::PP, 0.0, 80.0), ev(ArkitViseme::Aa, 80.0, 140.0)];
        let shuffled = [sorted[1], sorted[0]];
        assert_eq!(
            model.apply_coarticulation(&sorted, 90.0),
            model.apply_coarticulation(&shuffled, 90.0)
        );
    }

    #[test]
    fn test_empty_events() {
        let model = CoarticulationModel::new();
        assert!(model.apply_coarticulation(&[], 90.0).is_empty());
    }

    #[test]
    fn test_params_sanitized() {
        let params = CoarticulationParams {
            anticipatory_window_ms: -5.0,
            carryover_window_ms: 9000.0,
            blend_strength: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.anticipatory_window_ms, 0.0);
        assert_eq!(params.carryover_window_ms, MAX_WINDOW_MS);
        assert_eq!(params.blend_strength, 1.0);
    }

    #[test]
    fn test_params_json_defaults() {
        let params: CoarticulationParams =
            serde_json::from_str(r#"{"dominance_curve":"linear"}"#).unwrap();
        assert_eq!(params.dominance_curve, DominanceCurve::Linear);
        assert_eq!(params.anticipatory_window_ms, 80.0);
    }

    #[test]
    fn test_blend_weights() {
        let model = CoarticulationModel::with_params(CoarticulationParams {
            dominance_curve: DominanceCurve::Linear,
            ..Default::default()
        });
        let a = ev(ArkitViseme::Aa, 0.0, 200.0);
        let b = ev(ArkitViseme::Oh, 200.0, 200.0);

        // Region is [120, 260]
        assert_eq!(model.calculate_blend_weights(&a, &b, 50.0), [1.0, 0.0]);
        assert_eq!(model.calculate_blend_weights(&a, &b, 300.0), [0.0, 1.0]);

        let [wa, wb] = model.calculate_blend_weights(&a, &b, 190.0);
        assert!((wb - 0.5).abs() < EPS);
        assert!((wa + wb - 1.0).abs() < EPS);
    }

    fn arb_events() -> impl Strategy<Value = Vec<VisemeEvent>> {
        prop::collection::vec((0u8..VISEME_CHANNEL_COUNT as u8, 0.0f64..400.0), 0..12).prop_map(
            |specs| {
                let mut offset = 0.0;
                specs
                    .into_iter()
                    .map(|(id, duration)| {
                        let e = VisemeEvent::new(VisemeId::new(id), offset, duration);
                        offset += duration;
                        e
                    })
                    .collect()
            },
        )
    }

    fn arb_params() -> impl Strategy<Value = CoarticulationParams> {
        (0usize..3, 0.0f64..300.0, 0.0f64..300.0, 0.0f64..=1.0, any::<bool>()).prop_map(
            |(c, a, co, b, ctx)| CoarticulationParams {
                dominance_curve: DominanceCurve::ALL[c],
                anticipatory_window_ms: a,
                carryover_window_ms: co,
                blend_strength: b,
                context_sensitive: ctx,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_curves_well_formed(
            events in arb_events(),
            params in arb_params(),
            base in -50.0f64..200.0,
        ) {
            let model = CoarticulationModel::with_params(params);
            let curves = model.apply_coarticulation(&events, base);
            for curve in curves.values() {
                prop_assert!(curve.is_well_formed());
                prop_assert!(curve.peak() <= MAX_INTENSITY);
            }
        }

        #[test]
        fn prop_idempotent(events in arb_events(), params in arb_params(), base in 0.0f64..100.0) {
            let model = CoarticulationModel::with_params(params);
            let first = model.apply_coarticulation(&events, base);
            let second = model.apply_coarticulation(&events, base);
            prop_assert_eq!(first, second);
        }
    }
}
