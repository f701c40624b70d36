//! Emotional Modulation - Feeling as articulation parameters
//!
//! Each emotion has a base formula in terms of its intensity. Arousal and
//! valence then nudge the result, and every field is clamped to its range.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Valid range of [`EmotionModulators::intensity_scale`]
pub const INTENSITY_SCALE_RANGE: RangeInclusive<f64> = 0.5..=2.0;
/// Valid range of [`EmotionModulators::jaw_scale`]
pub const JAW_SCALE_RANGE: RangeInclusive<f64> = 0.5..=2.0;
/// Valid range of [`EmotionModulators::duration_scale`]
pub const DURATION_SCALE_RANGE: RangeInclusive<f64> = 0.5..=2.0;
/// Valid range of [`EmotionModulators::coarticulation_amount`]
pub const COARTICULATION_AMOUNT_RANGE: RangeInclusive<f64> = 0.5..=1.5;
/// Valid range of [`EmotionModulators::precision_factor`]
pub const PRECISION_FACTOR_RANGE: RangeInclusive<f64> = 0.5..=1.5;
/// Valid range of [`EmotionModulators::energy_level`]
pub const ENERGY_LEVEL_RANGE: RangeInclusive<f64> = 0.0..=1.0;

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

fn unit(value: f64) -> f64 {
    clamp_to(value, &(0.0..=1.0))
}

/// Primary emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionKind {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Disgusted,
    Fearful,
    Contempt,
}

impl EmotionKind {
    pub const ALL: [EmotionKind; 8] = [
        EmotionKind::Neutral,
        EmotionKind::Happy,
        EmotionKind::Sad,
        EmotionKind::Angry,
        EmotionKind::Surprised,
        EmotionKind::Disgusted,
        EmotionKind::Fearful,
        EmotionKind::Contempt,
    ];

    /// Fixed (arousal, valence) for this emotion
    pub fn arousal_valence(self) -> (f64, f64) {
        match self {
            EmotionKind::Neutral => (0.5, 0.0),
            EmotionKind::Happy => (0.7, 0.8),
            EmotionKind::Sad => (0.2, -0.7),
            EmotionKind::Angry => (0.9, -0.6),
            EmotionKind::Surprised => (0.85, 0.2),
            EmotionKind::Disgusted => (0.5, -0.7),
            EmotionKind::Fearful => (0.8, -0.6),
            EmotionKind::Contempt => (0.4, -0.4),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionKind::Neutral => "neutral",
            EmotionKind::Happy => "happy",
            EmotionKind::Sad => "sad",
            EmotionKind::Angry => "angry",
            EmotionKind::Surprised => "surprised",
            EmotionKind::Disgusted => "disgusted",
            EmotionKind::Fearful => "fearful",
            EmotionKind::Contempt => "contempt",
        }
    }
}

/// Current emotional state of the speaker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalContext {
    pub primary_emotion: EmotionKind,
    /// [0, 1]
    pub intensity: f64,
    /// [0, 1]
    pub arousal: f64,
    /// [-1, 1]
    pub valence: f64,
}

impl EmotionalContext {
    /// Context for `kind` at `intensity`, with the emotion's own arousal
    /// and valence
    pub fn new(kind: EmotionKind, intensity: f64) -> Self {
        let (arousal, valence) = kind.arousal_valence();
        Self {
            primary_emotion: kind,
            intensity: unit(intensity),
            arousal,
            valence,
        }
    }

    /// Copy with every field clamped into range
    pub fn clamped(self) -> Self {
        Self {
            primary_emotion: self.primary_emotion,
            intensity: unit(self.intensity),
            arousal: unit(self.arousal),
            valence: if self.valence.is_nan() {
                0.0
            } else {
                self.valence.clamp(-1.0, 1.0)
            },
        }
    }
}

impl Default for EmotionalContext {
    fn default() -> Self {
        Self::new(EmotionKind::Neutral, 0.5)
    }
}

/// Scalars applied on top of base viseme curves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionModulators {
    /// Peak intensity multiplier
    pub intensity_scale: f64,
    /// Jaw opening multiplier
    pub jaw_scale: f64,
    /// Segment duration multiplier (>1 is slower)
    pub duration_scale: f64,
    /// Neighbour blending multiplier
    pub coarticulation_amount: f64,
    /// Articulatory precision (>1 is crisper)
    pub precision_factor: f64,
    pub energy_level: f64,
}

impl EmotionModulators {
    /// Copy with every field clamped into its documented range
    pub fn clamped(self) -> Self {
        Self {
            intensity_scale: clamp_to(self.intensity_scale, &INTENSITY_SCALE_RANGE),
            jaw_scale: clamp_to(self.jaw_scale, &JAW_SCALE_RANGE),
            duration_scale: clamp_to(self.duration_scale, &DURATION_SCALE_RANGE),
            coarticulation_amount: clamp_to(self.coarticulation_amount, &COARTICULATION_AMOUNT_RANGE),
            precision_factor: clamp_to(self.precision_factor, &PRECISION_FACTOR_RANGE),
            energy_level: clamp_to(self.energy_level, &ENERGY_LEVEL_RANGE),
        }
    }

    /// True when every field is inside its range
    pub fn in_range(&self) -> bool {
        INTENSITY_SCALE_RANGE.contains(&self.intensity_scale)
            && JAW_SCALE_RANGE.contains(&self.jaw_scale)
            && DURATION_SCALE_RANGE.contains(&self.duration_scale)
            && COARTICULATION_AMOUNT_RANGE.contains(&self.coarticulation_amount)
            && PRECISION_FACTOR_RANGE.contains(&self.precision_factor)
            && ENERGY_LEVEL_RANGE.contains(&self.energy_level)
    }
}

impl Default for EmotionModulators {
    fn default() -> Self {
        Self {
            intensity_scale: 1.0,
            jaw_scale: 1.0,
            duration_scale: 1.0,
            coarticulation_amount: 1.0,
            precision_factor: 1.0,
            energy_level: 0.5,
        }
    }
}

/// Per-emotion base formulas, before arousal/valence corrections
fn base_modulators(kind: EmotionKind, i: f64) -> EmotionModulators {
    let m = |intensity_scale, jaw_scale, duration_scale, coarticulation_amount, precision_factor, energy_level| {
        EmotionModulators {
            intensity_scale,
            jaw_scale,
            duration_scale,
            coarticulation_amount,
            precision_factor,
            energy_level,
        }
    };

    match kind {
        EmotionKind::Neutral => EmotionModulators::default(),
        EmotionKind::Happy => m(1.2 + 0.3 * i, 1.3 + 0.4 * i, 0.9 - 0.2 * i, 1.1, 0.9, 0.7 + 0.3 * i),
        EmotionKind::Sad => m(0.7 - 0.2 * i, 0.7 - 0.2 * i, 1.1 + 0.4 * i, 1.3, 0.8, 0.3 - 0.2 * i),
        EmotionKind::Angry => m(
            1.4 + 0.4 * i,
            1.2 + 0.3 * i,
            0.85 - 0.15 * i,
            0.8,
            1.2 + 0.3 * i,
            0.8 + 0.2 * i,
        ),
        EmotionKind::Surprised => m(1.3 + 0.3 * i, 1.5 + 0.5 * i, 0.9, 0.9, 1.1, 0.8),
        EmotionKind::Disgusted => m(0.9, 0.8, 1.1, 1.0, 1.1, 0.5),
        EmotionKind::Fearful => m(0.9 + 0.2 * i, 0.9, 0.8 - 0.1 * i, 1.2, 0.8, 0.7),
        EmotionKind::Contempt => m(0.8, 0.7, 1.05, 1.0, 1.05, 0.4),
    }
}

/// Modulators for a context. Pure.
pub fn modulators_for(context: &EmotionalContext) -> EmotionModulators {
    let ctx = context.clamped();
    let mut m = base_modulators(ctx.primary_emotion, ctx.intensity);

    // Low arousal slows down and softens, high arousal the reverse
    m.duration_scale *= 1.0 + (0.5 - ctx.arousal) * 0.3;
    m.intensity_scale *= 0.9 + ctx.arousal * 0.2;

    m.jaw_scale *= 1.0 + 0.1 * ctx.valence;
    m.coarticulation_amount *= 1.0 - 0.1 * ctx.valence;

    m.clamped()
}

/// Interpolated energy and valence between two emotions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionBlend {
    pub energy_level: f64,
    pub valence: f64,
}

/// Holds the current emotional context and derives modulators from it
#[derive(Debug, Clone, Default)]
pub struct EmotionalModulator {
    context: EmotionalContext,
}

impl EmotionalModulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &EmotionalContext {
        &self.context
    }

    /// Replace the context with `kind`'s fixed arousal/valence
    pub fn set_emotion(&mut self, kind: EmotionKind, intensity: f64) {
        self.context = EmotionalContext::new(kind, intensity);
    }

    /// Replace the context with an explicit one (clamped)
    pub fn set_emotional_context(&mut self, context: EmotionalContext) {
        self.context = context.clamped();
    }

    pub fn get_modulators(&self) -> EmotionModulators {
        modulators_for(&self.context)
    }

    /// Linear blend of energy and valence from `from` to `to` at the
    /// current intensity. `t` is clamped to [0, 1].
    pub fn blend_emotions(&self, from: EmotionKind, to: EmotionKind, t: f64) -> EmotionBlend {
        let t = unit(t);
        let a = EmotionalContext::new(from, self.context.intensity);
        let b = EmotionalContext::new(to, self.context.intensity);
        let ea = modulators_for(&a).energy_level;
        let eb = modulators_for(&b).energy_level;

        EmotionBlend {
            energy_level: ea + (eb - ea) * t,
            valence: a.valence + (b.valence - a.valence) * t,
        }
    }
}
