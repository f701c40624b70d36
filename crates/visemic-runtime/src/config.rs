//! Lip-sync configuration
//!
//! Out-of-range values are clamped at assignment, never rejected.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use visemic_core::{VisemicError, VisemicResult};
use visemic_visual::{CoarticulationParams, DominanceCurve};

pub const LIPSYNC_INTENSITY_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const SPEECH_RATE_RANGE: RangeInclusive<f64> = 0.25..=4.0;
pub const JAW_SCALE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const RANDOMNESS_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const NEUTRAL_RETURN_MS_RANGE: RangeInclusive<u64> = 20..=1000;
pub const CLEANUP_BUFFER_MS_MAX: u64 = 5000;

fn clamp_f64(value: f64, range: &RangeInclusive<f64>, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

/// How a unit's curves are built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveStrategy {
    /// Overlapping, dominance-blended envelopes
    #[default]
    Coarticulated,
    /// Independent four-point envelope per event with fixed ramps
    Snap,
}

/// Lip-sync configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Overall mouth intensity multiplier
    pub lipsync_intensity: f64,
    /// Speaking speed (>1 is faster)
    pub speech_rate: f64,
    /// Jaw opening multiplier passed to the host
    pub jaw_scale: f64,
    /// Per-keyframe jitter of peak intensity [0, 1]
    pub randomness: f64,
    pub curve_strategy: CurveStrategy,
    pub coarticulation: CoarticulationParams,
    /// Extra time after a snippet ends before it is removed
    pub cleanup_buffer_ms: u64,
    /// Length of the neutral-return snippet
    pub neutral_return_ms: u64,
    /// Seed for the jitter RNG (entropy when unset)
    pub rng_seed: Option<u64>,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            lipsync_intensity: 1.0,
            speech_rate: 1.0,
            jaw_scale: 1.0,
            randomness: 0.0,
            curve_strategy: CurveStrategy::Coarticulated,
            coarticulation: CoarticulationParams::default(),
            cleanup_buffer_ms: 100,
            neutral_return_ms: 150,
            rng_seed: None,
        }
    }
}

impl LipSyncConfig {
    /// Crisp, fast articulation with no neighbour blending
    pub fn snappy() -> Self {
        Self {
            speech_rate: 1.2,
            curve_strategy: CurveStrategy::Snap,
            coarticulation: CoarticulationParams::none(),
            neutral_return_ms: 100,
            ..Default::default()
        }
    }

    /// Large, loose mouth shapes with heavy blending
    pub fn expressive() -> Self {
        Self {
            lipsync_intensity: 1.3,
            jaw_scale: 1.25,
            randomness: 0.1,
            coarticulation: CoarticulationParams {
                dominance_curve: DominanceCurve::Sigmoid,
                anticipatory_window_ms: 110.0,
                carryover_window_ms: 90.0,
                blend_strength: 0.8,
                context_sensitive: true,
            },
            neutral_return_ms: 220,
            ..Default::default()
        }
    }

    /// Parse JSON, filling missing fields with defaults, then clamp
    pub fn from_json(json: &str) -> VisemicResult<Self> {
        let config: LipSyncConfig =
            serde_json::from_str(json).map_err(|e| VisemicError::InvalidConfig(e.to_string()))?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> VisemicResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with every field clamped into range
    pub fn sanitized(mut self) -> Self {
        self.set_lipsync_intensity(self.lipsync_intensity);
        self.set_speech_rate(self.speech_rate);
        self.set_jaw_scale(self.jaw_scale);
        self.set_randomness(self.randomness);
        self.set_cleanup_buffer_ms(self.cleanup_buffer_ms);
        self.set_neutral_return_ms(self.neutral_return_ms);
        self.coarticulation = self.coarticulation.sanitized();
        self
    }

    pub fn set_lipsync_intensity(&mut self, value: f64) {
        self.lipsync_intensity = clamp_f64(value, &LIPSYNC_INTENSITY_RANGE, 1.0);
    }

    pub fn set_speech_rate(&mut self, value: f64) {
        self.speech_rate = clamp_f64(value, &SPEECH_RATE_RANGE, 1.0);
    }

    pub fn set_jaw_scale(&mut self, value: f64) {
        self.jaw_scale = clamp_f64(value, &JAW_SCALE_RANGE, 1.0);
    }

    pub fn set_randomness(&mut self, value: f64) {
        self.randomness = clamp_f64(value, &RANDOMNESS_RANGE, 0.0);
    }

    pub fn set_cleanup_buffer_ms(&mut self, value: u64) {
        self.cleanup_buffer_ms = value.min(CLEANUP_BUFFER_MS_MAX);
    }

    pub fn set_neutral_return_ms(&mut self, value: u64) {
        self.neutral_return_ms =
            value.clamp(*NEUTRAL_RETURN_MS_RANGE.start(), *NEUTRAL_RETURN_MS_RANGE.end());
    }

    pub fn set_coarticulation(&mut self, params: CoarticulationParams) {
        self.coarticulation = params.sanitized();
    }

    pub fn cleanup_buffer(&self) -> Duration {
        Duration::from_millis(self.cleanup_buffer_ms)
    }

    pub fn neutral_return(&self) -> Duration {
        Duration::from_millis(self.neutral_return_ms)
    }
}
