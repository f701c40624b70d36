//! Dominance functions
//!
//! How strongly a segment influences its neighbour as a function of
//! normalized position within the blend window.

use serde::{Deserialize, Serialize};

/// Dominance curve shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominanceCurve {
    Linear,
    Sigmoid,
    #[default]
    Cosine,
}

/// Which side of a boundary the influence is evaluated on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendDirection {
    /// Upcoming segment reaching back; rises with `t`
    Anticipatory,
    /// Previous segment lingering; falls with `t`
    Carryover,
}

const SIGMOID_STEEPNESS: f64 = 10.0;

/// Dominance at normalized position `t` (clamped to `[0, 1]`).
///
/// Carryover evaluates the curve at `1 - t`.
pub fn dominance(curve: DominanceCurve, t: f64, direction: BlendDirection) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let x = match direction {
        BlendDirection::Anticipatory => t,
        BlendDirection::Carryover => 1.0 - t,
    };

    match curve {
        DominanceCurve::Linear => x,
        DominanceCurve::Sigmoid => 1.0 / (1.0 + (-SIGMOID_STEEPNESS * (x - 0.5)).exp()),
        DominanceCurve::Cosine => (1.0 - (std::f64::consts::PI * x).cos()) / 2.0,
    }
}

impl DominanceCurve {
    pub const ALL: [DominanceCurve; 3] = [
        DominanceCurve::Linear,
        DominanceCurve::Sigmoid,
        DominanceCurve::Cosine,
    ];

    #[inline]
    pub fn evaluate(self, t: f64, direction: BlendDirection) -> f64 {
        dominance(self, t, direction)
    }
}
