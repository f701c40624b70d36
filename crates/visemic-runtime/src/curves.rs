//! Curve strategies
//!
//! Two ways to turn a unit's viseme events into channel curves, selectable
//! through [`CurveStrategy`]. Both produce well-formed curves plus the
//! snippet length they need.

use std::collections::BTreeMap;

use visemic_core::{ms_to_secs, Curve, CurveSet, Keyframe, VisemeId};
use visemic_visual::{CoarticulationModel, CoarticulationParams, VisemeEvent};

use crate::CurveStrategy;

/// Ramp length of a snap envelope
pub const SNAP_RAMP_MS: f64 = 20.0;
/// Tail added after the last event in snap mode
pub const SNAP_TAIL_SECS: f64 = 0.05;
/// Tail added after the last event in coarticulated mode, as a fraction of
/// that event's duration
pub const CARRYOVER_TAIL_FRACTION: f64 = 0.15;

/// Curves for one unit plus the snippet length covering them
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltCurves {
    pub curves: CurveSet,
    pub max_time: f64,
}

/// Events → curves
pub trait CurveBuilder {
    fn build(&self, events: &[VisemeEvent], peak_intensity: f64) -> BuiltCurves;
}

/// Overlapping envelopes from the coarticulation model
#[derive(Clone, Debug, Default)]
pub struct CoarticulatedCurves {
    model: CoarticulationModel,
}

impl CoarticulatedCurves {
    pub fn new(params: CoarticulationParams) -> Self {
        Self {
            model: CoarticulationModel::with_params(params),
        }
    }
}

impl CurveBuilder for CoarticulatedCurves {
    fn build(&self, events: &[VisemeEvent], peak_intensity: f64) -> BuiltCurves {
        let curves = self.model.apply_coarticulation(events, peak_intensity);
        let max_time = events
            .iter()
            .max_by(|a, b| a.end_ms().total_cmp(&b.end_ms()))
            .map(|last| ms_to_secs(last.end_ms() + last.duration_ms * CARRYOVER_TAIL_FRACTION))
            .unwrap_or(0.0);

        BuiltCurves { curves, max_time }
    }
}

/// Independent trapezoid per event: 0 → peak → peak → 0
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapCurves;

impl CurveBuilder for SnapCurves {
    fn build(&self, events: &[VisemeEvent], peak_intensity: f64) -> BuiltCurves {
        let mut raw: BTreeMap<VisemeId, Vec<Keyframe>> = BTreeMap::new();
        let mut last_end_ms: f64 = 0.0;

        for event in events {
            let start = event.offset_ms;
            let end = event.end_ms();
            let ramp = SNAP_RAMP_MS.min(event.duration_ms / 2.0);

            let keyframes = raw.entry(event.viseme).or_default();
            keyframes.push(Keyframe::new(ms_to_secs(start), 0.0));
            keyframes.push(Keyframe::new(ms_to_secs(start + ramp), peak_intensity));
            keyframes.push(Keyframe::new(ms_to_secs(end - ramp), peak_intensity));
            keyframes.push(Keyframe::new(ms_to_secs(end), 0.0));

            last_end_ms = last_end_ms.max(end);
        }

        let curves = raw
            .into_iter()
            .map(|(id, keyframes)| (id, Curve::from_keyframes(keyframes)))
            .collect();
        let max_time = if events.is_empty() {
            0.0
        } else {
            ms_to_secs(last_end_ms) + SNAP_TAIL_SECS
        };

        BuiltCurves { curves, max_time }
    }
}

/// Builder for the configured strategy
pub fn curve_builder(strategy: CurveStrategy, params: CoarticulationParams) -> Box<dyn CurveBuilder> {
    match strategy {
        CurveStrategy::Coarticulated => Box::new(CoarticulatedCurves::new(params)),
        CurveStrategy::Snap => Box::new(SnapCurves),
    }
}
