//! Synthetic arrivals shown when no API key is configured.

use commute_core::LineConfig;
use rand::Rng;

use crate::types::Prediction;

/// Stop identifier used for every synthetic prediction
pub const DEMO_STOP: &str = "demo";

/// Base minutes are drawn from this range before the line's offset is added
pub const DEMO_MINUTES: std::ops::Range<u32> = 3..23;

/// Three synthetic predictions for `line`.
///
/// Each entry draws its own base value; the second and third add the line's
/// demo offsets so the arrivals look spread out.
pub fn demo_predictions<R: Rng>(line: &LineConfig, rng: &mut R) -> Vec<Prediction> {
    std::iter::once(0)
        .chain(line.demo_offsets.iter().copied())
        .map(|offset| Prediction {
            stop_identifier: DEMO_STOP.to_string(),
            route_label: line.label.clone(),
            minutes_until_arrival: rng.random_range(DEMO_MINUTES) + offset,
            direction: line.direction.clone(),
        })
        .collect()
}
