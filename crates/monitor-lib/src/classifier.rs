//! Threshold classification of CPU samples

use crate::models::{HealthState, Threshold};

/// Classify a utilization percentage against the threshold.
///
/// Strictly greater than the threshold is `Critical`; equality is `Normal`.
pub fn classify(percent: f64, threshold: Threshold) -> HealthState {
    if percent > threshold.percent() {
        HealthState::Critical
    } else {
        HealthState::Normal
    }
}
