//! Rolling bandwidth average for the t-shirt eligibility check.

use crate::types::KiloBytesPerSec;

/// Fold a new hourly sample into a cumulative arithmetic mean.
///
/// `avg_bandwidth` has been accumulating for `hours_up` hours; the result is
/// `round((hours_up * avg_bandwidth + sample) / (hours_up + 1))`, rounded
/// half away from zero. With `hours_up == 0` the result is the sample itself.
pub fn new_avg_bandwidth(
    avg_bandwidth: KiloBytesPerSec,
    hours_up: i64,
    sample: KiloBytesPerSec,
) -> KiloBytesPerSec {
    let hours_up = hours_up.max(0);
    let total = (hours_up as f64) * (avg_bandwidth as f64) + sample as f64;
    (total / (hours_up + 1) as f64).round() as KiloBytesPerSec
}
