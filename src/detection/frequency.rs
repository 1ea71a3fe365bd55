//! Nominal sampling-frequency inference.

use chrono::Duration;

/// Fallback frequency when a series is too short to infer anything.
pub const DEFAULT_FREQUENCY: Duration = Duration::hours(1);

/// Canonical frequencies, ascending. The inferred median snaps to the
/// smallest ladder value that is at least as large.
const FREQUENCY_LADDER_MS: [i64; 7] = [
    60_000,         // 1 min
    300_000,        // 5 min
    900_000,        // 15 min
    3_600_000,      // 1 hour
    14_400_000,     // 4 hours
    86_400_000,     // 1 day
    604_800_000,    // 1 week
];

/// Infer the nominal sampling interval of a sorted timestamp sequence.
///
/// Takes the median of successive differences rather than the mean, so a
/// handful of large gaps cannot skew the estimate, then snaps to the
/// canonical ladder. Fewer than two timestamps yields [`DEFAULT_FREQUENCY`]
/// (a documented fallback, not an error). Pure function, no side effects.
///
/// # Examples
///
/// ```
/// use gapfix::detection::infer_frequency;
/// use chrono::Duration;
///
/// let hourly: Vec<i64> = (0..10).map(|i| i * 3_600_000).collect();
/// assert_eq!(infer_frequency(&hourly), Duration::hours(1));
/// assert_eq!(infer_frequency(&[0]), Duration::hours(1));
/// ```
pub fn infer_frequency(timestamps_ms: &[i64]) -> Duration {
    if timestamps_ms.len() < 2 {
        return DEFAULT_FREQUENCY;
    }

    let mut diffs: Vec<i64> = timestamps_ms
        .windows(2)
        .map(|w| w[1] - w[0])
        .collect();
    diffs.sort_unstable();

    let median = median_ms(&diffs);
    snap_to_ladder(median)
}

fn median_ms(sorted_diffs: &[i64]) -> f64 {
    let n = sorted_diffs.len();
    if n % 2 == 1 {
        sorted_diffs[n / 2] as f64
    } else {
        (sorted_diffs[n / 2 - 1] as f64 + sorted_diffs[n / 2] as f64) / 2.0
    }
}

/// Smallest ladder frequency ≥ `median_ms`; falls through to 1 week.
fn snap_to_ladder(median_ms: f64) -> Duration {
    for &ladder_ms in &FREQUENCY_LADDER_MS {
        if median_ms <= ladder_ms as f64 {
            return Duration::milliseconds(ladder_ms);
        }
    }
    Duration::milliseconds(*FREQUENCY_LADDER_MS.last().unwrap())
}
