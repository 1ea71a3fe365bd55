//! Missing-interval detection over a timestamp column.

use polars::prelude::*;

use crate::core::domain::{DataQuality, GapEntry, GapReport};
use crate::core::error::{GapFixError, GapFixResult};
use crate::detection::frequency::{infer_frequency, DEFAULT_FREQUENCY};
use crate::time::{column_timestamps_ms, ms_to_datetime};

/// Default tolerance multiple: an inter-sample duration strictly greater
/// than `expected_frequency * 1.5` counts as a gap.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.5;

/// Column names tried when the caller does not designate a timestamp field
/// and no temporal-dtype column exists.
const CANDIDATE_NAMES: [&str; 5] = ["timestamp", "time", "datetime", "date", "ts"];

/// Find the timestamp column for a table.
///
/// Resolution order: the requested name if it exists, then the first
/// column with a temporal dtype (this is the explicit materialization of
/// "the index *is* the timestamp"), then a case-insensitive scan over
/// common candidate names. Returns [`GapFixError::NoTimestampField`] when
/// nothing matches.
pub fn resolve_timestamp_column(df: &DataFrame, requested: Option<&str>) -> GapFixResult<String> {
    if let Some(name) = requested {
        if df.column(name).is_ok() {
            return Ok(name.to_string());
        }
    }

    for col in df.get_columns() {
        if col.dtype().is_temporal() {
            return Ok(col.name().to_string());
        }
    }

    for col in df.get_columns() {
        let lower = col.name().to_lowercase();
        if CANDIDATE_NAMES.contains(&lower.as_str()) {
            return Ok(col.name().to_string());
        }
    }

    Err(GapFixError::NoTimestampField)
}

/// Detect gaps in `df` using the default gap tolerance.
pub fn detect(df: &DataFrame, timestamp_field: &str) -> GapFixResult<GapReport> {
    detect_with_tolerance(df, timestamp_field, DEFAULT_GAP_TOLERANCE)
}

/// Detect gaps in `df` with an explicit tolerance multiple.
///
/// Works on a sorted copy of the timestamp column only; the caller's table
/// is never mutated or required to be pre-sorted. Rows whose timestamp
/// cannot be parsed are dropped from detection and noted in the report;
/// detection never fails on malformed timestamps, only on a missing or
/// non-timestamp column.
pub fn detect_with_tolerance(
    df: &DataFrame,
    timestamp_field: &str,
    tolerance: f64,
) -> GapFixResult<GapReport> {
    let col = df
        .column(timestamp_field)
        .map_err(|_| GapFixError::NoTimestampField)?;
    let raw = column_timestamps_ms(col).map_err(|_| GapFixError::NoTimestampField)?;

    let total_raw = raw.len();
    let mut timestamps: Vec<i64> = raw.into_iter().flatten().collect();
    let dropped = total_raw - timestamps.len();
    timestamps.sort_unstable();

    let default_threshold = millis_duration(DEFAULT_FREQUENCY.num_milliseconds() as f64 * tolerance);

    if timestamps.is_empty() {
        let mut report = GapReport::empty(DEFAULT_FREQUENCY, default_threshold);
        if total_raw > 0 {
            // Rows existed but none carried a usable timestamp.
            report.data_quality = DataQuality::Poor;
            report.notes.push(format!(
                "No parseable timestamps in column '{}' ({} rows dropped)",
                timestamp_field, dropped
            ));
        }
        return Ok(report);
    }

    if timestamps.len() == 1 {
        let mut report = GapReport::empty(DEFAULT_FREQUENCY, default_threshold);
        report.total_rows = 1;
        report.time_range = Some((ms_to_datetime(timestamps[0]), ms_to_datetime(timestamps[0])));
        if dropped > 0 {
            report.notes.push(dropped_note(timestamp_field, dropped));
        }
        return Ok(report);
    }

    let frequency = infer_frequency(&timestamps);
    let freq_ms = frequency.num_milliseconds() as f64;
    let threshold_ms = freq_ms * tolerance;

    let mut gap_details = Vec::new();
    let mut gap_count = 0usize;
    for pair in timestamps.windows(2) {
        let duration_ms = (pair[1] - pair[0]) as f64;
        if duration_ms > threshold_ms {
            // Number of missing periods inside the hole. A single dropped
            // hourly row spans 2h between its neighbours but is one gap.
            let size = ((duration_ms / freq_ms).round() as usize)
                .saturating_sub(1)
                .max(1);
            gap_count += size;
            gap_details.push(GapEntry {
                start: ms_to_datetime(pair[0]),
                end: ms_to_datetime(pair[1]),
                size,
                duration: millis_duration(duration_ms),
            });
        }
    }

    let largest_gap = gap_details.iter().max_by_key(|g| g.size).cloned();
    let total_rows = timestamps.len();
    let mut notes = Vec::new();
    if dropped > 0 {
        notes.push(dropped_note(timestamp_field, dropped));
    }

    Ok(GapReport {
        has_gaps: gap_count > 0,
        gap_count,
        gap_details,
        expected_frequency: frequency,
        gap_threshold: millis_duration(threshold_ms),
        data_quality: DataQuality::from_gap_ratio(gap_count as f64 / total_rows as f64),
        time_range: Some((
            ms_to_datetime(timestamps[0]),
            ms_to_datetime(*timestamps.last().unwrap()),
        )),
        total_rows,
        largest_gap,
        notes,
    })
}

fn millis_duration(ms: f64) -> chrono::Duration {
    chrono::Duration::milliseconds(ms.round() as i64)
}

fn dropped_note(field: &str, dropped: usize) -> String {
    format!(
        "{} rows with unparseable timestamps in '{}' were ignored",
        dropped, field
    )
}
