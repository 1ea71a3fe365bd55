//! Timestamp extraction and conversion helpers.
//!
//! All gap arithmetic in this crate runs on epoch milliseconds (`i64`).
//! This module converts between that representation, chrono types, and
//! polars temporal/string columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;

/// Parse a single timestamp string into epoch milliseconds.
///
/// Tries RFC 3339 first, then the common datetime layouts produced by
/// CSV/JSON exports, then a bare date (interpreted as midnight UTC).
/// Returns `None` for anything unparseable.
pub fn parse_timestamp_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}

/// Convert epoch milliseconds to a naive UTC datetime.
///
/// Values outside chrono's representable range clamp to the epoch; the
/// detector never produces such values from real columns.
pub fn ms_to_datetime(ms: i64) -> NaiveDateTime {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Extract a column's timestamps as epoch milliseconds, row-aligned.
///
/// Temporal columns (Datetime in any time unit, or Date) are normalised by
/// casting through `Datetime(ms)`. String columns go through
/// [`parse_timestamp_ms`]; unparseable entries come back as `None` so the
/// caller can drop those rows instead of failing. Integer columns are
/// assumed to already hold epoch milliseconds.
pub fn column_timestamps_ms(col: &Column) -> PolarsResult<Vec<Option<i64>>> {
    let dtype = col.dtype();

    if dtype.is_temporal() {
        let ms = col
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?;
        return Ok(ms.i64()?.into_iter().collect());
    }

    match dtype {
        DataType::String => {
            let ca = col.str()?;
            Ok(ca
                .into_iter()
                .map(|v| v.and_then(parse_timestamp_ms))
                .collect())
        }
        dt if dt.is_integer() => {
            let ms = col.cast(&DataType::Int64)?;
            Ok(ms.i64()?.into_iter().collect())
        }
        dt => Err(PolarsError::ComputeError(
            format!("Column '{}' has non-timestamp dtype {:?}", col.name(), dt).into(),
        )),
    }
}

/// Build a millisecond-resolution datetime series from raw epoch values.
pub fn datetime_series_from_ms(name: &str, ms: Vec<i64>) -> Series {
    Int64Chunked::from_vec(name.into(), ms)
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();

        assert_eq!(parse_timestamp_ms("2024-01-01 06:30:00"), Some(expected));
        assert_eq!(parse_timestamp_ms("2024-01-01T06:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp_ms("2024-01-01T06:30:00+00:00"),
            Some(expected)
        );
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let ms = parse_timestamp_ms("2024-03-15").unwrap();
        assert_eq!(ms_to_datetime(ms).format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp_ms("not a time"), None);
        assert_eq!(parse_timestamp_ms(""), None);
    }

    #[test]
    fn string_column_extraction_keeps_row_alignment() {
        let s = Series::new(
            "ts".into(),
            &[Some("2024-01-01 00:00:00"), Some("bogus"), None],
        );
        let out = column_timestamps_ms(&s.into_column()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].is_some());
        assert!(out[1].is_none());
        assert!(out[2].is_none());
    }

    #[test]
    fn datetime_series_round_trips() {
        let ms = vec![0i64, 3_600_000, 7_200_000];
        let series = datetime_series_from_ms("ts", ms.clone());
        let back = column_timestamps_ms(&series.into_column()).unwrap();
        assert_eq!(back, ms.into_iter().map(Some).collect::<Vec<_>>());
    }
}
