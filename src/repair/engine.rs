//! Applies a repair strategy to a whole table.
//!
//! Grid strategies (`linear`, `cubic`, `seasonal`, `chunked`) rebuild the
//! timestamp axis as the union of a regular grid at the expected frequency
//! and the original timestamps, so off-grid input rows are preserved
//! (repair only fills or adds rows, never deletes). In-place strategies
//! (`forward_fill`, `backward_fill`, `ml_forecast`) fill existing nulls
//! without adding rows.

use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::core::domain::{GapFixerConfig, GapReport, RepairResult, RepairStrategy};
use crate::repair::fill;
use crate::time::{column_timestamps_ms, datetime_series_from_ms};

/// Window length for bounded forward/backward fill in the `seasonal`
/// strategy: 24 grid steps, approximating diurnal repetition on hourly
/// data without a full seasonal model.
const SEASONAL_FILL_STEPS: usize = 24;

/// Apply `strategy` to `df` and return the repaired table plus a result.
///
/// Field-level failures never abort the repair: the offending field is
/// left unfilled and the failure is recorded in the result's diagnostics.
/// `algorithm_used` reports what actually ran, which differs from the
/// request when cubic interpolation falls back to linear for every field.
/// The result's `memory_used_mb` and `backup_path` are left for the
/// orchestrator to fill in.
pub fn repair(
    df: &DataFrame,
    timestamp_field: &str,
    report: &GapReport,
    strategy: RepairStrategy,
    config: &GapFixerConfig,
) -> Result<(DataFrame, RepairResult)> {
    let started = Instant::now();
    let mut diagnostics = Vec::new();
    let mut executed = strategy;

    let repaired = match strategy {
        RepairStrategy::None => df.clone(),
        RepairStrategy::ForwardFill => fill_in_place(
            df,
            timestamp_field,
            FillNullStrategy::Forward(None),
            &mut diagnostics,
        )?,
        RepairStrategy::BackwardFill => fill_in_place(
            df,
            timestamp_field,
            FillNullStrategy::Backward(None),
            &mut diagnostics,
        )?,
        RepairStrategy::MlForecast => rolling_mean_in_place(df, timestamp_field, &mut diagnostics)?,
        RepairStrategy::Linear | RepairStrategy::Cubic | RepairStrategy::Seasonal => {
            let (out, used) = rebuild_on_grid(df, timestamp_field, report, strategy, &mut diagnostics)?;
            executed = used;
            out
        }
        RepairStrategy::Chunked => {
            chunked_linear(df, timestamp_field, report, config, &mut diagnostics)?
        }
    };

    let gaps_fixed = if strategy == RepairStrategy::None {
        0
    } else {
        report.gap_count
    };

    Ok((
        repaired,
        RepairResult {
            success: true,
            gaps_fixed,
            algorithm_used: executed,
            processing_time: started.elapsed(),
            memory_used_mb: 0.0,
            backup_path: None,
            error: None,
            diagnostics,
        },
    ))
}

/// Fill existing nulls in every non-timestamp field with the nearest known
/// value. Row count and dtypes are unchanged; no rows are added.
fn fill_in_place(
    df: &DataFrame,
    timestamp_field: &str,
    strategy: FillNullStrategy,
    diagnostics: &mut Vec<String>,
) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        if col.name().as_str() == timestamp_field {
            columns.push(col.clone());
            continue;
        }
        match col.as_materialized_series().fill_null(strategy) {
            Ok(filled) => columns.push(filled.into_column()),
            Err(e) => {
                diagnostics.push(format!("Field '{}' could not be filled: {}", col.name(), e));
                columns.push(col.clone());
            }
        }
    }
    DataFrame::new(columns).context("Failed to assemble filled table")
}

/// Heuristic forecast fill: a centered rolling mean over each numeric
/// field, window `min(10, rows / 4)`. Non-numeric fields are untouched.
fn rolling_mean_in_place(
    df: &DataFrame,
    timestamp_field: &str,
    diagnostics: &mut Vec<String>,
) -> Result<DataFrame> {
    let window = (df.height() / 4).min(10);
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let dtype = col.dtype();
        if col.name().as_str() == timestamp_field || !(dtype.is_float() || dtype.is_integer()) {
            columns.push(col.clone());
            continue;
        }
        match numeric_buffer(col) {
            Ok(mut buf) => {
                fill::rolling_mean_fill(&mut buf, window);
                columns.push(Series::new(col.name().clone(), buf).into_column());
            }
            Err(e) => {
                diagnostics.push(format!("Field '{}' could not be filled: {}", col.name(), e));
                columns.push(col.clone());
            }
        }
    }
    DataFrame::new(columns).context("Failed to assemble forecast-filled table")
}

/// Rebuild the table on a complete timestamp axis and interpolate.
///
/// Returns the repaired table and the strategy that actually ran: a cubic
/// request where *no* field had the 4 known points the spline needs is
/// reported as linear.
fn rebuild_on_grid(
    df: &DataFrame,
    timestamp_field: &str,
    report: &GapReport,
    strategy: RepairStrategy,
    diagnostics: &mut Vec<String>,
) -> Result<(DataFrame, RepairStrategy)> {
    let ts_col = df
        .column(timestamp_field)
        .with_context(|| format!("Missing timestamp column '{}'", timestamp_field))?;
    let raw = column_timestamps_ms(ts_col)?;

    let mut keyed: Vec<(i64, usize)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.map(|t| (t, i)))
        .collect();
    keyed.sort_unstable();

    let dropped = raw.len() - keyed.len();
    if dropped > 0 {
        diagnostics.push(format!(
            "{} rows with unparseable timestamps were dropped during grid reconstruction",
            dropped
        ));
    }
    if keyed.is_empty() {
        return Ok((df.clone(), strategy));
    }

    let freq_ms = report.expected_frequency.num_milliseconds().max(1);
    let (axis, mapping) = union_axis(&keyed, freq_ms);
    let index: IdxCa = mapping
        .iter()
        .map(|m| m.map(|i| i as IdxSize))
        .collect();

    let mut any_cubic = false;
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        if col.name().as_str() == timestamp_field {
            columns.push(datetime_series_from_ms(timestamp_field, axis.clone()).into_column());
            continue;
        }
        columns.push(rebuild_column(
            col,
            &axis,
            &mapping,
            &index,
            strategy,
            &mut any_cubic,
            diagnostics,
        ));
    }

    let executed = if strategy == RepairStrategy::Cubic && !any_cubic {
        RepairStrategy::Linear
    } else {
        strategy
    };
    let out = DataFrame::new(columns).context("Failed to assemble regridded table")?;
    Ok((out, executed))
}

/// Merge the sorted observed timestamps with a regular grid spanning their
/// range. Observed rows (including duplicates and off-grid samples) all
/// keep a slot; grid points with no observation map to `None`.
fn union_axis(keyed: &[(i64, usize)], freq_ms: i64) -> (Vec<i64>, Vec<Option<usize>>) {
    let start = keyed[0].0;
    let end = keyed[keyed.len() - 1].0;

    let mut axis = Vec::new();
    let mut mapping = Vec::new();
    let mut grid = start;
    let mut k = 0usize;

    while grid <= end || k < keyed.len() {
        if k < keyed.len() && (grid > end || keyed[k].0 < grid) {
            axis.push(keyed[k].0);
            mapping.push(Some(keyed[k].1));
            k += 1;
        } else if k < keyed.len() && grid <= end && keyed[k].0 == grid {
            while k < keyed.len() && keyed[k].0 == grid {
                axis.push(keyed[k].0);
                mapping.push(Some(keyed[k].1));
                k += 1;
            }
            grid += freq_ms;
        } else {
            axis.push(grid);
            mapping.push(None);
            grid += freq_ms;
        }
    }

    (axis, mapping)
}

/// Align one column with the rebuilt axis and fill its holes.
///
/// Numeric fields go through the owned-buffer fill primitives (output
/// dtype is Float64, as interpolated integers are fractional in general).
/// Everything else is gathered positionally and forward-filled. A failure
/// here is recorded and leaves the field aligned but unfilled.
fn rebuild_column(
    col: &Column,
    axis: &[i64],
    mapping: &[Option<usize>],
    index: &IdxCa,
    strategy: RepairStrategy,
    any_cubic: &mut bool,
    diagnostics: &mut Vec<String>,
) -> Column {
    let dtype = col.dtype();
    if dtype.is_float() || dtype.is_integer() {
        match numeric_buffer(col) {
            Ok(orig) => {
                let mut buf: Vec<Option<f64>> =
                    mapping.iter().map(|m| m.and_then(|i| orig[i])).collect();
                match strategy {
                    RepairStrategy::Linear => fill::linear_fill(axis, &mut buf),
                    RepairStrategy::Cubic => {
                        if fill::cubic_fill(axis, &mut buf) {
                            *any_cubic = true;
                        } else {
                            diagnostics.push(format!(
                                "Field '{}' has fewer than 4 known points; cubic fell back to linear",
                                col.name()
                            ));
                            fill::linear_fill(axis, &mut buf);
                        }
                    }
                    RepairStrategy::Seasonal => {
                        fill::forward_fill(&mut buf, Some(SEASONAL_FILL_STEPS));
                        fill::backward_fill(&mut buf, Some(SEASONAL_FILL_STEPS));
                    }
                    _ => unreachable!("grid rebuild only runs for grid strategies"),
                }
                return Series::new(col.name().clone(), buf).into_column();
            }
            Err(e) => {
                diagnostics.push(format!("Field '{}' could not be read: {}", col.name(), e));
                return Series::full_null(col.name().clone(), axis.len(), dtype).into_column();
            }
        }
    }

    // Non-numeric: gather onto the axis, then positional fill. Seasonal
    // keeps its bounded window; other grid strategies forward-fill freely.
    let aligned = col.as_materialized_series().take(index);
    match aligned {
        Ok(s) => {
            let filled = if strategy == RepairStrategy::Seasonal {
                s.fill_null(FillNullStrategy::Forward(Some(SEASONAL_FILL_STEPS as IdxSize)))
                    .and_then(|s| {
                        s.fill_null(FillNullStrategy::Backward(Some(SEASONAL_FILL_STEPS as IdxSize)))
                    })
            } else {
                s.fill_null(FillNullStrategy::Forward(None))
            };
            match filled {
                Ok(s) => s.into_column(),
                Err(e) => {
                    diagnostics.push(format!("Field '{}' could not be filled: {}", col.name(), e));
                    Series::full_null(col.name().clone(), axis.len(), dtype).into_column()
                }
            }
        }
        Err(e) => {
            diagnostics.push(format!("Field '{}' could not be aligned: {}", col.name(), e));
            Series::full_null(col.name().clone(), axis.len(), dtype).into_column()
        }
    }
}

/// Linear repair applied per fixed-size row window, for tables too large
/// to regrid in one pass.
///
/// Consecutive windows overlap by at least one row, so every window
/// boundary has a known value on both sides and the joined result has no
/// worse discontinuities than whole-table linear would. The duplicated
/// boundary rows are trimmed at concatenation.
fn chunked_linear(
    df: &DataFrame,
    timestamp_field: &str,
    report: &GapReport,
    config: &GapFixerConfig,
    diagnostics: &mut Vec<String>,
) -> Result<DataFrame> {
    let raw = column_timestamps_ms(df.column(timestamp_field)?)?;
    let mut keyed: Vec<(i64, usize)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.map(|t| (t, i)))
        .collect();
    keyed.sort_unstable();

    let dropped = raw.len() - keyed.len();
    if dropped > 0 {
        diagnostics.push(format!(
            "{} rows with unparseable timestamps were dropped during chunked repair",
            dropped
        ));
    }
    if keyed.is_empty() {
        return Ok(df.clone());
    }

    let order: IdxCa = keyed.iter().map(|&(_, i)| Some(i as IdxSize)).collect();
    let sorted = df.take(&order).context("Failed to sort table for chunked repair")?;

    let n = sorted.height();
    let window = config.chunk_size.max(2);
    let overlap = config.chunk_overlap.clamp(1, window - 1);

    let mut out: Option<DataFrame> = None;
    let mut last_ts: Option<i64> = None;
    let mut start = 0usize;
    loop {
        let end = (start + window).min(n);
        let slice = sorted.slice(start as i64, end - start);
        let (repaired, _) = rebuild_on_grid(&slice, timestamp_field, report, RepairStrategy::Linear, diagnostics)?;

        // Drop rows already emitted by the previous window.
        let ts = column_timestamps_ms(repaired.column(timestamp_field)?)?;
        let skip = match last_ts {
            Some(cut) => ts.iter().take_while(|t| t.map_or(true, |t| t <= cut)).count(),
            None => 0,
        };
        let fresh = repaired.slice(skip as i64, repaired.height() - skip);
        last_ts = ts.iter().rev().find_map(|t| *t).or(last_ts);

        out = match out {
            None => Some(fresh),
            Some(mut acc) => {
                acc.vstack_mut(&fresh)
                    .context("Failed to concatenate chunk results")?;
                Some(acc)
            }
        };

        if end == n {
            break;
        }
        start = end - overlap;
    }

    Ok(out.unwrap_or_else(|| df.clear()))
}

/// A column's values as an owned `Vec<Option<f64>>` buffer.
fn numeric_buffer(col: &Column) -> PolarsResult<Vec<Option<f64>>> {
    Ok(col.cast(&DataType::Float64)?.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detect;
    use chrono::Duration;

    const H: i64 = 3_600_000;

    fn hourly_df(n: i64, skip: &[i64]) -> DataFrame {
        let ms: Vec<i64> = (0..n)
            .filter(|i| !skip.contains(i))
            .map(|i| i * H)
            .collect();
        let values: Vec<f64> = ms.iter().map(|&m| (m / H) as f64).collect();
        let labels: Vec<String> = ms.iter().map(|&m| format!("r{}", m / H)).collect();
        DataFrame::new(vec![
            datetime_series_from_ms("timestamp", ms).into_column(),
            Series::new("value".into(), values).into_column(),
            Series::new("label".into(), labels).into_column(),
        ])
        .unwrap()
    }

    fn sorted_ts(df: &DataFrame) -> Vec<i64> {
        column_timestamps_ms(df.column("timestamp").unwrap())
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn linear_rebuilds_full_grid_and_interpolates() {
        let df = hourly_df(24, &[5, 10]);
        let report = detect(&df, "timestamp").unwrap();
        let (repaired, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Linear,
            &GapFixerConfig::default(),
        )
        .unwrap();

        assert_eq!(repaired.height(), 24);
        assert_eq!(result.algorithm_used, RepairStrategy::Linear);
        assert_eq!(result.gaps_fixed, report.gap_count);

        // value is linear in time, so interpolation reproduces it exactly.
        let values: Vec<Option<f64>> = repaired
            .column("value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values[5], Some(5.0));
        assert_eq!(values[10], Some(10.0));
        assert!(values.iter().all(|v| v.is_some()));

        // Filled rows take the preceding label.
        let labels: Vec<Option<&str>> = repaired
            .column("label")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(labels[5], Some("r4"));

        // No gaps remain.
        let re = detect(&repaired, "timestamp").unwrap();
        assert_eq!(re.gap_count, 0);
    }

    #[test]
    fn repaired_timestamps_are_monotonic() {
        let df = hourly_df(48, &[3, 4, 5, 30]);
        let report = detect(&df, "timestamp").unwrap();
        for strategy in [
            RepairStrategy::Linear,
            RepairStrategy::Cubic,
            RepairStrategy::Seasonal,
            RepairStrategy::Chunked,
        ] {
            let (repaired, _) = repair(
                &df,
                "timestamp",
                &report,
                strategy,
                &GapFixerConfig::default(),
            )
            .unwrap();
            let ts = sorted_ts(&repaired);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]), "{:?}", strategy);
        }
    }

    #[test]
    fn off_grid_rows_are_conserved() {
        // One sample 10 minutes off the hourly grid must survive the rebuild.
        let mut ms: Vec<i64> = (0..12).map(|i| i * H).collect();
        ms.push(5 * H + 600_000);
        ms.sort_unstable();
        let values: Vec<f64> = (0..ms.len()).map(|i| i as f64).collect();
        let df = DataFrame::new(vec![
            datetime_series_from_ms("timestamp", ms.clone()).into_column(),
            Series::new("value".into(), values).into_column(),
        ])
        .unwrap();

        let report = detect(&df, "timestamp").unwrap();
        let (repaired, _) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Linear,
            &GapFixerConfig::default(),
        )
        .unwrap();

        let out = sorted_ts(&repaired);
        for t in &ms {
            assert!(out.contains(t), "input row at {} was dropped", t);
        }
    }

    #[test]
    fn forward_fill_only_fills_nulls_in_place() {
        let df = DataFrame::new(vec![
            datetime_series_from_ms("timestamp", (0..6).map(|i| i * H).collect()).into_column(),
            Series::new("value".into(), &[Some(1.0), None, None, Some(4.0), None, Some(6.0)])
                .into_column(),
        ])
        .unwrap();
        let report = detect(&df, "timestamp").unwrap();

        let (repaired, _) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::ForwardFill,
            &GapFixerConfig::default(),
        )
        .unwrap();

        assert_eq!(repaired.height(), 6);
        let values: Vec<Option<f64>> = repaired
            .column("value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            values,
            vec![Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(6.0)]
        );
    }

    #[test]
    fn backward_fill_mirrors_forward() {
        let df = DataFrame::new(vec![
            datetime_series_from_ms("timestamp", (0..3).map(|i| i * H).collect()).into_column(),
            Series::new("value".into(), &[None, Some(2.0), None]).into_column(),
        ])
        .unwrap();
        let report = detect(&df, "timestamp").unwrap();

        let (repaired, _) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::BackwardFill,
            &GapFixerConfig::default(),
        )
        .unwrap();
        let values: Vec<Option<f64>> = repaired
            .column("value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(2.0), Some(2.0), None]);
    }

    #[test]
    fn cubic_with_sparse_field_reports_linear() {
        // Three known points: below the spline minimum for every field.
        let df = DataFrame::new(vec![
            datetime_series_from_ms("timestamp", vec![0, H, 3 * H]).into_column(),
            Series::new("value".into(), &[1.0f64, 2.0, 4.0]).into_column(),
        ])
        .unwrap();
        let report = detect(&df, "timestamp").unwrap();

        let (_, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Cubic,
            &GapFixerConfig::default(),
        )
        .unwrap();
        assert_eq!(result.algorithm_used, RepairStrategy::Linear);
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn cubic_with_enough_points_reports_cubic() {
        let df = hourly_df(30, &[12]);
        let report = detect(&df, "timestamp").unwrap();
        let (_, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Cubic,
            &GapFixerConfig::default(),
        )
        .unwrap();
        assert_eq!(result.algorithm_used, RepairStrategy::Cubic);
    }

    #[test]
    fn chunked_matches_linear_on_small_windows() {
        let df = hourly_df(40, &[7, 8, 25]);
        let report = detect(&df, "timestamp").unwrap();

        let (linear, _) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Linear,
            &GapFixerConfig::default(),
        )
        .unwrap();

        let config = GapFixerConfig {
            chunk_size: 10,
            chunk_overlap: 1,
            ..GapFixerConfig::default()
        };
        let (chunked, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Chunked,
            &config,
        )
        .unwrap();

        assert_eq!(result.algorithm_used, RepairStrategy::Chunked);
        assert_eq!(chunked.height(), linear.height());
        assert_eq!(sorted_ts(&chunked), sorted_ts(&linear));

        let a: Vec<Option<f64>> = linear.column("value").unwrap().f64().unwrap().into_iter().collect();
        let b: Vec<Option<f64>> = chunked.column("value").unwrap().f64().unwrap().into_iter().collect();
        for (x, y) in a.iter().zip(b.iter()) {
            let (x, y) = (x.unwrap(), y.unwrap());
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn seasonal_uses_bounded_fill() {
        // A 30-step hole: forward fill covers 24 steps, backward fill the rest.
        let skip: Vec<i64> = (10..40).collect();
        let df = hourly_df(60, &skip);
        let report = detect(&df, "timestamp").unwrap();

        let (repaired, _) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::Seasonal,
            &GapFixerConfig::default(),
        )
        .unwrap();
        assert_eq!(repaired.height(), 60);
        let values: Vec<Option<f64>> = repaired
            .column("value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert!(values.iter().all(|v| v.is_some()));
        // Forward-filled region holds the value before the hole.
        assert_eq!(values[20], Some(9.0));
        // Backward-filled tail of the hole holds the value after it.
        assert_eq!(values[38], Some(40.0));
    }

    #[test]
    fn ml_forecast_fills_existing_nulls() {
        let df = DataFrame::new(vec![
            datetime_series_from_ms("timestamp", (0..8).map(|i| i * H).collect()).into_column(),
            Series::new(
                "value".into(),
                &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), None, Some(7.0), Some(8.0)],
            )
            .into_column(),
        ])
        .unwrap();
        let report = detect(&df, "timestamp").unwrap();

        let (repaired, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::MlForecast,
            &GapFixerConfig::default(),
        )
        .unwrap();
        assert_eq!(result.algorithm_used, RepairStrategy::MlForecast);
        assert_eq!(repaired.height(), 8);
        let values: Vec<Option<f64>> = repaired
            .column("value")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert!(values.iter().all(|v| v.is_some()));
    }

    #[test]
    fn none_strategy_is_identity() {
        let df = hourly_df(10, &[4]);
        let report = detect(&df, "timestamp").unwrap();
        let (repaired, result) = repair(
            &df,
            "timestamp",
            &report,
            RepairStrategy::None,
            &GapFixerConfig::default(),
        )
        .unwrap();
        assert_eq!(repaired.height(), df.height());
        assert_eq!(result.gaps_fixed, 0);
    }
}
