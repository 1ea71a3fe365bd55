//! Domain models for gap detection and repair.
//!
//! This module provides the core data structures exchanged between the
//! detector, the repair engine, and the orchestrator: gap reports, repair
//! results, backup records, and the engine configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Coarse completeness grade for a dataset, derived from its gap ratio.
///
/// The ratio is `gap_count / total_rows`, where `gap_count` counts missing
/// sampling periods (a gap spanning k periods contributes k).
///
/// # Examples
///
/// ```
/// use gapfix::core::domain::DataQuality;
///
/// assert_eq!(DataQuality::from_gap_ratio(0.0), DataQuality::Excellent);
/// assert_eq!(DataQuality::from_gap_ratio(0.008), DataQuality::Good);
/// assert_eq!(DataQuality::from_gap_ratio(0.03), DataQuality::Fair);
/// assert_eq!(DataQuality::from_gap_ratio(0.2), DataQuality::Poor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl DataQuality {
    /// Grades a gap ratio: 0 → Excellent, ≤1% → Good, ≤5% → Fair, else Poor.
    pub fn from_gap_ratio(ratio: f64) -> Self {
        if ratio <= 0.0 {
            DataQuality::Excellent
        } else if ratio <= 0.01 {
            DataQuality::Good
        } else if ratio <= 0.05 {
            DataQuality::Fair
        } else {
            DataQuality::Poor
        }
    }
}

/// One detected gap: a run of consecutive missing sampling periods.
///
/// `start` and `end` are the observed samples bracketing the hole, so the
/// missing rows lie strictly between them. `size` is the number of missing
/// periods, `round(duration / expected_frequency)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapEntry {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub size: usize,
    pub duration: Duration,
}

/// Result of running gap detection over one table.
///
/// Created fresh per detection call and immutable once returned. Note the
/// counting convention: `gap_count` sums `size` over all entries, so a
/// single hole spanning three periods contributes 3, not 1. Downstream
/// severity grading depends on this.
#[derive(Debug, Clone, PartialEq)]
pub struct GapReport {
    pub has_gaps: bool,
    pub gap_count: usize,
    pub gap_details: Vec<GapEntry>,
    pub expected_frequency: Duration,
    pub gap_threshold: Duration,
    pub data_quality: DataQuality,
    pub time_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub total_rows: usize,
    pub largest_gap: Option<GapEntry>,
    pub notes: Vec<String>,
}

impl GapReport {
    /// A gap-free report for a degenerate table (empty, single row, or no
    /// parseable timestamps).
    pub fn empty(expected_frequency: Duration, gap_threshold: Duration) -> Self {
        Self {
            has_gaps: false,
            gap_count: 0,
            gap_details: Vec::new(),
            expected_frequency,
            gap_threshold,
            data_quality: DataQuality::Excellent,
            time_range: None,
            total_rows: 0,
            largest_gap: None,
            notes: Vec::new(),
        }
    }

    /// Mean gap size over detected gap entries, 0.0 when there are none.
    ///
    /// This is the quantity the automatic strategy selector thresholds on.
    pub fn mean_gap_size(&self) -> f64 {
        if self.gap_details.is_empty() {
            0.0
        } else {
            self.gap_count as f64 / self.gap_details.len() as f64
        }
    }
}

/// Closed set of repair strategies.
///
/// Dispatch is by pattern match, so adding a variant forces every call
/// site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    None,
    ForwardFill,
    BackwardFill,
    Linear,
    Cubic,
    Seasonal,
    Chunked,
    MlForecast,
}

impl RepairStrategy {
    /// The stable identifier used in results and by the CLI collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStrategy::None => "none",
            RepairStrategy::ForwardFill => "forward_fill",
            RepairStrategy::BackwardFill => "backward_fill",
            RepairStrategy::Linear => "linear",
            RepairStrategy::Cubic => "cubic",
            RepairStrategy::Seasonal => "seasonal",
            RepairStrategy::Chunked => "chunked",
            RepairStrategy::MlForecast => "ml_forecast",
        }
    }

    /// `true` for strategies that rebuild the full timestamp grid and so
    /// materialize a new table (the memory-hungry ones).
    pub fn builds_grid(&self) -> bool {
        matches!(
            self,
            RepairStrategy::Linear
                | RepairStrategy::Cubic
                | RepairStrategy::Seasonal
                | RepairStrategy::Chunked
        )
    }
}

impl std::fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepairStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RepairStrategy::None),
            "forward_fill" | "ffill" => Ok(RepairStrategy::ForwardFill),
            "backward_fill" | "bfill" => Ok(RepairStrategy::BackwardFill),
            "linear" => Ok(RepairStrategy::Linear),
            "cubic" => Ok(RepairStrategy::Cubic),
            "seasonal" => Ok(RepairStrategy::Seasonal),
            "chunked" => Ok(RepairStrategy::Chunked),
            "ml_forecast" => Ok(RepairStrategy::MlForecast),
            other => Err(format!("Unknown repair strategy: {}", other)),
        }
    }
}

/// What the caller asked for: a concrete strategy, or automatic selection
/// from the gap report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyChoice {
    Auto,
    Explicit(RepairStrategy),
}

impl FromStr for StrategyChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            Ok(StrategyChoice::Auto)
        } else {
            s.parse().map(StrategyChoice::Explicit)
        }
    }
}

/// Outcome of one repair attempt, file-based or in-memory.
///
/// `algorithm_used` echoes the strategy that actually ran, which may differ
/// from the one requested (cubic falls back to linear below 4 known
/// points). `diagnostics` collects recoverable per-field failures that did
/// not abort the repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairResult {
    pub success: bool,
    pub gaps_fixed: usize,
    pub algorithm_used: RepairStrategy,
    pub processing_time: StdDuration,
    pub memory_used_mb: f64,
    pub backup_path: Option<PathBuf>,
    pub error: Option<String>,
    pub diagnostics: Vec<String>,
}

impl RepairResult {
    /// A failed result carrying only an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            gaps_fixed: 0,
            algorithm_used: RepairStrategy::None,
            processing_time: StdDuration::ZERO,
            memory_used_mb: 0.0,
            backup_path: None,
            error: Some(error.into()),
            diagnostics: Vec::new(),
        }
    }

    /// A trivially successful result for a table with nothing to fix.
    pub fn no_gaps() -> Self {
        Self {
            success: true,
            gaps_fixed: 0,
            algorithm_used: RepairStrategy::None,
            processing_time: StdDuration::ZERO,
            memory_used_mb: 0.0,
            backup_path: None,
            error: None,
            diagnostics: Vec::new(),
        }
    }
}

/// Record of one pre-mutation snapshot. The engine never deletes backups;
/// retention is an external policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub created_at: NaiveDateTime,
}

/// Process-wide memory ceiling, set once at orchestrator construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub limit_mb: u64,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self { limit_mb: 1024 }
    }
}

/// Configuration for the gap fixer.
///
/// `gap_tolerance` is the multiple of the expected frequency beyond which
/// an inter-sample duration counts as a gap. `chunk_size`/`chunk_overlap`
/// drive the windowed code path; the overlap is clamped to at least one
/// row so window boundaries always have a known value on both sides.
#[derive(Debug, Clone)]
pub struct GapFixerConfig {
    pub strategy: StrategyChoice,
    pub budget: ResourceBudget,
    pub require_backup: bool,
    pub show_progress: bool,
    pub gap_tolerance: f64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for GapFixerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyChoice::Auto,
            budget: ResourceBudget::default(),
            require_backup: false,
            show_progress: false,
            gap_tolerance: 1.5,
            chunk_size: 10_000,
            chunk_overlap: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_grade_boundaries() {
        assert_eq!(DataQuality::from_gap_ratio(0.0), DataQuality::Excellent);
        assert_eq!(DataQuality::from_gap_ratio(0.01), DataQuality::Good);
        assert_eq!(DataQuality::from_gap_ratio(0.05), DataQuality::Fair);
        assert_eq!(DataQuality::from_gap_ratio(0.0501), DataQuality::Poor);
    }

    #[test]
    fn strategy_ids_round_trip() {
        for strategy in [
            RepairStrategy::None,
            RepairStrategy::ForwardFill,
            RepairStrategy::BackwardFill,
            RepairStrategy::Linear,
            RepairStrategy::Cubic,
            RepairStrategy::Seasonal,
            RepairStrategy::Chunked,
            RepairStrategy::MlForecast,
        ] {
            assert_eq!(strategy.as_str().parse::<RepairStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn auto_parses_to_choice() {
        assert_eq!("auto".parse::<StrategyChoice>(), Ok(StrategyChoice::Auto));
        assert_eq!(
            "linear".parse::<StrategyChoice>(),
            Ok(StrategyChoice::Explicit(RepairStrategy::Linear))
        );
        assert!("fancy".parse::<StrategyChoice>().is_err());
    }

    #[test]
    fn mean_gap_size_uses_entry_count() {
        let mut report = GapReport::empty(Duration::hours(1), Duration::minutes(90));
        report.gap_details = vec![
            GapEntry {
                start: NaiveDateTime::default(),
                end: NaiveDateTime::default(),
                size: 2,
                duration: Duration::hours(2),
            },
            GapEntry {
                start: NaiveDateTime::default(),
                end: NaiveDateTime::default(),
                size: 4,
                duration: Duration::hours(4),
            },
        ];
        report.gap_count = 6;
        assert_eq!(report.mean_gap_size(), 3.0);
    }
}
