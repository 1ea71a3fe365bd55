//! Automatic repair-strategy selection.

use crate::core::domain::{GapReport, RepairStrategy};

/// Map a gap report to a repair strategy.
///
/// Deterministic decision table, first match wins:
///
/// | Condition                | Strategy       |
/// |--------------------------|----------------|
/// | `gap_count == 0`         | `none`         |
/// | mean gap size ≤ 5        | `forward_fill` |
/// | mean gap size ≤ 20       | `linear`       |
/// | mean gap size ≤ 100      | `cubic`        |
/// | otherwise                | `chunked`      |
///
/// Cheap strategies for brief blips, smoother interpolation for moderate
/// holes, windowed processing once gap volume threatens memory.
pub fn select_strategy(report: &GapReport) -> RepairStrategy {
    if report.gap_count == 0 {
        return RepairStrategy::None;
    }

    let mean = report.mean_gap_size();
    if mean <= 5.0 {
        RepairStrategy::ForwardFill
    } else if mean <= 20.0 {
        RepairStrategy::Linear
    } else if mean <= 100.0 {
        RepairStrategy::Cubic
    } else {
        RepairStrategy::Chunked
    }
}
