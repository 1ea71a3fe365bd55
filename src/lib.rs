//! gapfix: time-series gap detection and repair.
//!
//! Infers the nominal sampling frequency of an irregularly-sampled time
//! series, classifies missing intervals, selects a repair strategy suited
//! to the gap profile, applies it under a hard memory budget, and
//! persists the result with a recoverable backup.
//!
//! Entry points: [`orchestrator::GapFixer`] for files and in-memory
//! tables, [`detection::detect`] for a read-only gap report.

pub mod backup;
pub mod core;
pub mod detection;
pub mod io;
pub mod orchestrator;
pub mod repair;
pub mod resources;
pub mod time;

pub use crate::core::domain::{
    DataQuality, GapFixerConfig, GapReport, RepairResult, RepairStrategy, ResourceBudget,
    StrategyChoice,
};
pub use crate::core::error::{GapFixError, GapFixResult};
pub use orchestrator::{BatchSummary, GapFixer};
