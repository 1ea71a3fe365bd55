//! Top-level coordination: load → detect → decide → guard → repair →
//! backup → persist → report, per file and over batches.

pub mod batch;
pub mod fixer;

pub use batch::{BatchSummary, FileResult};
pub use fixer::{FileFixOutcome, GapFixer};
