pub mod domain;
pub mod error;

pub use domain::{
    BackupRecord, DataQuality, GapEntry, GapFixerConfig, GapReport, RepairResult, RepairStrategy,
    ResourceBudget, StrategyChoice,
};
pub use error::{GapFixError, GapFixResult};
