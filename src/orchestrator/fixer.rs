//! Per-file and in-memory gap fixing.
//!
//! One file moves through Load → Detect → (NoGapsFound | Repair → Backup
//! → Save). Any step can fail; failures become a `RepairResult` with
//! `success = false` and leave the on-disk original untouched, since the
//! repair runs fully in memory before the backup-then-write sequence.

use std::path::Path;

use polars::prelude::*;

use crate::backup::BackupStore;
use crate::core::domain::{GapFixerConfig, RepairResult, RepairStrategy, StrategyChoice};
use crate::core::error::GapFixError;
use crate::detection::detector::{detect_with_tolerance, resolve_timestamp_column};
use crate::io::TableLoader;
use crate::repair::{engine, select_strategy};
use crate::resources::{MemoryReader, ResourceGuard, SysinfoMemoryReader};

/// Outcome of fixing one file.
///
/// `repaired` carries the in-memory repaired table when a repair ran, even
/// if persisting it failed, so no work is silently lost; on a write
/// failure the on-disk original remains authoritative.
#[derive(Debug)]
pub struct FileFixOutcome {
    pub result: RepairResult,
    pub repaired: Option<DataFrame>,
}

impl FileFixOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            result: RepairResult::failed(error),
            repaired: None,
        }
    }
}

/// Orchestrates gap detection and repair with an explicit memory budget.
///
/// Single-threaded and synchronous; batch processing is a sequential
/// loop. The memory reader is an injected capability so the engine is
/// testable with a fake.
pub struct GapFixer {
    config: GapFixerConfig,
    guard: ResourceGuard,
}

impl GapFixer {
    /// Build a fixer with the real sysinfo-backed memory reader.
    pub fn new(config: GapFixerConfig) -> Self {
        Self::with_reader(config, Box::new(SysinfoMemoryReader::new()))
    }

    /// Build a fixer with an injected memory reader.
    pub fn with_reader(config: GapFixerConfig, reader: Box<dyn MemoryReader>) -> Self {
        Self {
            config,
            guard: ResourceGuard::new(reader),
        }
    }

    pub fn config(&self) -> &GapFixerConfig {
        &self.config
    }

    /// Unconditional post-file resource cleanup; the batch loop calls this
    /// after every file regardless of outcome.
    pub(crate) fn cleanup(&mut self) {
        self.guard.cleanup();
    }

    /// In-memory entry point: repair a table without any file IO.
    ///
    /// On failure the returned table is an untouched clone of the input.
    pub fn fix_table(&mut self, df: &DataFrame, timestamp_field: &str) -> (DataFrame, RepairResult) {
        let report = match detect_with_tolerance(df, timestamp_field, self.config.gap_tolerance) {
            Ok(report) => report,
            Err(e) => return (df.clone(), RepairResult::failed(e.to_string())),
        };

        if !report.has_gaps {
            log::debug!("No gaps found ({} rows)", report.total_rows);
            return (df.clone(), RepairResult::no_gaps());
        }

        let strategy = match self.config.strategy {
            StrategyChoice::Auto => select_strategy(&report),
            StrategyChoice::Explicit(s) => s,
        };
        log::debug!(
            "Detected {} gaps across {} holes, repairing with '{}'",
            report.gap_count,
            report.gap_details.len(),
            strategy
        );

        if let Err(e) = self.guard.ensure_headroom(&self.config.budget) {
            return (df.clone(), RepairResult::failed(e.to_string()));
        }
        if strategy.builds_grid() {
            // Second check right before materializing a full new grid.
            if let Err(e) = self.guard.ensure_headroom(&self.config.budget) {
                return (df.clone(), RepairResult::failed(e.to_string()));
            }
        }

        match engine::repair(df, timestamp_field, &report, strategy, &self.config) {
            Ok((repaired, mut result)) => {
                result.memory_used_mb = self.guard.usage_mb();
                (repaired, result)
            }
            Err(e) => (df.clone(), RepairResult::failed(format!("Repair failed: {e:#}"))),
        }
    }

    /// File entry point: timestamp column resolved automatically.
    pub fn fix_file(&mut self, path: &Path) -> FileFixOutcome {
        self.fix_file_with_field(path, None)
    }

    /// File entry point with an explicit timestamp field.
    pub fn fix_file_with_field(&mut self, path: &Path, field: Option<&str>) -> FileFixOutcome {
        let df = match TableLoader::load(path) {
            Ok(df) => df,
            Err(e) => return FileFixOutcome::failed(e.to_string()),
        };
        log::debug!("Loaded {:?}: {} rows, {} columns", path, df.height(), df.width());

        let timestamp_field = match resolve_timestamp_column(&df, field) {
            Ok(name) => name,
            Err(e) => return FileFixOutcome::failed(e.to_string()),
        };

        let (mut repaired, mut result) = self.fix_table(&df, &timestamp_field);
        if !result.success {
            return FileFixOutcome {
                result,
                repaired: None,
            };
        }
        if result.gaps_fixed == 0 && result.algorithm_used == RepairStrategy::None {
            // Nothing to persist; the original is already complete.
            return FileFixOutcome {
                result,
                repaired: Some(repaired),
            };
        }

        // Backup precedes the write; a write is never attempted before its
        // backup succeeded when backups are required.
        match BackupStore::backup(path) {
            Ok(record) => result.backup_path = Some(record.backup_path),
            Err(e) => {
                if self.config.require_backup {
                    let err = GapFixError::Backup {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    };
                    return FileFixOutcome {
                        result: RepairResult::failed(err.to_string()),
                        repaired: Some(repaired),
                    };
                }
                log::warn!("Proceeding without backup for {:?}: {}", path, e);
            }
        }

        if let Err(e) = TableLoader::write(path, &mut repaired) {
            result.success = false;
            result.error = Some(e.to_string());
            return FileFixOutcome {
                result,
                repaired: Some(repaired),
            };
        }

        log::debug!(
            "Saved {:?}: {} gaps fixed with '{}'",
            path,
            result.gaps_fixed,
            result.algorithm_used
        );
        FileFixOutcome {
            result,
            repaired: Some(repaired),
        }
    }
}
