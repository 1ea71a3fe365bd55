//! Sequential batch processing with per-file memory cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::domain::RepairResult;
use crate::orchestrator::fixer::GapFixer;

/// Result of one file within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub result: RepairResult,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_gaps_fixed: usize,
    pub elapsed: Duration,
    pub results: Vec<FileResult>,
}

impl GapFixer {
    /// Process files strictly sequentially, in the order given.
    ///
    /// A file's failure never aborts the batch; it is recorded and the
    /// next file still runs. After every file, successful or not, a
    /// resource cleanup pass runs so long batches cannot accumulate
    /// memory across files.
    pub fn fix_batch<P: AsRef<Path>>(&mut self, paths: &[P]) -> BatchSummary {
        let started = Instant::now();
        let total = paths.len();
        let mut results = Vec::with_capacity(total);

        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            if self.config().show_progress {
                log::info!("[{}/{}] Processing {:?}", i + 1, total, path);
            }

            let outcome = self.fix_file(path);
            if let Some(err) = &outcome.result.error {
                log::warn!("Failed {:?}: {}", path, err);
            }
            results.push(FileResult {
                path: path.to_path_buf(),
                result: outcome.result,
            });

            self.cleanup();
        }

        let succeeded = results.iter().filter(|r| r.result.success).count();
        let total_gaps_fixed = results.iter().map(|r| r.result.gaps_fixed).sum();
        let summary = BatchSummary {
            files_processed: total,
            succeeded,
            failed: total - succeeded,
            total_gaps_fixed,
            elapsed: started.elapsed(),
            results,
        };

        if self.config().show_progress {
            log::info!(
                "Batch done: {}/{} succeeded, {} gaps fixed in {:.1?}",
                summary.succeeded,
                summary.files_processed,
                summary.total_gaps_fixed,
                summary.elapsed
            );
        }
        summary
    }
}
