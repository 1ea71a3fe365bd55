//! Byte-for-byte file snapshots with recoverable restore.
//!
//! Backups land in a `backups/` directory sibling to the original file,
//! named `<stem>_backup_<YYYYMMDD_HHMMSS>.<ext>`. The store never deletes
//! a backup; retention is an external policy.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;

use crate::core::domain::BackupRecord;

/// Creates and restores dataset snapshots.
pub struct BackupStore;

impl BackupStore {
    /// Snapshot `path` into the sibling `backups/` directory.
    ///
    /// Never overwrites: a second-resolution timestamp collision yields an
    /// error and the caller retries. The copy is byte-for-byte.
    pub fn backup(path: &Path) -> Result<BackupRecord> {
        let dir = path
            .parent()
            .context("Backup source has no parent directory")?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Backup source has no file stem")?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bak");

        let backup_dir = dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .with_context(|| format!("Failed to create backup directory {:?}", backup_dir))?;

        let created_at = Local::now().naive_local();
        let backup_path = backup_dir.join(format!(
            "{}_backup_{}.{}",
            stem,
            created_at.format("%Y%m%d_%H%M%S"),
            ext
        ));
        if backup_path.exists() {
            bail!("Backup target {:?} already exists", backup_path);
        }

        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to copy {:?} to {:?}", path, backup_path))?;
        log::debug!("Backed up {:?} to {:?}", path, backup_path);

        Ok(BackupRecord {
            original_path: path.to_path_buf(),
            backup_path,
            created_at,
        })
    }

    /// Copy the backup back over the original path.
    ///
    /// The backup file is kept, and no re-detection runs here; callers
    /// must re-validate the restored file if they need a fresh report.
    pub fn restore(record: &BackupRecord) -> Result<()> {
        fs::copy(&record.backup_path, &record.original_path).with_context(|| {
            format!(
                "Failed to restore {:?} from {:?}",
                record.original_path, record.backup_path
            )
        })?;
        log::debug!(
            "Restored {:?} from {:?}",
            record.original_path,
            record.backup_path
        );
        Ok(())
    }
}
