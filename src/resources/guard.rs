//! Memory usage tracking against a configurable ceiling.

use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

use crate::core::domain::ResourceBudget;
use crate::core::error::{GapFixError, GapFixResult};

/// Fraction of the budget that must stay free. Usage above
/// `limit_mb * 0.8` means insufficient headroom for a grid rebuild.
const HEADROOM_FACTOR: f64 = 0.8;

/// Capability for reading (and, where possible, reclaiming) process
/// memory. Production uses [`SysinfoMemoryReader`]; tests inject a fake.
pub trait MemoryReader {
    /// Current resident memory of this process, in megabytes.
    fn usage_mb(&mut self) -> f64;

    /// Best-effort reclamation pass. The default is a no-op: Rust frees
    /// eagerly, so for the real reader there is nothing to collect, but a
    /// fake reader can model memory being released here.
    fn reclaim(&mut self) {}
}

/// Real memory reader backed by `sysinfo`.
pub struct SysinfoMemoryReader {
    system: System,
    pid: Pid,
}

impl SysinfoMemoryReader {
    pub fn new() -> Self {
        Self {
            system: System::new_with_specifics(
                RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()),
            ),
            pid: Pid::from_u32(std::process::id()),
        }
    }
}

impl Default for SysinfoMemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReader for SysinfoMemoryReader {
    fn usage_mb(&mut self) -> f64 {
        self.system
            .refresh_process_specifics(self.pid, ProcessRefreshKind::new().with_memory());
        self.system
            .process(self.pid)
            .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0)
    }
}

/// Tracks process memory against a [`ResourceBudget`] and aborts
/// operations that cannot proceed safely.
pub struct ResourceGuard {
    reader: Box<dyn MemoryReader>,
}

impl ResourceGuard {
    pub fn new(reader: Box<dyn MemoryReader>) -> Self {
        Self { reader }
    }

    /// Current process memory in megabytes.
    pub fn usage_mb(&mut self) -> f64 {
        self.reader.usage_mb()
    }

    /// `true` when usage leaves at least 20% of the budget free.
    pub fn available(&mut self, budget: &ResourceBudget) -> bool {
        self.usage_mb() <= budget.limit_mb as f64 * HEADROOM_FACTOR
    }

    /// Verify headroom before a repair step that materializes a new grid.
    ///
    /// If headroom is insufficient, runs one reclamation pass and checks
    /// again; still over means the repair fails with `InsufficientMemory`
    /// rather than risking an out-of-memory kill.
    pub fn ensure_headroom(&mut self, budget: &ResourceBudget) -> GapFixResult<()> {
        if self.available(budget) {
            return Ok(());
        }
        log::debug!("Memory headroom low, forcing a reclamation pass");
        self.reader.reclaim();
        if self.available(budget) {
            return Ok(());
        }
        Err(GapFixError::InsufficientMemory {
            used_mb: self.usage_mb(),
            limit_mb: budget.limit_mb,
        })
    }

    /// Unconditional reclamation pass, run after every file in a batch
    /// regardless of outcome, so long runs cannot accumulate memory
    /// across files.
    pub fn cleanup(&mut self) {
        self.reader.reclaim();
    }
}
