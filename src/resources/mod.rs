//! Process-memory budgeting.
//!
//! The memory ceiling and the usage-reading capability are explicit
//! dependencies injected into the orchestrator, not ambient globals, so
//! the whole engine is testable with a fake reader.

pub mod guard;

pub use guard::{MemoryReader, ResourceGuard, SysinfoMemoryReader};
