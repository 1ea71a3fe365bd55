//! Gap repair: fill algorithms, strategy selection, and the repair engine.
//!
//! # Modules
//!
//! - [`fill`]: buffer-level interpolation and fill primitives
//! - [`selector`]: the automatic strategy decision table
//! - [`engine`]: applies a strategy to a whole table

pub mod engine;
pub mod fill;
pub mod selector;

pub use engine::repair;
pub use selector::select_strategy;
