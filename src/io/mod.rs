//! Dataset file IO.
//!
//! Format is detected from the file extension; the set of supported
//! formats (Parquet, CSV, JSON) is closed. Reads and writes are lossless
//! except for the deliberate mutation of missing-value regions.

pub mod loaders;

#[cfg(test)]
mod loaders_tests;

pub use loaders::{TableFormat, TableLoader};
