//! Gap detection: sampling-frequency inference and missing-interval scans.
//!
//! Detection is read-only. It works on a sorted copy of the timestamp
//! column and never mutates the caller's table.

pub mod detector;
pub mod frequency;

pub use detector::{detect, resolve_timestamp_column};
pub use frequency::{infer_frequency, DEFAULT_FREQUENCY};
