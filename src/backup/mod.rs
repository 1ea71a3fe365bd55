//! Pre-mutation snapshots of dataset files.

pub mod store;

pub use store::BackupStore;
