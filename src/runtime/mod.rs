//! Single-writer execution channel and the storage handle.

/// Handle, configuration, and the spawn entry point.
pub mod handle;

mod worker;
