//! Built-in record kinds captured by the diagnostic tool.

/// Crash report records.
pub mod crash;
/// Log entry records.
pub mod log;
/// Network trace records.
pub mod network;
