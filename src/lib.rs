//! Embedded persistence for in-process diagnostic records and screenshots.
//!
//! Record types opt in through the [`record::Record`] trait; their tables are
//! created lazily on first use. All database and screenshot work funnels
//! through one writer thread owning the single SQLite connection, reached via
//! a cloneable [`runtime::handle::StoreHandle`] whose operations come in
//! async and blocking forms sharing one FIFO queue.
//!
//! # Examples
//!
//! ```no_run
//! use diagstore::{
//!     record::Query,
//!     records::log::{LogLevel, LogRecord},
//!     runtime::handle::{spawn_store, StoreConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let handle = spawn_store(StoreConfig::new("/tmp/diag"), None).expect("spawn");
//!
//! handle
//!     .save(LogRecord {
//!         identity: "abc".to_string(),
//!         launch_session: "2024-01-01T00:00:00".to_string(),
//!         level: LogLevel::Warning,
//!         message: "cache miss".to_string(),
//!         file: "cache.rs".to_string(),
//!         line: 41,
//!         ts_ms: 1,
//!     })
//!     .await
//!     .expect("save");
//!
//! let rows: Vec<LogRecord> = handle
//!     .get(Query::for_session("2024-01-01T00:00:00"))
//!     .await
//!     .expect("get");
//! assert_eq!(rows.len(), 1);
//!
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Migration hook and version bookkeeping.
pub mod migrate;
/// Persistable record contract and query filters.
pub mod record;
/// Built-in record kinds.
pub mod records;
/// Single-writer execution channel and the storage handle.
pub mod runtime;
/// Table registration and SQL builders.
pub mod schema;
/// Screenshot blob storage.
pub mod screenshot;

mod legacy;
