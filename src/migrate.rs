//! Schema and data migrations keyed by opaque version strings.

use rusqlite::Connection;

/// Failure while applying a migration version.
#[derive(Debug)]
pub enum MigrateError {
    /// Database failure inside the migration transaction.
    Sqlite(rusqlite::Error),
    /// Failure reported by the host-supplied hook.
    Hook(String),
}

impl From<rusqlite::Error> for MigrateError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Result alias for migration steps.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Host-supplied migration steps.
///
/// The hook owns the meaning of a version string. For a given database file
/// `apply` runs at most once per version, inside the same transaction that
/// records the version as applied, so a failed hook leaves the version
/// unrecorded and its partial changes rolled back.
pub trait MigrationHook: Send {
    /// Applies whatever schema or data changes `version` calls for.
    fn apply(&mut self, conn: &Connection, version: &str) -> MigrateResult<()>;
}
