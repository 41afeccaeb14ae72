//! Log entry records.

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::record::{ColumnKind, ColumnSpec, Record};

/// Severity bucket of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Ordinary diagnostic output.
    Default,
    /// Notable event worth surfacing.
    Alert,
    /// Recoverable problem.
    Warning,
    /// Failure the host should inspect.
    Error,
}

impl LogLevel {
    /// Stable name stored in the level column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Alert => "alert",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parses a stored level name; unknown names fall back to `Default`.
    pub fn from_str_lossy(name: &str) -> Self {
        match name {
            "alert" => Self::Alert,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Default,
        }
    }
}

/// One captured log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unique key within the log table.
    pub identity: String,
    /// App run that produced the entry.
    pub launch_session: String,
    /// Severity bucket.
    pub level: LogLevel,
    /// Formatted message text.
    pub message: String,
    /// Source file that emitted the entry.
    pub file: String,
    /// Source line within `file`.
    pub line: u32,
    /// Capture timestamp in milliseconds since epoch.
    pub ts_ms: u64,
}

impl Record for LogRecord {
    fn table_name() -> &'static str {
        "log_records"
    }

    fn columns() -> &'static [ColumnSpec] {
        const COLUMNS: &[ColumnSpec] = &[
            ColumnSpec::new("level", ColumnKind::Text),
            ColumnSpec::new("message", ColumnKind::Text),
            ColumnSpec::new("file", ColumnKind::Text),
            ColumnSpec::new("line", ColumnKind::Integer),
            ColumnSpec::new("ts_ms", ColumnKind::Integer),
        ];
        COLUMNS
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn launch_session(&self) -> &str {
        &self.launch_session
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.level.as_str().to_string()),
            Value::Text(self.message.clone()),
            Value::Text(self.file.clone()),
            Value::Integer(i64::from(self.line)),
            Value::Integer(self.ts_ms as i64),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let level: String = row.get(2)?;
        let line: i64 = row.get(5)?;
        let ts_ms: i64 = row.get(6)?;
        Ok(Self {
            identity: row.get(0)?,
            launch_session: row.get(1)?,
            level: LogLevel::from_str_lossy(&level),
            message: row.get(3)?,
            file: row.get(4)?,
            line: line as u32,
            ts_ms: ts_ms as u64,
        })
    }
}
