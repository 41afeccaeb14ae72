//! Crash report records.

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::record::{ColumnKind, ColumnSpec, Record};

/// One captured crash report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashRecord {
    /// Unique key within the crash table.
    pub identity: String,
    /// App run that produced the report.
    pub launch_session: String,
    /// Exception or signal name.
    pub name: String,
    /// Human-readable failure reason.
    pub reason: String,
    /// Symbolized call stack, stored as a JSON text column.
    pub stack: Vec<String>,
    /// Capture timestamp in milliseconds since epoch.
    pub ts_ms: u64,
}

impl Record for CrashRecord {
    fn table_name() -> &'static str {
        "crash_records"
    }

    fn columns() -> &'static [ColumnSpec] {
        const COLUMNS: &[ColumnSpec] = &[
            ColumnSpec::new("name", ColumnKind::Text),
            ColumnSpec::new("reason", ColumnKind::Text),
            ColumnSpec::new("stack", ColumnKind::Text),
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
        let stack = serde_json::to_string(&self.stack).unwrap_or_else(|_| "[]".to_string());
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.reason.clone()),
            Value::Text(stack),
            Value::Integer(self.ts_ms as i64),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let stack_json: String = row.get(4)?;
        let stack = serde_json::from_str(&stack_json).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
        })?;
        let ts_ms: i64 = row.get(5)?;
        Ok(Self {
            identity: row.get(0)?,
            launch_session: row.get(1)?,
            name: row.get(2)?,
            reason: row.get(3)?,
            stack,
            ts_ms: ts_ms as u64,
        })
    }
}
