//! Network trace records.

use std::collections::HashMap;

use rusqlite::Row;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::record::{ColumnKind, ColumnSpec, Record};

/// One captured request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Unique key within the network table.
    pub identity: String,
    /// App run that produced the trace.
    pub launch_session: String,
    /// Request URL.
    pub url: String,
    /// Request method.
    pub method: String,
    /// Response status code, absent when the request never completed.
    pub status_code: Option<i64>,
    /// Response headers, stored as a JSON text column.
    pub headers: HashMap<String, String>,
    /// Capture timestamp in milliseconds since epoch.
    pub ts_ms: u64,
}

impl Record for NetworkRecord {
    fn table_name() -> &'static str {
        "network_records"
    }

    fn columns() -> &'static [ColumnSpec] {
        const COLUMNS: &[ColumnSpec] = &[
            ColumnSpec::new("url", ColumnKind::Text),
            ColumnSpec::new("method", ColumnKind::Text),
            ColumnSpec::new("status_code", ColumnKind::Integer),
            ColumnSpec::new("headers", ColumnKind::Text),
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
        let headers = serde_json::to_string(&self.headers).unwrap_or_else(|_| "{}".to_string());
        vec![
            Value::Text(self.url.clone()),
            Value::Text(self.method.clone()),
            match self.status_code {
                Some(code) => Value::Integer(code),
                None => Value::Null,
            },
            Value::Text(headers),
            Value::Integer(self.ts_ms as i64),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let headers_json: String = row.get(5)?;
        let headers = serde_json::from_str(&headers_json).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(err))
        })?;
        let ts_ms: i64 = row.get(6)?;
        Ok(Self {
            identity: row.get(0)?,
            launch_session: row.get(1)?,
            url: row.get(2)?,
            method: row.get(3)?,
            status_code: row.get(4)?,
            headers,
            ts_ms: ts_ms as u64,
        })
    }
}
