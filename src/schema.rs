//! Table registration: mapping validation and SQL statement builders.

use hashbrown::HashSet;
use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::debug;

use crate::record::{ColumnSpec, Query, Record};

/// Prefix of tables owned by the store itself, off limits to record types.
pub(crate) const META_TABLE_PREFIX: &str = "diag_";

/// Failure while validating a record mapping or creating its table.
#[derive(Debug)]
pub enum SchemaError {
    /// Table or column name is empty or not a bare identifier.
    InvalidName(String),
    /// Name collides with an implicit column or an internal table prefix.
    ReservedName(String),
    /// The same column is declared twice.
    DuplicateColumn(String),
    /// Database failure executing the DDL.
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Result alias for schema registration.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Tracks which record tables this process has already ensured.
///
/// The underlying `CREATE TABLE IF NOT EXISTS` statements are idempotent on
/// their own; the set only short-circuits re-validation on hot paths.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    ensured: HashSet<&'static str>,
}

impl SchemaRegistry {
    /// Empty registry; tables are ensured on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `R`'s table and session index if missing. Safe to call
    /// repeatedly for the same type.
    pub fn ensure<R: Record>(&mut self, conn: &Connection) -> SchemaResult<()> {
        self.ensure_mapping(conn, R::table_name(), R::columns())
    }

    fn ensure_mapping(
        &mut self,
        conn: &Connection,
        table: &'static str,
        columns: &'static [ColumnSpec],
    ) -> SchemaResult<()> {
        if self.ensured.contains(table) {
            return Ok(());
        }
        validate_mapping(table, columns)?;
        conn.execute(&create_table_sql(table, columns), [])?;
        conn.execute(&create_index_sql(table), [])?;
        self.ensured.insert(table);
        debug!(table, "record table ensured");
        Ok(())
    }
}

/// Checks a declared table/column mapping without touching the database.
pub fn validate_mapping(table: &str, columns: &[ColumnSpec]) -> SchemaResult<()> {
    if !valid_identifier(table) {
        return Err(SchemaError::InvalidName(table.to_string()));
    }
    if table.starts_with(META_TABLE_PREFIX) || table.starts_with("sqlite_") {
        return Err(SchemaError::ReservedName(table.to_string()));
    }
    let mut seen = HashSet::new();
    for col in columns {
        if !valid_identifier(col.name) {
            return Err(SchemaError::InvalidName(col.name.to_string()));
        }
        if col.name == "identity" || col.name == "launch_session" {
            return Err(SchemaError::ReservedName(col.name.to_string()));
        }
        if !seen.insert(col.name) {
            return Err(SchemaError::DuplicateColumn(col.name.to_string()));
        }
    }
    Ok(())
}

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn create_table_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} \
         (identity TEXT PRIMARY KEY, launch_session TEXT NOT NULL"
    );
    for col in columns {
        sql.push_str(", ");
        sql.push_str(col.name);
        sql.push(' ');
        sql.push_str(col.kind.sql_type());
    }
    sql.push(')');
    sql
}

fn create_index_sql(table: &str) -> String {
    format!("CREATE INDEX IF NOT EXISTS idx_{table}_session ON {table} (launch_session)")
}

pub(crate) fn insert_sql(table: &str, columns: &[ColumnSpec], replace: bool) -> String {
    let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
    let mut sql = format!("{verb} INTO {table} (identity, launch_session");
    for col in columns {
        sql.push_str(", ");
        sql.push_str(col.name);
    }
    sql.push_str(") VALUES (?, ?");
    for _ in columns {
        sql.push_str(", ?");
    }
    sql.push(')');
    sql
}

/// Builds the filtered select plus its positional parameters, in insertion
/// (rowid) order.
pub(crate) fn select_sql(table: &str, columns: &[ColumnSpec], query: &Query) -> (String, Vec<Value>) {
    let mut sql = String::from("SELECT identity, launch_session");
    for col in columns {
        sql.push_str(", ");
        sql.push_str(col.name);
    }
    sql.push_str(" FROM ");
    sql.push_str(table);

    let mut params = Vec::new();
    if let Some(session) = &query.launch_session {
        sql.push_str(" WHERE launch_session = ?");
        params.push(Value::Text(session.clone()));
    }
    if let Some(identity) = &query.identity {
        sql.push_str(if params.is_empty() { " WHERE " } else { " AND " });
        sql.push_str("identity = ?");
        params.push(Value::Text(identity.clone()));
    }
    sql.push_str(" ORDER BY rowid ASC");
    (sql, params)
}

pub(crate) fn delete_sql(table: &str) -> String {
    format!("DELETE FROM {table} WHERE identity = ?1")
}

pub(crate) fn clear_sql(table: &str) -> String {
    format!("DELETE FROM {table}")
}
