//! Persistable record contract and query filters.

use rusqlite::Row;
use rusqlite::types::Value;

/// SQLite storage class of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// UTF-8 text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Real,
    /// Raw bytes.
    Blob,
}

impl ColumnKind {
    pub(crate) fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
        }
    }
}

/// One declared payload column of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name, a bare SQL identifier.
    pub name: &'static str,
    /// Storage class.
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Const constructor usable in static column tables.
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Exact-match filters for record queries.
///
/// `Default` matches every row. Setting both fields narrows the result to at
/// most one row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Restrict to records produced by one app run.
    pub launch_session: Option<String>,
    /// Restrict to a single identity.
    pub identity: Option<String>,
}

impl Query {
    /// Matches every row of the table.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches rows produced during `session`.
    pub fn for_session(session: impl Into<String>) -> Self {
        Self {
            launch_session: Some(session.into()),
            identity: None,
        }
    }

    /// Matches the single row keyed by `identity`.
    pub fn for_identity(identity: impl Into<String>) -> Self {
        Self {
            launch_session: None,
            identity: Some(identity.into()),
        }
    }
}

/// Contract a type implements to become persistable.
///
/// Implementors declare a table, a payload column list, and how instances
/// project into and out of those columns. The two implicit columns `identity`
/// (primary key) and `launch_session` (indexed) are owned by the store and
/// always precede the declared columns; rows decode in that canonical order.
///
/// This is the sole extension point for new record kinds.
pub trait Record: Sized + Send + 'static {
    /// Table backing this type.
    fn table_name() -> &'static str;

    /// Declared payload columns, excluding `identity` and `launch_session`.
    fn columns() -> &'static [ColumnSpec];

    /// Unique key within the table.
    fn identity(&self) -> &str;

    /// App run that produced this record.
    fn launch_session(&self) -> &str;

    /// Payload values aligned index-for-index with [`Record::columns`].
    fn values(&self) -> Vec<Value>;

    /// Decodes one row; columns arrive as `identity`, `launch_session`, then
    /// [`Record::columns`] in declaration order.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
