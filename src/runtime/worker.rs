//! Writer thread owning the database connection and screenshot directory.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::migrate::MigrationHook;
use crate::record::{Query, Record};
use crate::schema::{self, SchemaRegistry};
use crate::screenshot::ScreenshotStore;

use super::handle::StoreError;

/// One queued unit of work.
pub(super) enum Job {
    Run(Box<dyn FnOnce(&mut Worker) + Send>),
    Shutdown { resp: oneshot::Sender<()> },
}

/// State exclusively owned by the writer thread.
pub(super) struct Worker {
    conn: Connection,
    registry: SchemaRegistry,
    screenshots: ScreenshotStore,
    hook: Option<Box<dyn MigrationHook>>,
}

impl Worker {
    /// Opens the database and screenshot directory.
    ///
    /// Applies WAL mode and `synchronous=NORMAL`, and creates the internal
    /// bookkeeping tables.
    pub(super) fn open(
        db_path: &Path,
        screenshot_dir: &Path,
        hook: Option<Box<dyn MigrationHook>>,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let screenshots = ScreenshotStore::open(screenshot_dir)?;
        Ok(Self {
            conn,
            registry: SchemaRegistry::new(),
            screenshots,
            hook,
        })
    }

    /// Drains jobs strictly in submission order until shutdown or all
    /// handles are gone.
    pub(super) fn run(mut self, mut rx: mpsc::Receiver<Job>) {
        while let Some(job) = rx.blocking_recv() {
            match job {
                Job::Run(work) => work(&mut self),
                Job::Shutdown { resp } => {
                    let _ = resp.send(());
                    break;
                }
            }
        }
        debug!("writer thread stopped");
    }

    pub(super) fn ensure_table<R: Record>(&mut self) -> Result<(), StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        Ok(())
    }

    pub(super) fn save<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        let sql = schema::insert_sql(R::table_name(), R::columns(), false);
        match self.conn.execute(&sql, params_from_iter(record_params(record))) {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => Err(StoreError::DuplicateIdentity {
                table: R::table_name(),
                identity: record.identity().to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    pub(super) fn update<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        let sql = schema::insert_sql(R::table_name(), R::columns(), true);
        self.conn
            .execute(&sql, params_from_iter(record_params(record)))?;
        Ok(())
    }

    pub(super) fn fetch<R: Record>(&mut self, query: &Query) -> Result<Vec<R>, StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        let (sql, values) = schema::select_sql(R::table_name(), R::columns(), query);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| R::from_row(row))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Deletes each record independently; a missing row deletes zero rows
    /// and still counts as success.
    pub(super) fn remove<R: Record>(&mut self, records: &[R]) -> Result<(), StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        let sql = schema::delete_sql(R::table_name());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut failed = 0usize;
        for record in records {
            if let Err(err) = stmt.execute(params![record.identity()]) {
                warn!(
                    table = R::table_name(),
                    identity = record.identity(),
                    error = ?err,
                    "remove failed for one record"
                );
                failed += 1;
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(StoreError::RemoveIncomplete {
                failed,
                attempted: records.len(),
            })
        }
    }

    pub(super) fn clear_table<R: Record>(&mut self) -> Result<(), StoreError> {
        self.registry.ensure::<R>(&self.conn)?;
        self.conn.execute(&schema::clear_sql(R::table_name()), [])?;
        Ok(())
    }

    /// Clears every record table found in the file, including tables created
    /// by earlier runs; internal bookkeeping tables are left alone.
    pub(super) fn clear_database(&mut self) -> Result<(), StoreError> {
        let tables = self.record_tables()?;
        for table in &tables {
            self.conn.execute(&schema::clear_sql(table), [])?;
        }
        info!(tables = tables.len(), "database cleared");
        Ok(())
    }

    pub(super) fn migrate(&mut self, version: &str) -> Result<(), StoreError> {
        let applied: Option<String> = self
            .conn
            .query_row(
                "SELECT version FROM diag_migrations WHERE version = ?1",
                params![version],
                |row| row.get(0),
            )
            .optional()?;
        if applied.is_some() {
            debug!(version, "migration already applied");
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        if let Some(hook) = self.hook.as_mut() {
            hook.apply(&tx, version)?;
        }
        tx.execute(
            "INSERT INTO diag_migrations (version, applied_ts_ms) VALUES (?1, ?2)",
            params![version, now_ms() as i64],
        )?;
        tx.commit()?;
        info!(version, "migration applied");
        Ok(())
    }

    pub(super) fn applied_migrations(&mut self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM diag_migrations ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub(super) fn save_screenshot(
        &mut self,
        image: &[u8],
        name: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        Ok(self.screenshots.save(image, name)?)
    }

    fn record_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            let name = row?;
            if !name.starts_with(schema::META_TABLE_PREFIX) && !name.starts_with("sqlite_") {
                out.push(name);
            }
        }
        Ok(out)
    }
}

fn record_params<R: Record>(record: &R) -> Vec<Value> {
    let mut params = Vec::with_capacity(R::columns().len() + 2);
    params.push(Value::Text(record.identity().to_string()));
    params.push(Value::Text(record.launch_session().to_string()));
    params.extend(record.values());
    params
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
