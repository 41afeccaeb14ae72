//! Storage handle, configuration, and the spawn entry point.

use std::path::PathBuf;
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::migrate::{MigrateError, MigrationHook};
use crate::record::{Query, Record};
use crate::schema::SchemaError;
use crate::screenshot::ScreenshotError;

use super::worker::{Job, Worker};

/// Umbrella error returned by every [`StoreHandle`] operation.
#[derive(Debug)]
pub enum StoreError {
    /// Record mapping rejected or its table could not be created.
    Schema(SchemaError),
    /// Migration hook or version bookkeeping failed.
    Migrate(MigrateError),
    /// Screenshot write failed.
    Screenshot(ScreenshotError),
    /// Database failure outside the more specific cases.
    Sqlite(rusqlite::Error),
    /// Filesystem failure while setting up the store directories.
    Io(std::io::Error),
    /// `save` hit an existing row with the same identity; nothing was written.
    DuplicateIdentity {
        /// Table the conflict happened in.
        table: &'static str,
        /// Identity already present in that table.
        identity: String,
    },
    /// Batch remove finished with some deletions failed; the rest went
    /// through.
    RemoveIncomplete {
        /// Deletions that failed.
        failed: usize,
        /// Records in the batch.
        attempted: usize,
    },
    /// The writer thread is gone.
    ChannelClosed,
}

impl From<SchemaError> for StoreError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<MigrateError> for StoreError {
    fn from(value: MigrateError) -> Self {
        Self::Migrate(value)
    }
}

impl From<ScreenshotError> for StoreError {
    fn from(value: ScreenshotError) -> Self {
        Self::Screenshot(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Construction-time settings for [`spawn_store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Sandbox root; the database and screenshots live beneath it.
    pub root_dir: PathBuf,
    /// Database file name under `root_dir`.
    pub database_file: String,
    /// Screenshot subdirectory name under `root_dir`.
    pub screenshot_dir: String,
    /// Depth of the bounded job queue; must be nonzero.
    pub queue_capacity: usize,
}

impl StoreConfig {
    /// Settings rooted at `root_dir` with default file names and queue depth.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            database_file: "records.db".to_string(),
            screenshot_dir: "screenshots".to_string(),
            queue_capacity: 256,
        }
    }

    fn database_path(&self) -> PathBuf {
        self.root_dir.join(&self.database_file)
    }

    fn screenshot_path(&self) -> PathBuf {
        self.root_dir.join(&self.screenshot_dir)
    }
}

/// Cloneable access point to the storage worker.
///
/// Every operation exists in an async form and a `_blocking` form. Both feed
/// the same bounded queue, so jobs run strictly in submission order across
/// calling conventions. The blocking forms wait inline for the worker and
/// must not be called from async context.
pub struct StoreHandle {
    job_tx: mpsc::Sender<Job>,
}

impl Clone for StoreHandle {
    fn clone(&self) -> Self {
        Self {
            job_tx: self.job_tx.clone(),
        }
    }
}

/// Opens the database and screenshot directory under `config.root_dir` and
/// starts the writer thread that owns them.
///
/// `hook` supplies the migration steps run by [`StoreHandle::migrate`]; pass
/// `None` when only version bookkeeping is wanted.
pub fn spawn_store(
    config: StoreConfig,
    hook: Option<Box<dyn MigrationHook>>,
) -> Result<StoreHandle, StoreError> {
    std::fs::create_dir_all(&config.root_dir)?;
    let worker = Worker::open(&config.database_path(), &config.screenshot_path(), hook)?;
    let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
    thread::Builder::new()
        .name("diagstore-writer".to_string())
        .spawn(move || worker.run(job_rx))?;
    info!(root = %config.root_dir.display(), "store started");
    Ok(StoreHandle { job_tx })
}

impl StoreHandle {
    async fn run<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Worker) -> Result<T, StoreError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = Job::Run(Box::new(move |worker: &mut Worker| {
            let _ = tx.send(work(worker));
        }));
        self.job_tx
            .send(job)
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        rx.await.map_err(|_| StoreError::ChannelClosed)?
    }

    fn run_blocking<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Worker) -> Result<T, StoreError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = Job::Run(Box::new(move |worker: &mut Worker| {
            let _ = tx.send(work(worker));
        }));
        self.job_tx
            .blocking_send(job)
            .map_err(|_| StoreError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| StoreError::ChannelClosed)?
    }

    /// Ensures `R`'s table exists. Idempotent; every other operation also
    /// ensures the table on its own, so calling this is optional.
    pub async fn register<R: Record>(&self) -> Result<(), StoreError> {
        self.run(|worker| worker.ensure_table::<R>()).await
    }

    /// Blocking form of [`StoreHandle::register`]; must not be called from
    /// async context.
    pub fn register_blocking<R: Record>(&self) -> Result<(), StoreError> {
        self.run_blocking(|worker| worker.ensure_table::<R>())
    }

    /// Inserts `record`. An existing row with the same identity fails with
    /// [`StoreError::DuplicateIdentity`] and the table is left untouched.
    pub async fn save<R: Record>(&self, record: R) -> Result<(), StoreError> {
        self.run(move |worker| worker.save(&record)).await
    }

    /// Blocking form of [`StoreHandle::save`]; must not be called from async
    /// context.
    pub fn save_blocking<R: Record>(&self, record: R) -> Result<(), StoreError> {
        self.run_blocking(move |worker| worker.save(&record))
    }

    /// Inserts or replaces `record` by identity; succeeds with or without a
    /// prior row.
    pub async fn update<R: Record>(&self, record: R) -> Result<(), StoreError> {
        self.run(move |worker| worker.update(&record)).await
    }

    /// Blocking form of [`StoreHandle::update`]; must not be called from
    /// async context.
    pub fn update_blocking<R: Record>(&self, record: R) -> Result<(), StoreError> {
        self.run_blocking(move |worker| worker.update(&record))
    }

    /// Returns the records matching `query` in insertion order. No matches
    /// is an empty vec, never an error.
    pub async fn get<R: Record>(&self, query: Query) -> Result<Vec<R>, StoreError> {
        self.run(move |worker| worker.fetch::<R>(&query)).await
    }

    /// Blocking form of [`StoreHandle::get`]; must not be called from async
    /// context.
    pub fn get_blocking<R: Record>(&self, query: Query) -> Result<Vec<R>, StoreError> {
        self.run_blocking(move |worker| worker.fetch::<R>(&query))
    }

    /// Deletes each record by identity, independently: one failure neither
    /// aborts nor rolls back the others, and missing rows count as success.
    /// Returns [`StoreError::RemoveIncomplete`] when any deletion failed.
    pub async fn remove<R: Record>(&self, records: Vec<R>) -> Result<(), StoreError> {
        self.run(move |worker| worker.remove(&records)).await
    }

    /// Blocking form of [`StoreHandle::remove`]; must not be called from
    /// async context.
    pub fn remove_blocking<R: Record>(&self, records: Vec<R>) -> Result<(), StoreError> {
        self.run_blocking(move |worker| worker.remove(&records))
    }

    /// Deletes every row of `R`'s table; other tables are untouched.
    /// Irreversible.
    pub async fn clear_table<R: Record>(&self) -> Result<(), StoreError> {
        self.run(|worker| worker.clear_table::<R>()).await
    }

    /// Blocking form of [`StoreHandle::clear_table`]; must not be called
    /// from async context.
    pub fn clear_table_blocking<R: Record>(&self) -> Result<(), StoreError> {
        self.run_blocking(|worker| worker.clear_table::<R>())
    }

    /// Deletes every row of every record table in the file, including tables
    /// created by earlier runs. Irreversible.
    pub async fn clear_database(&self) -> Result<(), StoreError> {
        self.run(|worker| worker.clear_database()).await
    }

    /// Blocking form of [`StoreHandle::clear_database`]; must not be called
    /// from async context.
    pub fn clear_database_blocking(&self) -> Result<(), StoreError> {
        self.run_blocking(|worker| worker.clear_database())
    }

    /// Runs the migration hook for `version` and records it as applied, both
    /// in one transaction. A version already on record is a no-op success.
    pub async fn migrate(&self, version: impl Into<String>) -> Result<(), StoreError> {
        let version = version.into();
        self.run(move |worker| worker.migrate(&version)).await
    }

    /// Blocking form of [`StoreHandle::migrate`]; must not be called from
    /// async context.
    pub fn migrate_blocking(&self, version: impl Into<String>) -> Result<(), StoreError> {
        let version = version.into();
        self.run_blocking(move |worker| worker.migrate(&version))
    }

    /// Versions recorded as applied, in application order.
    pub async fn applied_migrations(&self) -> Result<Vec<String>, StoreError> {
        self.run(|worker| worker.applied_migrations()).await
    }

    /// Blocking form of [`StoreHandle::applied_migrations`]; must not be
    /// called from async context.
    pub fn applied_migrations_blocking(&self) -> Result<Vec<String>, StoreError> {
        self.run_blocking(|worker| worker.applied_migrations())
    }

    /// Writes `image` into the screenshot directory under `name` (sanitized)
    /// or a generated timestamp name, and returns the path written.
    pub async fn save_screenshot(
        &self,
        image: Vec<u8>,
        name: Option<String>,
    ) -> Result<PathBuf, StoreError> {
        self.run(move |worker| worker.save_screenshot(&image, name.as_deref()))
            .await
    }

    /// Blocking form of [`StoreHandle::save_screenshot`]; must not be called
    /// from async context.
    pub fn save_screenshot_blocking(
        &self,
        image: Vec<u8>,
        name: Option<String>,
    ) -> Result<PathBuf, StoreError> {
        self.run_blocking(move |worker| worker.save_screenshot(&image, name.as_deref()))
    }

    /// Stops the worker after all previously queued jobs finish and closes
    /// the connection. Later calls on any clone of the handle fail with
    /// [`StoreError::ChannelClosed`].
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.job_tx
            .send(Job::Shutdown { resp: tx })
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Blocking form of [`StoreHandle::shutdown`]; must not be called from
    /// async context.
    pub fn shutdown_blocking(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.job_tx
            .blocking_send(Job::Shutdown { resp: tx })
            .map_err(|_| StoreError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| StoreError::ChannelClosed)
    }
}
