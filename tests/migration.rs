use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::TempDir;

use diagstore::{
    migrate::{MigrateError, MigrateResult, MigrationHook},
    runtime::handle::{StoreConfig, StoreError, spawn_store},
};

struct RecordingHook {
    seen: Arc<Mutex<Vec<String>>>,
}

impl MigrationHook for RecordingHook {
    fn apply(&mut self, conn: &Connection, version: &str) -> MigrateResult<()> {
        conn.execute_batch("CREATE TABLE IF NOT EXISTS hook_marks (version TEXT)")?;
        conn.execute(
            "INSERT INTO hook_marks (version) VALUES (?1)",
            rusqlite::params![version],
        )?;
        self.seen.lock().expect("lock").push(version.to_string());
        Ok(())
    }
}

struct FailingHook;

impl MigrationHook for FailingHook {
    fn apply(&mut self, conn: &Connection, _version: &str) -> MigrateResult<()> {
        conn.execute_batch("CREATE TABLE leftovers (x TEXT)")?;
        Err(MigrateError::Hook("late failure".to_string()))
    }
}

#[tokio::test]
async fn migrate_runs_hook_once_per_version() {
    let tmp = TempDir::new().expect("tmp");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook = RecordingHook {
        seen: Arc::clone(&seen),
    };
    let handle = spawn_store(StoreConfig::new(tmp.path()), Some(Box::new(hook))).expect("spawn");

    handle.migrate("2024.1").await.expect("first migrate");
    handle.migrate("2024.1").await.expect("repeat is a no-op");
    handle.migrate("2024.2").await.expect("second version");

    assert_eq!(
        *seen.lock().expect("lock"),
        vec!["2024.1".to_string(), "2024.2".to_string()]
    );
    assert_eq!(
        handle.applied_migrations().await.expect("applied"),
        vec!["2024.1".to_string(), "2024.2".to_string()]
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_hook_leaves_version_unrecorded_and_rolls_back() {
    let tmp = TempDir::new().expect("tmp");
    let handle =
        spawn_store(StoreConfig::new(tmp.path()), Some(Box::new(FailingHook))).expect("spawn");

    let err = handle.migrate("bad").await.expect_err("hook fails");
    assert!(matches!(err, StoreError::Migrate(MigrateError::Hook(_))));
    assert!(handle.applied_migrations().await.expect("applied").is_empty());

    handle.shutdown().await.expect("shutdown");

    // the hook's table creation must have rolled back with the version
    let conn = Connection::open(tmp.path().join("records.db")).expect("open raw");
    let leftovers: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'leftovers'",
            [],
            |row| row.get(0),
        )
        .expect("query sqlite_master");
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn applied_versions_survive_respawn() {
    let tmp = TempDir::new().expect("tmp");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook = RecordingHook {
        seen: Arc::clone(&seen),
    };
    let handle = spawn_store(StoreConfig::new(tmp.path()), Some(Box::new(hook))).expect("spawn");
    handle.migrate("v1").await.expect("migrate");
    handle.shutdown().await.expect("shutdown");

    let second_seen = Arc::new(Mutex::new(Vec::new()));
    let hook = RecordingHook {
        seen: Arc::clone(&second_seen),
    };
    let handle = spawn_store(StoreConfig::new(tmp.path()), Some(Box::new(hook))).expect("respawn");
    handle.migrate("v1").await.expect("repeat across runs");

    assert!(second_seen.lock().expect("lock").is_empty());
    assert_eq!(
        handle.applied_migrations().await.expect("applied"),
        vec!["v1".to_string()]
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn migrate_without_hook_still_records_versions() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    handle.migrate("v1").await.expect("migrate");
    handle.migrate("v2").await.expect("migrate");

    assert_eq!(
        handle.applied_migrations().await.expect("applied"),
        vec!["v1".to_string(), "v2".to_string()]
    );

    handle.shutdown().await.expect("shutdown");
}
