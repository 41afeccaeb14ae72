#![allow(deprecated)]

use std::collections::HashMap;

use tempfile::TempDir;

use diagstore::{
    record::Query,
    records::crash::CrashRecord,
    records::log::{LogLevel, LogRecord},
    records::network::NetworkRecord,
    runtime::handle::{StoreConfig, spawn_store},
};

fn log(identity: &str, session: &str) -> LogRecord {
    LogRecord {
        identity: identity.to_string(),
        launch_session: session.to_string(),
        level: LogLevel::Warning,
        message: "legacy message".to_string(),
        file: "old.rs".to_string(),
        line: 3,
        ts_ms: 7,
    }
}

fn crash(identity: &str, session: &str) -> CrashRecord {
    CrashRecord {
        identity: identity.to_string(),
        launch_session: session.to_string(),
        name: "SIGSEGV".to_string(),
        reason: "null deref".to_string(),
        stack: vec!["frame0".to_string(), "frame1".to_string()],
        ts_ms: 7,
    }
}

fn network(identity: &str, session: &str) -> NetworkRecord {
    NetworkRecord {
        identity: identity.to_string(),
        launch_session: session.to_string(),
        url: "https://example.com/api".to_string(),
        method: "POST".to_string(),
        status_code: Some(201),
        headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
        ts_ms: 7,
    }
}

#[test]
fn log_shims_round_trip() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    assert!(handle.save_log_record(log("a", "s1")));
    assert!(handle.save_log_record(log("b", "s2")));

    assert_eq!(handle.all_log_records().len(), 2);
    let by_session = handle.log_records_by_session(Some("s1"));
    assert_eq!(by_session.len(), 1);
    assert_eq!(by_session[0].identity, "a");
    assert_eq!(handle.log_records_by_session(None).len(), 2);

    assert!(handle.remove_log_records(by_session));
    assert_eq!(handle.all_log_records().len(), 1);

    handle.shutdown_blocking().expect("shutdown");
}

#[test]
fn duplicate_save_reports_false() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    assert!(handle.save_log_record(log("dup", "s1")));
    assert!(!handle.save_log_record(log("dup", "s1")));
    assert_eq!(handle.all_log_records().len(), 1);

    handle.shutdown_blocking().expect("shutdown");
}

#[test]
fn crash_shims_round_trip() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    let report = crash("c1", "s1");
    assert!(handle.save_crash_record(report.clone()));

    let all = handle.all_crash_records();
    assert_eq!(all, vec![report]);

    assert!(handle.remove_crash_records(all));
    assert!(handle.all_crash_records().is_empty());

    handle.shutdown_blocking().expect("shutdown");
}

#[test]
fn network_shims_round_trip() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    assert!(handle.save_network_record(network("n1", "s1")));
    assert!(handle.save_network_record(network("n2", "s2")));

    assert_eq!(handle.all_network_records().len(), 2);
    let by_session = handle.network_records_by_session(Some("s2"));
    assert_eq!(by_session.len(), 1);
    assert_eq!(by_session[0].identity, "n2");

    assert!(handle.remove_network_records(by_session));
    assert_eq!(handle.all_network_records().len(), 1);

    handle.shutdown_blocking().expect("shutdown");
}

#[test]
fn legacy_and_generic_views_agree() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    handle.save_blocking(log("g1", "s1")).expect("generic save");
    assert!(handle.save_log_record(log("g2", "s1")));

    let generic: Vec<LogRecord> = handle.get_blocking(Query::all()).expect("generic get");
    let legacy = handle.all_log_records();
    assert_eq!(generic, legacy);

    handle.shutdown_blocking().expect("shutdown");
}

#[test]
fn screenshot_shim_writes_file() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    assert!(handle.save_screenshot_now(vec![1, 2, 3], Some("grab".to_string())));
    assert!(tmp.path().join("screenshots").join("grab.png").exists());

    // empty image is the legacy failure case
    assert!(!handle.save_screenshot_now(Vec::new(), None));

    handle.shutdown_blocking().expect("shutdown");
}
