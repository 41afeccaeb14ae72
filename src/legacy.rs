//! Deprecated per-kind entry points kept for callers migrating to the
//! generic API.
//!
//! Each method is a pure adapter over the generic operations with the
//! concrete type substituted, executed blocking since the old signatures
//! were direct-return. Mutations flatten to `bool`; queries flatten errors
//! to an empty vec, so no-matches and failure are indistinguishable, as
//! they always were.

use tracing::warn;

use crate::record::{Query, Record};
use crate::records::crash::CrashRecord;
use crate::records::log::LogRecord;
use crate::records::network::NetworkRecord;
use crate::runtime::handle::{StoreError, StoreHandle};

impl StoreHandle {
    /// Saves a crash report, reporting success as a bool.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use save / save_blocking")]
    pub fn save_crash_record(&self, record: CrashRecord) -> bool {
        flatten("save_crash_record", self.save_blocking(record))
    }

    /// Returns every stored crash report.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use get / get_blocking with a Query")]
    pub fn all_crash_records(&self) -> Vec<CrashRecord> {
        query_or_empty(self, Query::all())
    }

    /// Removes the listed crash reports, reporting aggregate success.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use remove / remove_blocking")]
    pub fn remove_crash_records(&self, records: Vec<CrashRecord>) -> bool {
        flatten("remove_crash_records", self.remove_blocking(records))
    }

    /// Saves a network trace, reporting success as a bool.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use save / save_blocking")]
    pub fn save_network_record(&self, record: NetworkRecord) -> bool {
        flatten("save_network_record", self.save_blocking(record))
    }

    /// Returns every stored network trace.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use get / get_blocking with a Query")]
    pub fn all_network_records(&self) -> Vec<NetworkRecord> {
        query_or_empty(self, Query::all())
    }

    /// Returns the network traces from one launch session, or all of them
    /// when `session` is `None`.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use get / get_blocking with a Query")]
    pub fn network_records_by_session(&self, session: Option<&str>) -> Vec<NetworkRecord> {
        query_or_empty(self, session_query(session))
    }

    /// Removes the listed network traces, reporting aggregate success.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use remove / remove_blocking")]
    pub fn remove_network_records(&self, records: Vec<NetworkRecord>) -> bool {
        flatten("remove_network_records", self.remove_blocking(records))
    }

    /// Saves a log entry, reporting success as a bool.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use save / save_blocking")]
    pub fn save_log_record(&self, record: LogRecord) -> bool {
        flatten("save_log_record", self.save_blocking(record))
    }

    /// Returns every stored log entry.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use get / get_blocking with a Query")]
    pub fn all_log_records(&self) -> Vec<LogRecord> {
        query_or_empty(self, Query::all())
    }

    /// Returns the log entries from one launch session, or all of them when
    /// `session` is `None`.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use get / get_blocking with a Query")]
    pub fn log_records_by_session(&self, session: Option<&str>) -> Vec<LogRecord> {
        query_or_empty(self, session_query(session))
    }

    /// Removes the listed log entries, reporting aggregate success.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use remove / remove_blocking")]
    pub fn remove_log_records(&self, records: Vec<LogRecord>) -> bool {
        flatten("remove_log_records", self.remove_blocking(records))
    }

    /// Writes a screenshot, reporting success as a bool.
    /// Blocking; must not be called from async context.
    #[deprecated(note = "use save_screenshot / save_screenshot_blocking")]
    pub fn save_screenshot_now(&self, image: Vec<u8>, name: Option<String>) -> bool {
        flatten(
            "save_screenshot_now",
            self.save_screenshot_blocking(image, name).map(|_| ()),
        )
    }
}

fn session_query(session: Option<&str>) -> Query {
    match session {
        Some(session) => Query::for_session(session),
        None => Query::all(),
    }
}

fn query_or_empty<R: Record>(handle: &StoreHandle, query: Query) -> Vec<R> {
    match handle.get_blocking::<R>(query) {
        Ok(records) => records,
        Err(err) => {
            warn!(table = R::table_name(), error = ?err, "legacy query failed");
            Vec::new()
        }
    }
}

fn flatten(op: &'static str, res: Result<(), StoreError>) -> bool {
    if let Err(err) = &res {
        warn!(op, error = ?err, "legacy call failed");
    }
    res.is_ok()
}
