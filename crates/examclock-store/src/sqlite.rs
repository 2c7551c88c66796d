//! SQLite-based store implementation

use chrono::{DateTime, Local};
use examclock_api::SessionState;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{ArchivedReport, SessionReport, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Session state snapshot (single row)
            CREATE TABLE IF NOT EXISTS snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL,
                state_json TEXT NOT NULL
            );

            -- Archived session reports (append-only)
            CREATE TABLE IF NOT EXISTS session_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                report_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_ended_at ON session_reports(ended_at);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn load_snapshot(&self) -> StoreResult<Option<SessionState>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row("SELECT state_json FROM snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(s) => {
                let state: SessionState = serde_json::from_str(&s)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, state: &SessionState) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(state)?;

        conn.execute(
            r#"
            INSERT INTO snapshot (id, saved_at, state_json)
            VALUES (1, ?, ?)
            ON CONFLICT(id)
            DO UPDATE SET saved_at = excluded.saved_at, state_json = excluded.state_json
            "#,
            params![examclock_util::now().to_rfc3339(), json],
        )?;

        debug!(exam_count = state.exams.len(), is_live = state.is_live, "Snapshot saved");
        Ok(())
    }

    fn archive_report(&self, report: &SessionReport) -> StoreResult<i64> {
        let conn = self.conn()?;
        let json = serde_json::to_string(report)?;

        conn.execute(
            "INSERT INTO session_reports (title, ended_at, report_json) VALUES (?, ?, ?)",
            params![report.title, report.ended_at.to_rfc3339(), json],
        )?;

        let id = conn.last_insert_rowid();
        debug!(report_id = id, title = %report.title, "Session report archived");
        Ok(id)
    }

    fn recent_reports(&self, limit: usize) -> StoreResult<Vec<ArchivedReport>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, title, ended_at, report_json FROM session_reports ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let title: String = row.get(1)?;
            let ended_at: String = row.get(2)?;
            let report_json: String = row.get(3)?;
            Ok((id, title, ended_at, report_json))
        })?;

        let mut reports = Vec::new();
        for row in rows {
            let (id, title, ended_at, report_json) = row?;
            let report: SessionReport = serde_json::from_str(&report_json)?;
            let ended_at = DateTime::parse_from_rfc3339(&ended_at)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or(report.ended_at);

            reports.push(ArchivedReport {
                id,
                title,
                ended_at,
                report,
            });
        }

        Ok(reports)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
