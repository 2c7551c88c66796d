//! Store trait definitions

use chrono::{DateTime, Local};
use examclock_api::SessionState;

use crate::{SessionReport, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // State snapshot

    /// Load the last saved session state
    fn load_snapshot(&self) -> StoreResult<Option<SessionState>>;

    /// Save the session state, replacing the previous snapshot
    fn save_snapshot(&self, state: &SessionState) -> StoreResult<()>;

    // Session reports

    /// Archive the report of a finished session, returning its row id
    fn archive_report(&self, report: &SessionReport) -> StoreResult<i64>;

    /// Most recent archived reports, newest first
    fn recent_reports(&self, limit: usize) -> StoreResult<Vec<ArchivedReport>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// A session report as stored in the archive
#[derive(Debug, Clone)]
pub struct ArchivedReport {
    pub id: i64,
    pub title: String,
    pub ended_at: DateTime<Local>,
    pub report: SessionReport,
}
