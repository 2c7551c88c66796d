//! Event types for examclockd -> client streaming

use chrono::{DateTime, Local};
use examclock_util::ExamId;
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, SessionView};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: examclock_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Fresh projection (sent on subscribe, after every change and on each tick while live)
    StateChanged(SessionView),

    /// The live session began
    SessionCommenced {
        started_at: DateTime<Local>,
        exam_count: usize,
    },

    /// The live session ended; the log report was written to `report_path` if any
    SessionEnded {
        title: String,
        ended_at: DateTime<Local>,
        report_path: Option<String>,
    },

    /// An exam's writing time ran out
    ExamFinished { exam_id: ExamId, name: String },

    /// Auto-start was armed for `target`
    AutoStartArmed { target: DateTime<Local> },

    /// Service is shutting down
    Shutdown,
}
