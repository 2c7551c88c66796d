//! Core events emitted by the engine

use chrono::{DateTime, Local};
use examclock_store::SessionReport;
use examclock_util::ExamId;

/// Events emitted by the transition function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Live session began
    SessionCommenced {
        started_at: DateTime<Local>,
        exam_count: usize,
    },

    /// Live session ended; carries the log as it stood at the end
    SessionEnded { report: SessionReport },

    /// Writing time ran out for an exam
    ExamFinished { exam_id: ExamId, name: String },

    AutoStartArmed { target: DateTime<Local> },

    AutoStartCancelled,
}
