//! Display projection types

use chrono::{DateTime, Local};
use examclock_util::ExamId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ExamStatus, Page, SessionMode};

/// What an exam card shows as its headline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Preview,
    Reading,
    Writing,
    Paused,
    OnRest,
    ReaderWriter,
    Finished,
    Abandoned,
}

impl DisplayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Preview => "Preview",
            DisplayStatus::Reading => "Reading Time",
            DisplayStatus::Writing => "Writing Time",
            DisplayStatus::Paused => "Paused",
            DisplayStatus::OnRest => "On Rest Break",
            DisplayStatus::ReaderWriter => "Reader/Writer Active",
            DisplayStatus::Finished => "Finished",
            DisplayStatus::Abandoned => "Abandoned",
        }
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self, DisplayStatus::Reading | DisplayStatus::Writing)
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Projection of a single exam at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamView {
    pub exam_id: ExamId,
    pub name: String,
    pub status: DisplayStatus,
    pub exam_status: ExamStatus,
    /// Milliseconds left in the current phase (frozen while interrupted)
    pub remaining_ms: i64,
    pub start_time: Option<DateTime<Local>>,
    pub read_end_time: Option<DateTime<Local>>,
    pub write_end_time: Option<DateTime<Local>>,
    /// Remaining rest budget; negative once overrun
    pub rest_remaining_ms: i64,
    /// Remaining reader/writer budget; negative once overrun
    pub reader_writer_remaining_ms: i64,
    pub has_rest_budget: bool,
    pub has_reader_writer_budget: bool,
    /// Reading plus writing, with extra time
    pub total_duration_mins: u32,
    pub optional_info: String,
    pub student_name: Option<String>,
    pub access_code: Option<String>,
}

/// Projection of the whole session at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub generated_at: DateTime<Local>,
    pub title: String,
    pub session_mode: SessionMode,
    pub current_page: Page,
    pub is_live: bool,
    pub is_paused: bool,
    pub timers_disabled: bool,
    pub auto_start_target_time: Option<DateTime<Local>>,
    /// Milliseconds until auto-start, while armed and not live
    pub auto_start_remaining_ms: Option<i64>,
    pub exams: Vec<ExamView>,
}

impl SessionView {
    pub fn exam(&self, id: &ExamId) -> Option<&ExamView> {
        self.exams.iter().find(|exam| &exam.exam_id == id)
    }
}
