//! Exam and session model

use chrono::{DateTime, Local};
use examclock_util::{ExamId, elapsed_since};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Settings, UiPrefs};

const MINUTE: Duration = Duration::from_secs(60);

fn minutes(mins: u32) -> Duration {
    MINUTE * mins
}

/// Lifecycle status of an exam.
///
/// Only `Running -> Finished` and `Running -> Abandoned` are allowed; both
/// targets are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    #[default]
    Running,
    Finished,
    Abandoned,
}

impl ExamStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExamStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Running => "running",
            ExamStatus::Finished => "finished",
            ExamStatus::Abandoned => "abandoned",
        }
    }
}

/// What is currently stopping an exam's clock, if anything.
///
/// At most one exam-level interruption is active at a time. The session-wide
/// pause is tracked separately on [`SessionState`] and may overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interruption {
    #[default]
    None,
    Paused { since: DateTime<Local> },
    OnRest { since: DateTime<Local> },
    OnReaderWriter { since: DateTime<Local> },
}

impl Interruption {
    pub fn is_none(&self) -> bool {
        matches!(self, Interruption::None)
    }
}

/// Special provisions granted to a single candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialProvisions {
    pub student_name: String,
    pub show_student_name: bool,
    /// Minutes added to the writing period
    pub extra_time: u32,
    /// Rest break budget in minutes
    pub rest_breaks: u32,
    /// Completed rest time (excludes a break in progress)
    #[serde(with = "examclock_util::millis")]
    pub rest_taken: Duration,
    /// Reader/writer budget in minutes
    pub reader_writer_time: u32,
    /// Completed reader/writer time (excludes a session in progress)
    #[serde(with = "examclock_util::millis")]
    pub reader_writer_taken: Duration,
}

impl SpecialProvisions {
    pub fn rest_budget(&self) -> Duration {
        minutes(self.rest_breaks)
    }

    pub fn reader_writer_budget(&self) -> Duration {
        minutes(self.reader_writer_time)
    }

    /// Extra time, rest and reader/writer minutes combined
    pub fn allowance_mins(&self) -> u32 {
        self.extra_time
            .saturating_add(self.rest_breaks)
            .saturating_add(self.reader_writer_time)
    }
}

/// One examination instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub name: String,
    pub read_mins: u32,
    pub write_hrs: u32,
    pub write_mins: u32,
    #[serde(default)]
    pub optional_info: String,
    #[serde(default)]
    pub has_access_code: bool,
    #[serde(default)]
    pub access_code: String,
    #[serde(default)]
    pub sp: SpecialProvisions,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default)]
    pub interruption: Interruption,
    /// Completed exam-level pause time (excludes a pause in progress)
    #[serde(default, with = "examclock_util::millis")]
    pub pause_duration_total: Duration,
    #[serde(default)]
    pub start_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub read_end_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub write_end_time: Option<DateTime<Local>>,
}

impl Exam {
    pub fn new(name: impl Into<String>, read_mins: u32, write_hrs: u32, write_mins: u32) -> Self {
        Self {
            id: ExamId::generate(),
            name: name.into(),
            read_mins,
            write_hrs,
            write_mins,
            optional_info: String::new(),
            has_access_code: false,
            access_code: String::new(),
            sp: SpecialProvisions::default(),
            status: ExamStatus::Running,
            interruption: Interruption::None,
            pause_duration_total: Duration::ZERO,
            start_time: None,
            read_end_time: None,
            write_end_time: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ExamId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.interruption, Interruption::Paused { .. })
    }

    pub fn pause_start_time(&self) -> Option<DateTime<Local>> {
        match self.interruption {
            Interruption::Paused { since } => Some(since),
            _ => None,
        }
    }

    pub fn on_rest(&self) -> bool {
        matches!(self.interruption, Interruption::OnRest { .. })
    }

    pub fn rest_start_time(&self) -> Option<DateTime<Local>> {
        match self.interruption {
            Interruption::OnRest { since } => Some(since),
            _ => None,
        }
    }

    pub fn on_reader_writer(&self) -> bool {
        matches!(self.interruption, Interruption::OnReaderWriter { .. })
    }

    pub fn reader_writer_start_time(&self) -> Option<DateTime<Local>> {
        match self.interruption {
            Interruption::OnReaderWriter { since } => Some(since),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        !self.interruption.is_none()
    }

    pub fn read_duration(&self) -> Duration {
        minutes(self.read_mins)
    }

    /// Writing period including any extra time
    pub fn write_duration(&self) -> Duration {
        minutes(
            self.write_hrs
                .saturating_mul(60)
                .saturating_add(self.write_mins)
                .saturating_add(self.sp.extra_time),
        )
    }

    /// Reading plus writing, including extra time
    pub fn total_duration(&self) -> Duration {
        self.read_duration() + self.write_duration()
    }

    /// Reading plus writing as scheduled, without provisions
    pub fn scheduled_mins(&self) -> u32 {
        self.read_mins
            .saturating_add(self.write_hrs.saturating_mul(60))
            .saturating_add(self.write_mins)
    }

    /// Exam-level pause time including a pause in progress at `now`
    pub fn pause_offset(&self, now: DateTime<Local>) -> Duration {
        self.pause_duration_total
            + self
                .pause_start_time()
                .map_or(Duration::ZERO, |since| elapsed_since(since, now))
    }

    /// Rest time used including a break in progress at `now`
    pub fn rest_used(&self, now: DateTime<Local>) -> Duration {
        self.sp.rest_taken
            + self
                .rest_start_time()
                .map_or(Duration::ZERO, |since| elapsed_since(since, now))
    }

    /// Reader/writer time used including a session in progress at `now`
    pub fn reader_writer_used(&self, now: DateTime<Local>) -> Duration {
        self.sp.reader_writer_taken
            + self
                .reader_writer_start_time()
                .map_or(Duration::ZERO, |since| elapsed_since(since, now))
    }

    /// Remaining rest budget in milliseconds; negative once overrun
    pub fn rest_remaining_ms(&self, now: DateTime<Local>) -> i64 {
        signed_millis(self.sp.rest_budget()) - signed_millis(self.rest_used(now))
    }

    /// Remaining reader/writer budget in milliseconds; negative once overrun
    pub fn reader_writer_remaining_ms(&self, now: DateTime<Local>) -> i64 {
        signed_millis(self.sp.reader_writer_budget()) - signed_millis(self.reader_writer_used(now))
    }
}

fn signed_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Examinations are timed; standardised tests are display-only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Examinations,
    Standardised,
}

/// Which screen the display is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Setup,
    Exam,
}

/// One line of the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

/// The whole process-wide session state, persisted after every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub current_page: Page,
    #[serde(default)]
    pub session_mode: SessionMode,
    #[serde(default)]
    pub is_live: bool,
    /// Start of the session-wide pause in progress
    #[serde(default)]
    pub pause_start_time: Option<DateTime<Local>>,
    /// Completed session-wide pause time
    #[serde(default, with = "examclock_util::millis")]
    pub pause_duration_total: Duration,
    #[serde(default)]
    pub auto_start_target_time: Option<DateTime<Local>>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub session_log: Vec<LogEntry>,
    #[serde(default)]
    pub ui: UiPrefs,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl SessionState {
    /// Fresh setup-page state with the given factory settings
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            current_page: Page::Setup,
            session_mode: SessionMode::Examinations,
            is_live: false,
            pause_start_time: None,
            pause_duration_total: Duration::ZERO,
            auto_start_target_time: None,
            settings,
            exams: Vec::new(),
            session_log: Vec::new(),
            ui: UiPrefs::default(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start_time.is_some()
    }

    /// Session-wide pause time including a pause in progress at `now`
    pub fn global_pause_offset(&self, now: DateTime<Local>) -> Duration {
        self.pause_duration_total
            + self
                .pause_start_time
                .map_or(Duration::ZERO, |since| elapsed_since(since, now))
    }

    /// Common start instant of all exams, taken from the first exam
    pub fn session_start(&self) -> Option<DateTime<Local>> {
        self.exams.first().and_then(|exam| exam.start_time)
    }

    pub fn exam(&self, id: &ExamId) -> Option<&Exam> {
        self.exams.iter().find(|exam| &exam.id == id)
    }

    pub fn exam_mut(&mut self, id: &ExamId) -> Option<&mut Exam> {
        self.exams.iter_mut().find(|exam| &exam.id == id)
    }

    pub fn is_examinations(&self) -> bool {
        self.session_mode == SessionMode::Examinations
    }
}

/// Portable session file: everything needed to set the session up again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub session_mode: SessionMode,
    pub settings: Settings,
    pub exams: Vec<Exam>,
}

impl SessionFile {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            session_mode: state.session_mode,
            settings: state.settings.clone(),
            exams: state.exams.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 12, h, m, 0).unwrap()
    }

    #[test]
    fn write_duration_includes_extra_time() {
        let mut exam = Exam::new("12 Chemistry", 5, 3, 0);
        exam.sp.extra_time = 15;

        assert_eq!(exam.read_duration(), Duration::from_secs(5 * 60));
        assert_eq!(exam.write_duration(), Duration::from_secs(195 * 60));
        assert_eq!(exam.scheduled_mins(), 185);
    }

    #[test]
    fn oversized_durations_saturate() {
        let mut exam = Exam::new("Corrupt", u32::MAX, u32::MAX, u32::MAX);
        exam.sp.extra_time = u32::MAX;
        exam.sp.rest_breaks = u32::MAX;

        assert_eq!(exam.write_duration(), Duration::from_secs(u32::MAX as u64 * 60));
        assert_eq!(exam.scheduled_mins(), u32::MAX);
        assert_eq!(exam.sp.allowance_mins(), u32::MAX);
        assert!(exam.total_duration() > exam.write_duration());
    }

    #[test]
    fn interruption_accessors_follow_variant() {
        let mut exam = Exam::new("12 Physics", 5, 3, 0);
        assert!(!exam.is_interrupted());

        exam.interruption = Interruption::OnRest { since: at(9, 30) };
        assert!(exam.on_rest());
        assert!(!exam.is_paused());
        assert_eq!(exam.rest_start_time(), Some(at(9, 30)));
        assert_eq!(exam.pause_start_time(), None);
    }

    #[test]
    fn in_progress_time_counts_toward_usage() {
        let mut exam = Exam::new("12 Biology", 5, 3, 0);
        exam.sp.rest_breaks = 10;
        exam.sp.rest_taken = Duration::from_secs(120);
        exam.interruption = Interruption::OnRest { since: at(9, 30) };

        assert_eq!(exam.rest_used(at(9, 33)), Duration::from_secs(300));
        assert_eq!(exam.rest_remaining_ms(at(9, 33)), 300_000);
        assert_eq!(exam.rest_remaining_ms(at(9, 40)), -120_000);
    }

    #[test]
    fn global_pause_offset_adds_in_progress_pause() {
        let mut state = SessionState::default();
        state.pause_duration_total = Duration::from_secs(60);
        state.pause_start_time = Some(at(10, 0));

        assert!(state.is_paused());
        assert_eq!(state.global_pause_offset(at(10, 2)), Duration::from_secs(180));
    }

    #[test]
    fn interruption_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Interruption::None).unwrap();
        assert_eq!(json, r#"{"kind":"none"}"#);

        let paused = Interruption::Paused { since: at(9, 0) };
        let parsed: Interruption =
            serde_json::from_str(&serde_json::to_string(&paused).unwrap()).unwrap();
        assert_eq!(parsed, paused);
    }

    #[test]
    fn state_survives_json_round_trip() {
        let mut state = SessionState::default();
        let mut exam = Exam::new("12 Legal Studies", 5, 3, 0).with_id("legal");
        exam.start_time = Some(at(9, 0));
        exam.pause_duration_total = Duration::from_millis(1_500);
        state.exams.push(exam);
        state.is_live = true;

        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
