//! Command types and the request/response protocol

use chrono::{DateTime, Local};
use examclock_util::{ClientId, ExamId};
use serde::{Deserialize, Serialize};

use crate::{
    API_VERSION, Exam, Page, PresetCatalogue, SessionFile, SessionMode, SessionState,
    SessionView, SettingsPatch, Theme,
};

/// Every state change the session engine understands.
///
/// Commands whose preconditions do not hold are ignored by the engine; they
/// never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Start the live session for every exam at once
    BeginLiveSession,

    /// Leave the live session and return to setup
    EndSession {
        #[serde(default)]
        should_reset: bool,
    },

    /// Pause one exam, or the whole session when `exam_id` is absent
    Pause {
        #[serde(default)]
        exam_id: Option<ExamId>,
        justification: String,
    },

    /// Resume one exam, or the whole session when `exam_id` is absent
    Resume {
        #[serde(default)]
        exam_id: Option<ExamId>,
    },

    ToggleRest { exam_id: ExamId },

    ToggleReaderWriter { exam_id: ExamId },

    AbandonExam {
        exam_id: ExamId,
        justification: String,
    },

    /// Mark a running exam as finished (issued when writing time runs out)
    FinishExam { exam_id: ExamId },

    SetAutoStart { target: DateTime<Local> },

    CancelAutoStart,

    AddExam { exam: Exam },

    /// Add several exams, skipping names already present
    AddExams { exams: Vec<Exam> },

    /// Edit the configuration of the exam with the same id
    UpdateExam { exam: Exam },

    DeleteExam { exam_id: ExamId },

    ReorderExams { old_index: usize, new_index: usize },

    UpdateSettings { patch: SettingsPatch },

    ApplySessionPreset {
        title: String,
        #[serde(default)]
        clear_exams: bool,
    },

    SetSessionMode { mode: SessionMode },

    /// Replace settings, exams and mode with an already sanitized file
    ImportSession { file: SessionFile },

    ClearAllExams,

    /// Factory defaults, keeping theme and tooltip visibility
    ResetAll,

    /// Show the exam page without going live
    PreviewExams,

    SetCurrentPage { page: Page },

    SetTheme { theme: Theme },

    ToggleTooltips,
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::BeginLiveSession => "begin_live_session",
            Command::EndSession { .. } => "end_session",
            Command::Pause { .. } => "pause",
            Command::Resume { .. } => "resume",
            Command::ToggleRest { .. } => "toggle_rest",
            Command::ToggleReaderWriter { .. } => "toggle_reader_writer",
            Command::AbandonExam { .. } => "abandon_exam",
            Command::FinishExam { .. } => "finish_exam",
            Command::SetAutoStart { .. } => "set_auto_start",
            Command::CancelAutoStart => "cancel_auto_start",
            Command::AddExam { .. } => "add_exam",
            Command::AddExams { .. } => "add_exams",
            Command::UpdateExam { .. } => "update_exam",
            Command::DeleteExam { .. } => "delete_exam",
            Command::ReorderExams { .. } => "reorder_exams",
            Command::UpdateSettings { .. } => "update_settings",
            Command::ApplySessionPreset { .. } => "apply_session_preset",
            Command::SetSessionMode { .. } => "set_session_mode",
            Command::ImportSession { .. } => "import_session",
            Command::ClearAllExams => "clear_all_exams",
            Command::ResetAll => "reset_all",
            Command::PreviewExams => "preview_exams",
            Command::SetCurrentPage { .. } => "set_current_page",
            Command::SetTheme { .. } => "set_theme",
            Command::ToggleTooltips => "toggle_tooltips",
        }
    }
}

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: ClientCommand,
}

impl Request {
    pub fn new(request_id: u64, command: ClientCommand) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Everything a client may ask of the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Apply a state-changing command
    Apply { command: Command },

    /// Get the raw session state
    GetState,

    /// Get the display projection at the service's current time
    GetView,

    /// Export the session file for later import
    ExportSession,

    /// List configured session and exam presets
    ListPresets,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Ping for keepalive
    Ping,
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnsupportedVersion,
    StoreError,
    InternalError,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// Result of an `Apply`; `changed` is false when the command was ignored
    Applied { changed: bool },
    State(SessionState),
    View(SessionView),
    Exported { file_name: String, contents: String },
    Presets(PresetCatalogue),
    Subscribed { client_id: ClientId },
    Pong,
}
