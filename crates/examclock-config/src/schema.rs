//! Raw configuration schema (as parsed from TOML)

use examclock_api::{SessionMode, SettingsPatch};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Factory defaults layered over the built-in settings
    #[serde(default)]
    pub defaults: SettingsPatch,

    /// Session presets; the built-in list is used when empty
    #[serde(default)]
    pub session_presets: Vec<RawSessionPreset>,

    /// Exam catalogue; the built-in list is used when empty
    #[serde(default)]
    pub exam_presets: Vec<RawExamPreset>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/examclock/examclockd.sock)
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store and session logs
    pub data_dir: Option<PathBuf>,

    /// Timer tick interval in milliseconds (100..=1000)
    pub tick_millis: Option<u64>,
}

/// Raw session preset
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSessionPreset {
    pub title: String,

    pub mode: SessionMode,

    #[serde(default)]
    pub overrides: SettingsPatch,
}

/// Raw exam catalogue item
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawExamPreset {
    /// Session title this exam belongs to
    pub catalogue: String,

    pub category: String,

    pub name: String,

    #[serde(default)]
    pub read_mins: u32,

    #[serde(default)]
    pub write_hrs: u32,

    #[serde(default)]
    pub write_mins: u32,
}
