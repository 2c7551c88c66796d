//! Validated policy structures

use crate::presets::{builtin_exam_presets, builtin_session_presets, catalogue_for};
use crate::schema::{RawConfig, RawExamPreset, RawServiceConfig, RawSessionPreset};
use examclock_api::{
    Exam, ExamPreset, PresetCatalogue, SessionMode, SessionPreset, Settings, SettingsPatch,
};
use examclock_util::{default_data_dir, default_socket_path};
use std::path::PathBuf;
use std::time::Duration;

/// Default timer tick
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct Policy {
    pub service: ServiceConfig,

    /// Factory settings and session presets, used by the session engine
    pub defaults: SessionDefaults,

    /// Exam catalogue
    pub exam_presets: Vec<ExamPreset>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let session_presets = if raw.session_presets.is_empty() {
            builtin_session_presets()
        } else {
            raw.session_presets.into_iter().map(convert_session_preset).collect()
        };

        let exam_presets = if raw.exam_presets.is_empty() {
            builtin_exam_presets()
        } else {
            raw.exam_presets.into_iter().map(convert_exam_preset).collect()
        };

        Self {
            service: ServiceConfig::from_raw(raw.service),
            defaults: SessionDefaults {
                settings: raw.defaults.merged_onto(&Settings::default()),
                session_presets,
            },
            exam_presets,
        }
    }

    /// Presets as offered to clients
    pub fn catalogue(&self) -> PresetCatalogue {
        PresetCatalogue {
            session_presets: self.defaults.session_presets.clone(),
            exam_presets: self.exam_presets.clone(),
        }
    }

    /// Catalogue exams for a session title, following shared catalogues
    pub fn exam_presets_for(&self, title: &str) -> Vec<&ExamPreset> {
        let catalogue = catalogue_for(title);
        self.exam_presets
            .iter()
            .filter(|p| p.catalogue == catalogue)
            .collect()
    }

    /// Fresh exam built from the catalogue item called `name`
    pub fn exam_from_preset(&self, name: &str) -> Option<Exam> {
        self.exam_presets
            .iter()
            .find(|p| p.name == name)
            .map(|p| Exam::new(p.name.clone(), p.read_mins, p.write_hrs, p.write_mins))
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            defaults: SessionDefaults::default(),
            exam_presets: builtin_exam_presets(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub tick: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            tick: raw
                .tick_millis
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
            tick: DEFAULT_TICK,
        }
    }
}

/// Factory settings plus the session presets that reshape them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub settings: Settings,
    pub session_presets: Vec<SessionPreset>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            session_presets: builtin_session_presets(),
        }
    }
}

impl SessionDefaults {
    pub fn preset(&self, title: &str) -> Option<&SessionPreset> {
        self.session_presets.iter().find(|p| p.title == title)
    }

    /// Title of the preset selected when switching into `mode`
    pub fn first_preset_title(&self, mode: SessionMode) -> Option<&str> {
        self.session_presets
            .iter()
            .find(|p| p.mode == mode)
            .map(|p| p.title.as_str())
    }

    /// Factory settings with the preset for `title` applied and the title set.
    ///
    /// Unknown titles still get the title on plain factory settings.
    pub fn settings_for(&self, title: &str) -> Settings {
        let mut settings = self.settings.clone();
        if let Some(preset) = self.preset(title) {
            preset.overrides.apply_to(&mut settings);
        }
        settings.session_title = title.to_string();
        settings
    }

    /// Session mode implied by a preset title, if the title is known
    pub fn mode_for(&self, title: &str) -> Option<SessionMode> {
        self.preset(title).map(|p| p.mode)
    }
}

fn convert_session_preset(raw: RawSessionPreset) -> SessionPreset {
    SessionPreset {
        title: raw.title,
        mode: raw.mode,
        overrides: SettingsPatch {
            session_title: None,
            ..raw.overrides
        },
    }
}

fn convert_exam_preset(raw: RawExamPreset) -> ExamPreset {
    ExamPreset {
        catalogue: raw.catalogue,
        category: raw.category,
        name: raw.name,
        read_mins: raw.read_mins,
        write_hrs: raw.write_hrs,
        write_mins: raw.write_mins,
    }
}
