//! Display and session settings, UI preferences, and presets

use serde::{Deserialize, Serialize};

use crate::SessionMode;

/// Smallest and largest number of exam cards per row
pub const GRID_LAYOUT_MIN: u8 = 1;
pub const GRID_LAYOUT_MAX: u8 = 5;

/// Display and session settings for the exam room screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session_title: String,
    pub school_name: String,
    pub centre_number: String,
    pub show_school: bool,
    pub show_centre: bool,
    pub show_crest: bool,
    pub show_status: bool,
    pub show_times: bool,
    pub show_countdown: bool,
    /// Standardised tests run untimed; the display shows no countdowns
    pub disable_timers: bool,
    pub special_provisions: bool,
    /// Show special-provision controls on the live screen
    pub show_sp_live: bool,
    /// Exam cards per row, 1..=5
    pub grid_layout: u8,
    pub show_seconds: bool,
    pub is_24hr: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_title: "Trial HSC Examinations".into(),
            school_name: "Inverell High School".into(),
            centre_number: "Examination Centre 222".into(),
            show_school: true,
            show_centre: true,
            show_crest: true,
            show_status: true,
            show_times: true,
            show_countdown: false,
            disable_timers: false,
            special_provisions: false,
            show_sp_live: true,
            grid_layout: 3,
            show_seconds: true,
            is_24hr: false,
        }
    }
}

/// Partial settings: every present field overrides the target.
///
/// Used for live settings updates, configured defaults, preset overrides and
/// imported session files (which may use the older camelCase field names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, alias = "sessionTitle", skip_serializing_if = "Option::is_none")]
    pub session_title: Option<String>,
    #[serde(default, alias = "schoolName", skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, alias = "centreNumber", skip_serializing_if = "Option::is_none")]
    pub centre_number: Option<String>,
    #[serde(default, alias = "showSchool", skip_serializing_if = "Option::is_none")]
    pub show_school: Option<bool>,
    #[serde(default, alias = "showCentre", skip_serializing_if = "Option::is_none")]
    pub show_centre: Option<bool>,
    #[serde(default, alias = "showCrest", skip_serializing_if = "Option::is_none")]
    pub show_crest: Option<bool>,
    #[serde(default, alias = "showStatus", skip_serializing_if = "Option::is_none")]
    pub show_status: Option<bool>,
    #[serde(default, alias = "showTimes", skip_serializing_if = "Option::is_none")]
    pub show_times: Option<bool>,
    #[serde(default, alias = "showCountdown", skip_serializing_if = "Option::is_none")]
    pub show_countdown: Option<bool>,
    #[serde(default, alias = "disableTimers", skip_serializing_if = "Option::is_none")]
    pub disable_timers: Option<bool>,
    #[serde(default, alias = "specialProvisions", skip_serializing_if = "Option::is_none")]
    pub special_provisions: Option<bool>,
    #[serde(default, alias = "showSPLive", skip_serializing_if = "Option::is_none")]
    pub show_sp_live: Option<bool>,
    #[serde(default, alias = "gridLayout", skip_serializing_if = "Option::is_none")]
    pub grid_layout: Option<u8>,
    #[serde(default, alias = "showSeconds", skip_serializing_if = "Option::is_none")]
    pub show_seconds: Option<bool>,
    #[serde(default, alias = "is24hr", skip_serializing_if = "Option::is_none")]
    pub is_24hr: Option<bool>,
}

macro_rules! merge_fields {
    ($patch:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

impl SettingsPatch {
    /// Apply every present field onto `settings`
    pub fn apply_to(&self, settings: &mut Settings) {
        merge_fields!(
            self,
            settings,
            session_title,
            school_name,
            centre_number,
            show_school,
            show_centre,
            show_crest,
            show_status,
            show_times,
            show_countdown,
            disable_timers,
            special_provisions,
            show_sp_live,
            grid_layout,
            show_seconds,
            is_24hr,
        );
    }

    /// Settings produced by applying this patch onto `base`
    pub fn merged_onto(&self, base: &Settings) -> Settings {
        let mut settings = base.clone();
        self.apply_to(&mut settings);
        settings
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}

/// Colour theme of the display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// UI preferences that survive a factory reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    pub theme: Theme,
    pub show_tooltips: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            show_tooltips: true,
        }
    }
}

/// A named session preset: picks the session mode and tweaks the settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreset {
    pub title: String,
    pub mode: SessionMode,
    #[serde(default)]
    pub overrides: SettingsPatch,
}

/// A catalogue exam that can be added to a session in one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPreset {
    /// Session title the catalogue belongs to, e.g. "Trial HSC Examinations"
    pub catalogue: String,
    pub category: String,
    pub name: String,
    pub read_mins: u32,
    pub write_hrs: u32,
    pub write_mins: u32,
}

/// Everything a client needs to offer presets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetCatalogue {
    pub session_presets: Vec<SessionPreset>,
    pub exam_presets: Vec<ExamPreset>,
}
