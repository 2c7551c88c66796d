//! Configuration validation

use crate::schema::{RawConfig, RawExamPreset, RawSessionPreset};
use examclock_api::{GRID_LAYOUT_MAX, GRID_LAYOUT_MIN, SettingsPatch};
use std::collections::HashSet;
use thiserror::Error;

/// Allowed range for the service tick interval
pub const MIN_TICK_MILLIS: u64 = 100;
pub const MAX_TICK_MILLIS: u64 = 1000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Session preset '{title}': {message}")]
    SessionPresetError { title: String, message: String },

    #[error("Duplicate session preset title: {0}")]
    DuplicatePresetTitle(String),

    #[error("Exam preset '{name}': {message}")]
    ExamPresetError { name: String, message: String },

    #[error("{context}: grid_layout {value} outside {min}..={max}")]
    InvalidGridLayout {
        context: String,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("Service config error: {0}")]
    ServiceError(String),
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(tick) = config.service.tick_millis
        && !(MIN_TICK_MILLIS..=MAX_TICK_MILLIS).contains(&tick)
    {
        errors.push(ValidationError::ServiceError(format!(
            "tick_millis {} outside {}..={}",
            tick, MIN_TICK_MILLIS, MAX_TICK_MILLIS
        )));
    }

    errors.extend(validate_patch(&config.defaults, "defaults"));

    let mut seen_titles = HashSet::new();
    for preset in &config.session_presets {
        if !seen_titles.insert(preset.title.as_str()) {
            errors.push(ValidationError::DuplicatePresetTitle(preset.title.clone()));
        }
        errors.extend(validate_session_preset(preset));
    }

    for preset in &config.exam_presets {
        errors.extend(validate_exam_preset(preset));
    }

    errors
}

fn validate_patch(patch: &SettingsPatch, context: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(layout) = patch.grid_layout
        && !(GRID_LAYOUT_MIN..=GRID_LAYOUT_MAX).contains(&layout)
    {
        errors.push(ValidationError::InvalidGridLayout {
            context: context.to_string(),
            value: layout,
            min: GRID_LAYOUT_MIN,
            max: GRID_LAYOUT_MAX,
        });
    }

    errors
}

fn validate_session_preset(preset: &RawSessionPreset) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if preset.title.trim().is_empty() {
        errors.push(ValidationError::SessionPresetError {
            title: preset.title.clone(),
            message: "title cannot be empty".into(),
        });
    }

    if let Some(title) = &preset.overrides.session_title
        && title != &preset.title
    {
        errors.push(ValidationError::SessionPresetError {
            title: preset.title.clone(),
            message: "overrides may not change the session title".into(),
        });
    }

    errors.extend(validate_patch(
        &preset.overrides,
        &format!("session preset '{}'", preset.title),
    ));

    errors
}

fn validate_exam_preset(preset: &RawExamPreset) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if preset.name.trim().is_empty() {
        errors.push(ValidationError::ExamPresetError {
            name: preset.name.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if preset.catalogue.trim().is_empty() {
        errors.push(ValidationError::ExamPresetError {
            name: preset.name.clone(),
            message: "catalogue cannot be empty".into(),
        });
    }

    if preset.read_mins == 0 && preset.write_hrs == 0 && preset.write_mins == 0 {
        errors.push(ValidationError::ExamPresetError {
            name: preset.name.clone(),
            message: "total duration cannot be zero".into(),
        });
    }

    if preset.write_mins >= 60 {
        errors.push(ValidationError::ExamPresetError {
            name: preset.name.clone(),
            message: format!("write_mins {} should be expressed in hours", preset.write_mins),
        });
    }

    errors
}
