//! Session file export and lenient import
//!
//! Exported files carry the session mode, settings and exam list. Imported
//! files may come from older versions (camelCase names, flat pause/rest
//! flags, missing fields), so they are parsed loosely and sanitized before
//! they reach the session engine.

use chrono::{DateTime, Local};
use examclock_api::{
    Exam, ExamStatus, GRID_LAYOUT_MAX, GRID_LAYOUT_MIN, Interruption, SessionFile, SessionMode,
    SessionState, Settings, SettingsPatch, SpecialProvisions,
};
use examclock_util::{ExamId, format_date_iso};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{StoreError, StoreResult, report::file_title};

const UNTITLED_EXAM: &str = "Untitled Loaded Exam";

/// `ExamTimer_Session_<title>_<YYYY-MM-DD>.json`
pub fn session_file_name(title: &str, now: DateTime<Local>) -> String {
    format!(
        "ExamTimer_Session_{}_{}.json",
        file_title(title),
        format_date_iso(&now)
    )
}

/// Export the current session as `(file name, pretty JSON)`
pub fn export_session(state: &SessionState, now: DateTime<Local>) -> StoreResult<(String, String)> {
    let file = SessionFile::from_state(state);
    let contents = serde_json::to_string_pretty(&file)?;
    Ok((session_file_name(&state.settings.session_title, now), contents))
}

/// Session file as found on disk, before sanitizing
#[derive(Debug, Default, Deserialize)]
struct RawSessionFile {
    #[serde(default, alias = "sessionMode")]
    session_mode: Option<Value>,
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    exams: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExam {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, alias = "readMins", deserialize_with = "lenient_minutes")]
    read_mins: Option<u32>,
    #[serde(default, alias = "writeHrs", deserialize_with = "lenient_minutes")]
    write_hrs: Option<u32>,
    #[serde(default, alias = "writeMins", deserialize_with = "lenient_minutes")]
    write_mins: Option<u32>,
    #[serde(default, alias = "optionalInfo", deserialize_with = "lenient_string")]
    optional_info: Option<String>,
    #[serde(default, alias = "hasAccessCode", deserialize_with = "lenient_bool")]
    has_access_code: Option<bool>,
    #[serde(default, alias = "accessCode", deserialize_with = "lenient_string")]
    access_code: Option<String>,
    #[serde(default)]
    sp: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProvisions {
    #[serde(default, alias = "studentName", deserialize_with = "lenient_string")]
    student_name: Option<String>,
    #[serde(default, alias = "showStudentName", deserialize_with = "lenient_bool")]
    show_student_name: Option<bool>,
    #[serde(default, alias = "extraTime", deserialize_with = "lenient_minutes")]
    extra_time: Option<u32>,
    #[serde(default, alias = "restBreaks", deserialize_with = "lenient_minutes")]
    rest_breaks: Option<u32>,
    #[serde(default, alias = "readerWriterTime", deserialize_with = "lenient_minutes")]
    reader_writer_time: Option<u32>,
}

/// Accept integers, floats and numeric strings; anything else is absent
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_minutes))
}

fn value_as_minutes(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings as-is, numbers in their decimal form; anything else is absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Booleans, 0/1 and the usual spellings of yes and no
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn value_as_id(value: Option<&Value>) -> Option<ExamId> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(ExamId::new(s.clone())),
        Value::Number(n) => Some(ExamId::new(n.to_string())),
        _ => None,
    }
}

/// Deserialize a value that should be an object, treating anything else as empty
fn object_or_default<T>(value: Value, what: &str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    if !value.is_object() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, what, "Malformed entry in session file, using defaults");
        T::default()
    })
}

fn sanitize_provisions(raw: RawProvisions) -> SpecialProvisions {
    SpecialProvisions {
        student_name: raw.student_name.unwrap_or_default(),
        show_student_name: raw.show_student_name.unwrap_or(false),
        extra_time: raw.extra_time.unwrap_or(0),
        rest_breaks: raw.rest_breaks.unwrap_or(0),
        rest_taken: Duration::ZERO,
        reader_writer_time: raw.reader_writer_time.unwrap_or(0),
        reader_writer_taken: Duration::ZERO,
    }
}

fn sanitize_exam(raw: RawExam, index: usize, now: DateTime<Local>) -> Exam {
    let id = value_as_id(raw.id.as_ref())
        .unwrap_or_else(|| ExamId::new(format!("loaded-{}-{}", now.timestamp_millis(), index)));

    let name = raw
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNTITLED_EXAM.to_string());

    let access_code = raw.access_code.unwrap_or_default();
    let has_access_code = raw.has_access_code.unwrap_or(!access_code.is_empty());

    let sp = raw
        .sp
        .map(|v| object_or_default::<RawProvisions>(v, "sp"))
        .map(sanitize_provisions)
        .unwrap_or_default();

    Exam {
        id,
        name,
        read_mins: raw.read_mins.unwrap_or(0),
        write_hrs: raw.write_hrs.unwrap_or(0),
        write_mins: raw.write_mins.unwrap_or(0),
        optional_info: raw.optional_info.unwrap_or_default(),
        has_access_code,
        access_code,
        sp,
        status: ExamStatus::Running,
        interruption: Interruption::None,
        pause_duration_total: Duration::ZERO,
        start_time: None,
        read_end_time: None,
        write_end_time: None,
    }
}

fn sanitize_mode(value: Option<Value>) -> SessionMode {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Parse and sanitize a session file.
///
/// Settings are merged over `defaults`; exams lose any live interruption and
/// accumulated provision usage. Only input that is not JSON at all is an
/// error.
pub fn import_session_file(
    json: &str,
    defaults: &Settings,
    now: DateTime<Local>,
) -> StoreResult<SessionFile> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| StoreError::InvalidSessionFile(e.to_string()))?;
    let raw: RawSessionFile = object_or_default(root, "session file");

    let mut settings = raw
        .settings
        .map(|v| object_or_default::<SettingsPatch>(v, "settings"))
        .unwrap_or_default()
        .merged_onto(defaults);
    settings.grid_layout = settings.grid_layout.clamp(GRID_LAYOUT_MIN, GRID_LAYOUT_MAX);

    let exams: Vec<Exam> = match raw.exams {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let raw_exam = object_or_default::<RawExam>(item, "exam");
                sanitize_exam(raw_exam, index, now)
            })
            .collect(),
        _ => Vec::new(),
    };

    debug!(exam_count = exams.len(), "Session file imported");

    Ok(SessionFile {
        session_mode: sanitize_mode(raw.session_mode),
        settings,
        exams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 12, 8, 30, 0).unwrap()
    }

    #[test]
    fn session_file_name_format() {
        assert_eq!(
            session_file_name("Half Yearly Examinations", now()),
            "ExamTimer_Session_half_yearly_examinations_2025-08-12.json"
        );
    }

    #[test]
    fn export_then_import_keeps_configuration() {
        let mut state = SessionState::default();
        state.session_mode = SessionMode::Standardised;
        state.settings.session_title = "NAPLAN".into();
        let mut exam = Exam::new("Year 7 Reading", 0, 1, 5).with_id("reading");
        exam.access_code = "1234567".into();
        exam.has_access_code = true;
        state.exams.push(exam.clone());

        let (name, json) = export_session(&state, now()).unwrap();
        assert_eq!(name, "ExamTimer_Session_naplan_2025-08-12.json");

        let file = import_session_file(&json, &Settings::default(), now()).unwrap();
        assert_eq!(file.session_mode, SessionMode::Standardised);
        assert_eq!(file.settings.session_title, "NAPLAN");
        assert_eq!(file.exams, vec![exam]);
    }

    #[test]
    fn legacy_camel_case_file_is_sanitized() {
        let json = r#"{
            "sessionMode": "examinations",
            "settings": { "sessionTitle": "Exit Examinations", "gridLayout": 2, "fontSizes": {} },
            "exams": [
                {
                    "id": "1718000000000",
                    "name": "10 Science",
                    "readMins": 5,
                    "writeHrs": 1,
                    "writeMins": 30,
                    "isPaused": true,
                    "pauseStartTime": 1718000000000,
                    "pauseDurationTotal": 60000,
                    "status": "finished",
                    "sp": { "studentName": "A. Student", "extraTime": 10, "restBreaks": 5,
                            "restTaken": 120000, "onRest": true, "restStartTime": 1718000000000 }
                },
                { "readMins": "10", "writeHrs": 2.0 },
                "garbage"
            ]
        }"#;

        let file = import_session_file(json, &Settings::default(), now()).unwrap();
        assert_eq!(file.settings.session_title, "Exit Examinations");
        assert_eq!(file.settings.grid_layout, 2);
        assert_eq!(file.settings.school_name, Settings::default().school_name);
        assert_eq!(file.exams.len(), 3);

        let science = &file.exams[0];
        assert_eq!(science.id.as_str(), "1718000000000");
        assert_eq!((science.read_mins, science.write_hrs, science.write_mins), (5, 1, 30));
        assert_eq!(science.status, ExamStatus::Running);
        assert_eq!(science.interruption, Interruption::None);
        assert_eq!(science.pause_duration_total, Duration::ZERO);
        assert_eq!(science.sp.student_name, "A. Student");
        assert_eq!(science.sp.extra_time, 10);
        assert_eq!(science.sp.rest_breaks, 5);
        assert_eq!(science.sp.rest_taken, Duration::ZERO);

        let loose = &file.exams[1];
        assert_eq!(loose.name, "Untitled Loaded Exam");
        assert_eq!((loose.read_mins, loose.write_hrs), (10, 2));
        let expected_id = format!("loaded-{}-1", now().timestamp_millis());
        assert_eq!(loose.id.as_str(), expected_id);

        assert_eq!(file.exams[2].name, "Untitled Loaded Exam");
    }

    #[test]
    fn access_code_flag_inferred_from_code() {
        let json = r#"{ "exams": [ { "name": "Numeracy", "accessCode": "ABC123" }, { "name": "Writing" } ] }"#;
        let file = import_session_file(json, &Settings::default(), now()).unwrap();

        assert!(file.exams[0].has_access_code);
        assert!(!file.exams[1].has_access_code);
        assert_eq!(file.session_mode, SessionMode::Examinations);
    }

    #[test]
    fn mistyped_fields_fall_back_one_at_a_time() {
        let json = r#"{ "exams": [ {
            "name": "12 Music 1", "readMins": 5, "writeHrs": 1, "writeMins": 30,
            "hasAccessCode": "yes", "accessCode": 4321, "optionalInfo": ["bad"],
            "sp": { "studentName": 7, "showStudentName": "maybe", "extraTime": 10 }
        } ] }"#;
        let file = import_session_file(json, &Settings::default(), now()).unwrap();

        let music = &file.exams[0];
        assert_eq!(music.name, "12 Music 1");
        assert_eq!((music.read_mins, music.write_hrs, music.write_mins), (5, 1, 30));
        assert!(music.has_access_code);
        assert_eq!(music.access_code, "4321");
        assert_eq!(music.optional_info, "");
        assert_eq!(music.sp.student_name, "7");
        assert!(!music.sp.show_student_name);
        assert_eq!(music.sp.extra_time, 10);
    }

    #[test]
    fn non_array_exams_become_empty() {
        let json = r#"{ "sessionMode": "bogus", "settings": { "gridLayout": 12 }, "exams": { "0": {} } }"#;
        let file = import_session_file(json, &Settings::default(), now()).unwrap();
        assert!(file.exams.is_empty());
        assert_eq!(file.settings.grid_layout, 5);
        assert_eq!(file.session_mode, SessionMode::Examinations);
    }

    #[test]
    fn invalid_json_is_rejected() {
        let result = import_session_file("not json", &Settings::default(), now());
        assert!(matches!(result, Err(StoreError::InvalidSessionFile(_))));
    }
}
