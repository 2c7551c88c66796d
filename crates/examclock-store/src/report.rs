//! Human-readable session log, produced when a live session ends

use chrono::{DateTime, Local};
use examclock_api::{ExamStatus, LogEntry, SessionMode, SessionState};
use examclock_util::{format_clock_time, format_date_iso, format_date_short};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::StoreResult;

/// Standardised test whose access codes are printed in the log
const ACCESS_CODE_TITLE: &str = "NAPLAN";

/// Per-exam summary line group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportExam {
    pub name: String,
    pub access_code: Option<String>,
    pub start_time: Option<DateTime<Local>>,
    pub write_end_time: Option<DateTime<Local>>,
    /// Reading plus writing as scheduled, without provisions
    pub scheduled_mins: u32,
    pub student_name: Option<String>,
    pub extra_time: u32,
    pub rest_breaks: u32,
    pub reader_writer_time: u32,
    pub status: ExamStatus,
}

/// Everything needed to render the session log after state is reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub title: String,
    pub session_mode: SessionMode,
    pub ended_at: DateTime<Local>,
    pub is_24hr: bool,
    pub log: Vec<LogEntry>,
    pub exams: Vec<ReportExam>,
}

impl SessionReport {
    /// Capture the report from the state as it is when the session ends
    pub fn build(state: &SessionState, now: DateTime<Local>) -> Self {
        let show_codes = state.settings.session_title == ACCESS_CODE_TITLE;

        let exams = state
            .exams
            .iter()
            .map(|exam| ReportExam {
                name: exam.name.clone(),
                access_code: (show_codes && !exam.access_code.is_empty())
                    .then(|| exam.access_code.clone()),
                start_time: exam.start_time,
                write_end_time: exam.write_end_time,
                scheduled_mins: exam.scheduled_mins(),
                student_name: (!exam.sp.student_name.is_empty())
                    .then(|| exam.sp.student_name.clone()),
                extra_time: exam.sp.extra_time,
                rest_breaks: exam.sp.rest_breaks,
                reader_writer_time: exam.sp.reader_writer_time,
                status: exam.status,
            })
            .collect();

        Self {
            title: state.settings.session_title.clone(),
            session_mode: state.session_mode,
            ended_at: now,
            is_24hr: state.settings.is_24hr,
            log: state.session_log.clone(),
            exams,
        }
    }

    /// `Exam_Log_<title>_<YYYY-MM-DD>.txt`
    pub fn file_name(&self) -> String {
        format!(
            "Exam_Log_{}_{}.txt",
            file_title(&self.title),
            format_date_iso(&self.ended_at)
        )
    }

    /// One timeline line, e.g. `[9:05:03 am] Session commenced.`
    pub fn render_log_entry(&self, entry: &LogEntry) -> String {
        format!(
            "[{}] {}",
            format_clock_time(&entry.at, self.is_24hr, true),
            entry.message
        )
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("EXAMINATION SESSION LOG\n===========================\n\n");
        out.push_str("SESSION DETAILS\n-------------------------\n");
        let _ = writeln!(out, "Title: {}", self.title);
        let _ = writeln!(out, "Date: {}\n", format_date_short(&self.ended_at));

        out.push_str("EVENT TIMELINE\n-------------------------\n");
        let timeline: Vec<String> = self.log.iter().map(|e| self.render_log_entry(e)).collect();
        out.push_str(&timeline.join("\n"));
        out.push_str("\n\nEXAM SUMMARY AT SESSION END\n-------------------------\n");

        for exam in &self.exams {
            let _ = writeln!(out, "\n- Exam: {}", exam.name);
            if let Some(code) = &exam.access_code {
                let _ = writeln!(out, "  - Test Access Code: {}", code);
            }
            if let (Some(start), Some(end)) = (exam.start_time, exam.write_end_time) {
                let _ = writeln!(out, "  - Start: {}", format_clock_time(&start, self.is_24hr, true));
                let _ = writeln!(out, "  - Final End: {}", format_clock_time(&end, self.is_24hr, true));
            }
            let _ = writeln!(out, "  - Scheduled Duration: {} mins", exam.scheduled_mins);
            if let Some(student) = &exam.student_name {
                let _ = writeln!(out, "  - Student with Provisions: {}", student);
            }
            let allowance = exam.extra_time + exam.rest_breaks + exam.reader_writer_time;
            if allowance > 0 {
                let _ = writeln!(
                    out,
                    "  - Provisions Allowance: {} mins (Extra Time: {}, Rest Breaks: {}, Reader/Writer: {})",
                    allowance, exam.extra_time, exam.rest_breaks, exam.reader_writer_time
                );
            }
            let _ = writeln!(out, "  - Final Status: {}", exam.status.as_str());
        }

        out
    }

    /// Render into `dir`, creating it if needed; returns the written path
    pub fn write_to(&self, dir: impl AsRef<Path>) -> StoreResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render())?;

        tracing::info!(path = %path.display(), "Session log written");
        Ok(path)
    }
}

/// Session title as used in export file names: non-alphanumerics become `_`
pub fn file_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use examclock_api::Exam;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 12, h, m, 0).unwrap()
    }

    fn ended_state() -> SessionState {
        let mut state = SessionState::default();
        state.settings.session_title = "Trial HSC Examinations".into();
        state.settings.is_24hr = true;

        let mut chem = Exam::new("12 Chemistry", 5, 3, 0);
        chem.start_time = Some(at(9, 0));
        chem.write_end_time = Some(at(12, 5));
        chem.status = ExamStatus::Finished;
        chem.sp.student_name = "J. Citizen".into();
        chem.sp.extra_time = 15;
        chem.sp.rest_breaks = 10;

        let mut bio = Exam::new("12 Biology", 5, 3, 0);
        bio.status = ExamStatus::Abandoned;
        bio.access_code = "12345678".into();

        state.exams = vec![chem, bio];
        state.session_log = vec![
            LogEntry {
                at: at(9, 0),
                message: "Session commenced.".into(),
            },
            LogEntry {
                at: at(12, 30),
                message: "Session ended by user.".into(),
            },
        ];
        state
    }

    #[test]
    fn file_title_replaces_punctuation() {
        assert_eq!(file_title("Trial HSC Examinations"), "trial_hsc_examinations");
        assert_eq!(file_title("Check-In Assessment"), "check_in_assessment");
    }

    #[test]
    fn report_file_name_uses_end_date() {
        let report = SessionReport::build(&ended_state(), at(12, 30));
        assert_eq!(report.file_name(), "Exam_Log_trial_hsc_examinations_2025-08-12.txt");
    }

    #[test]
    fn rendered_log_has_all_sections() {
        let text = SessionReport::build(&ended_state(), at(12, 30)).render();

        assert!(text.starts_with("EXAMINATION SESSION LOG\n"));
        assert!(text.contains("Title: Trial HSC Examinations\n"));
        assert!(text.contains("Date: 12/08/2025\n"));
        assert!(text.contains("[09:00:00] Session commenced.\n[12:30:00] Session ended by user."));
        assert!(text.contains("- Exam: 12 Chemistry\n"));
        assert!(text.contains("  - Start: 09:00:00\n  - Final End: 12:05:00\n"));
        assert!(text.contains("  - Scheduled Duration: 185 mins\n"));
        assert!(text.contains("  - Student with Provisions: J. Citizen\n"));
        assert!(text.contains(
            "  - Provisions Allowance: 25 mins (Extra Time: 15, Rest Breaks: 10, Reader/Writer: 0)\n"
        ));
        assert!(text.contains("  - Final Status: finished\n"));
        assert!(text.contains("  - Final Status: abandoned\n"));
    }

    #[test]
    fn access_codes_only_for_naplan() {
        let state = ended_state();
        let report = SessionReport::build(&state, at(12, 30));
        assert!(report.exams.iter().all(|e| e.access_code.is_none()));

        let mut naplan = state;
        naplan.settings.session_title = "NAPLAN".into();
        let report = SessionReport::build(&naplan, at(12, 30));
        assert_eq!(report.exams[1].access_code.as_deref(), Some("12345678"));
        assert!(report.render().contains("  - Test Access Code: 12345678\n"));
    }

    #[test]
    fn write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let report = SessionReport::build(&ended_state(), at(12, 30));

        let path = report.write_to(&logs).unwrap();
        assert_eq!(path, logs.join(report.file_name()));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, report.render());
    }

    #[test]
    fn exams_without_times_skip_start_and_end() {
        let text = SessionReport::build(&ended_state(), at(12, 30)).render();
        let biology = text.split("- Exam: 12 Biology").nth(1).unwrap();
        assert!(!biology.contains("Start:"));
    }
}
