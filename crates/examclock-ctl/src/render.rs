//! Plain-text rendering of session views and events

use examclock_api::{DisplayStatus, EventPayload, ExamView, SessionView};
use examclock_util::{format_clock_time, format_countdown};
use std::fmt::Write;

/// Multi-line status block for a terminal
pub fn render_view(view: &SessionView, is_24hr: bool) -> String {
    let mut out = String::new();

    let phase = if view.is_live { "LIVE" } else { "SETUP" };
    let _ = writeln!(out, "{}  [{}]", view.title, phase);

    if view.is_paused {
        let _ = writeln!(out, "Session paused");
    }

    if let (Some(target), Some(remaining)) =
        (view.auto_start_target_time, view.auto_start_remaining_ms)
    {
        let _ = writeln!(
            out,
            "Auto-start at {} (in {})",
            format_clock_time(&target, is_24hr, false),
            format_countdown(remaining)
        );
    }

    if view.exams.is_empty() {
        let _ = writeln!(out, "No exams");
        return out;
    }

    for exam in &view.exams {
        render_exam(&mut out, exam, view.timers_disabled, is_24hr);
    }

    out
}

fn render_exam(out: &mut String, exam: &ExamView, timers_disabled: bool, is_24hr: bool) {
    let countdown = if timers_disabled {
        String::new()
    } else {
        match exam.status {
            DisplayStatus::Finished | DisplayStatus::Abandoned => String::new(),
            DisplayStatus::Preview => format!("{} min", exam.total_duration_mins),
            _ => format_countdown(exam.remaining_ms),
        }
    };

    let _ = writeln!(
        out,
        "  {:<28} {:<22} {:>9}  [{}]",
        exam.name,
        exam.status.label(),
        countdown,
        exam.exam_id
    );

    if let (Some(start), Some(end)) = (exam.start_time, exam.write_end_time) {
        let _ = writeln!(
            out,
            "      {} - {}",
            format_clock_time(&start, is_24hr, false),
            format_clock_time(&end, is_24hr, false)
        );
    }

    if let Some(name) = &exam.student_name {
        let _ = writeln!(out, "      Student: {}", name);
    }
    if let Some(code) = &exam.access_code {
        let _ = writeln!(out, "      Access code: {}", code);
    }
    if exam.has_rest_budget {
        let _ = writeln!(out, "      Rest left: {}", signed_countdown(exam.rest_remaining_ms));
    }
    if exam.has_reader_writer_budget {
        let _ = writeln!(
            out,
            "      Reader/writer left: {}",
            signed_countdown(exam.reader_writer_remaining_ms)
        );
    }
}

/// Overruns show with a leading minus
fn signed_countdown(ms: i64) -> String {
    if ms < 0 {
        format!("-{}", format_countdown(-ms))
    } else {
        format_countdown(ms)
    }
}

/// One line per event for `watch`; `None` for events not worth printing
pub fn render_event(payload: &EventPayload, is_24hr: bool) -> Option<String> {
    match payload {
        EventPayload::StateChanged(_) => None,
        EventPayload::SessionCommenced {
            started_at,
            exam_count,
        } => Some(format!(
            "Session commenced at {} with {} exam(s)",
            format_clock_time(started_at, is_24hr, true),
            exam_count
        )),
        EventPayload::SessionEnded {
            title,
            ended_at,
            report_path,
        } => {
            let mut line = format!(
                "Session \"{}\" ended at {}",
                title,
                format_clock_time(ended_at, is_24hr, true)
            );
            if let Some(path) = report_path {
                let _ = write!(line, "; log written to {}", path);
            }
            Some(line)
        }
        EventPayload::ExamFinished { name, .. } => Some(format!("Exam \"{}\" finished", name)),
        EventPayload::AutoStartArmed { target } => Some(format!(
            "Auto-start armed for {}",
            format_clock_time(target, is_24hr, false)
        )),
        EventPayload::Shutdown => Some("examclockd is shutting down".into()),
    }
}
