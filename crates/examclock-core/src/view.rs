//! Projection of session state into what the display shows at one instant

use chrono::{DateTime, Local};
use examclock_api::{DisplayStatus, Exam, ExamStatus, ExamView, SessionState, SessionView};
use examclock_util::{add_duration, millis_until};

use crate::recalc::recalculate_end_times;

/// Project `state` at `now`. Never mutates the state.
///
/// Live examinations are projected from a recalculated copy, so the
/// countdown of anything paused stays frozen. Outside a live session every
/// exam is a preview showing its full duration; with an auto-start target
/// armed, preview times count from the target.
pub fn project(state: &SessionState, now: DateTime<Local>) -> SessionView {
    let timed = state.is_live && state.is_examinations();

    let mut current = state.clone();
    if timed {
        recalculate_end_times(&mut current, now);
    }

    let auto_start = (!state.is_live)
        .then_some(state.auto_start_target_time)
        .flatten();

    let exams = current
        .exams
        .iter()
        .map(|exam| project_exam(&current, exam, now, timed, auto_start))
        .collect();

    SessionView {
        generated_at: now,
        title: state.settings.session_title.clone(),
        session_mode: state.session_mode,
        current_page: state.current_page,
        is_live: state.is_live,
        is_paused: state.is_paused(),
        timers_disabled: state.settings.disable_timers || !state.is_examinations(),
        auto_start_target_time: state.auto_start_target_time,
        auto_start_remaining_ms: auto_start.map(|target| millis_until(target, now)),
        exams,
    }
}

fn project_exam(
    state: &SessionState,
    exam: &Exam,
    now: DateTime<Local>,
    timed: bool,
    auto_start: Option<DateTime<Local>>,
) -> ExamView {
    let (start_time, read_end_time, write_end_time) = if timed {
        (exam.start_time, exam.read_end_time, exam.write_end_time)
    } else if let Some(start) = auto_start {
        let read_end = add_duration(start, exam.read_duration());
        (
            Some(start),
            Some(read_end),
            Some(add_duration(read_end, exam.write_duration())),
        )
    } else {
        (None, None, None)
    };

    let (status, remaining_ms) = display_status(state, exam, now, timed);
    let settings = &state.settings;

    ExamView {
        exam_id: exam.id.clone(),
        name: exam.name.clone(),
        status,
        exam_status: exam.status,
        remaining_ms,
        start_time,
        read_end_time,
        write_end_time,
        rest_remaining_ms: exam.rest_remaining_ms(now),
        reader_writer_remaining_ms: exam.reader_writer_remaining_ms(now),
        has_rest_budget: exam.sp.rest_breaks > 0,
        has_reader_writer_budget: exam.sp.reader_writer_time > 0,
        total_duration_mins: u32::try_from(exam.total_duration().as_secs() / 60).unwrap_or(u32::MAX),
        optional_info: exam.optional_info.clone(),
        student_name: (settings.special_provisions
            && exam.sp.show_student_name
            && !exam.sp.student_name.is_empty())
        .then(|| exam.sp.student_name.clone()),
        access_code: (exam.has_access_code && !exam.access_code.is_empty())
            .then(|| exam.access_code.clone()),
    }
}

/// Headline status and the milliseconds remaining for it.
///
/// Precedence: terminal, paused (exam or session), rest, reader/writer,
/// then reading or writing by phase.
fn display_status(
    state: &SessionState,
    exam: &Exam,
    now: DateTime<Local>,
    timed: bool,
) -> (DisplayStatus, i64) {
    if !state.is_live {
        let total = i64::try_from(exam.total_duration().as_millis()).unwrap_or(i64::MAX);
        return (DisplayStatus::Preview, total);
    }

    match exam.status {
        ExamStatus::Finished => return (DisplayStatus::Finished, 0),
        ExamStatus::Abandoned => return (DisplayStatus::Abandoned, 0),
        ExamStatus::Running => {}
    }

    let phase_remaining = phase_remaining_ms(exam, now, timed);

    if exam.is_paused() || state.is_paused() {
        (DisplayStatus::Paused, phase_remaining)
    } else if exam.on_rest() {
        (DisplayStatus::OnRest, exam.rest_remaining_ms(now))
    } else if exam.on_reader_writer() {
        (DisplayStatus::ReaderWriter, exam.reader_writer_remaining_ms(now))
    } else {
        match (exam.read_end_time, exam.write_end_time) {
            (Some(read_end), _) if timed && now < read_end => {
                (DisplayStatus::Reading, millis_until(read_end, now))
            }
            (_, Some(write_end)) if timed && now >= write_end => (DisplayStatus::Finished, 0),
            _ => (DisplayStatus::Writing, phase_remaining),
        }
    }
}

fn phase_remaining_ms(exam: &Exam, now: DateTime<Local>, timed: bool) -> i64 {
    if !timed {
        return 0;
    }
    let boundary = match exam.read_end_time {
        Some(read_end) if now < read_end => Some(read_end),
        _ => exam.write_end_time,
    };
    boundary.map_or(0, |end| millis_until(end, now).max(0))
}
