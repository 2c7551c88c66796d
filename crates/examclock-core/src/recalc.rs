//! End-time recalculation for a live session

use chrono::{DateTime, Local};
use examclock_api::{Exam, SessionState};
use examclock_util::add_duration;
use std::time::Duration;

/// Time an exam's clock has been stopped as of `now`, including the
/// session-wide pause passed in as `global_offset`.
pub fn exam_offset(exam: &Exam, global_offset: Duration, now: DateTime<Local>) -> Duration {
    global_offset + exam.pause_offset(now) + exam.rest_used(now) + exam.reader_writer_used(now)
}

/// Recompute `start_time`, `read_end_time` and `write_end_time` of every
/// running exam from a single clock read.
///
/// All exams share the first exam's start instant. Every kind of stopped time
/// (global pause, exam pause, rest, reader/writer, in-progress intervals
/// included) pushes both boundaries back by the same amount. Finished and
/// abandoned exams keep their last times.
pub fn recalculate_end_times(state: &mut SessionState, now: DateTime<Local>) {
    let session_start = state.session_start().unwrap_or(now);
    let global_offset = state.global_pause_offset(now);

    for exam in state.exams.iter_mut().filter(|e| !e.status.is_terminal()) {
        let offset = exam_offset(exam, global_offset, now);
        let read_end = add_duration(session_start, exam.read_duration() + offset);

        exam.start_time = Some(session_start);
        exam.read_end_time = Some(read_end);
        exam.write_end_time = Some(add_duration(read_end, exam.write_duration()));
    }
}
