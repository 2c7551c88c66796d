//! Autonomous timing: auto-start and the per-tick timing watch
//!
//! Neither mutates state. Both look at the current state and clock and tell
//! the service which ordinary commands to submit.

use chrono::{DateTime, Local};
use examclock_api::{Command, Interruption, SessionState};
use tracing::{debug, info};

use crate::recalc::recalculate_end_times;

/// What the service should do after polling the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAction {
    /// Prepare the display and begin the live session
    Commence { target: DateTime<Local> },
}

/// Fires once per armed auto-start target
#[derive(Debug, Default)]
pub struct AutoStartScheduler {
    fired_for: Option<DateTime<Local>>,
}

impl AutoStartScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the armed target against `now`.
    ///
    /// A target already in the past fires on the first poll. Clearing the
    /// target in the state disarms the scheduler, so a cancelled target never
    /// fires later.
    pub fn poll(&mut self, state: &SessionState, now: DateTime<Local>) -> Option<SchedulerAction> {
        let Some(target) = state.auto_start_target_time else {
            if self.fired_for.take().is_some() {
                debug!("Auto-start disarmed");
            }
            return None;
        };

        if state.is_live || self.fired_for == Some(target) || now < target {
            return None;
        }

        self.fired_for = Some(target);
        info!(target = %target, "Auto-start target reached");
        Some(SchedulerAction::Commence { target })
    }

    /// Target that has already fired, if any
    pub fn fired_for(&self) -> Option<DateTime<Local>> {
        self.fired_for
    }
}

/// Commands the timing watch wants submitted at `now`.
///
/// While a session is live in examinations mode:
/// - a running exam with no interruption whose writing time has run out
///   is finished
/// - a rest break or reader/writer session whose budget is used up is ended
pub fn due_commands(state: &SessionState, now: DateTime<Local>) -> Vec<Command> {
    if !state.is_live || !state.is_examinations() {
        return Vec::new();
    }

    let mut current = state.clone();
    recalculate_end_times(&mut current, now);

    let mut commands = Vec::new();
    for exam in current.exams.iter().filter(|e| !e.status.is_terminal()) {
        let exam_id = exam.id.clone();
        match exam.interruption {
            Interruption::None => {
                if !state.is_paused() && exam.write_end_time.is_some_and(|end| end <= now) {
                    commands.push(Command::FinishExam { exam_id });
                }
            }
            Interruption::OnRest { .. } => {
                if exam.sp.rest_breaks > 0 && exam.rest_remaining_ms(now) <= 0 {
                    commands.push(Command::ToggleRest { exam_id });
                }
            }
            Interruption::OnReaderWriter { .. } => {
                if exam.sp.reader_writer_time > 0 && exam.reader_writer_remaining_ms(now) <= 0 {
                    commands.push(Command::ToggleReaderWriter { exam_id });
                }
            }
            Interruption::Paused { .. } => {}
        }
    }
    commands
}
