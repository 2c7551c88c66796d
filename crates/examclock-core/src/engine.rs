//! Session engine: owns the state, applies commands, persists changes

use chrono::{DateTime, Local};
use examclock_api::{Command, SessionState, SessionView};
use examclock_config::SessionDefaults;
use examclock_store::{Store, StoreResult, export_session};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::events::CoreEvent;
use crate::scheduler::due_commands;
use crate::transition::{Transition, TransitionContext, reduce};
use crate::view::project;

/// What applying one command did
#[derive(Debug, Clone, Default)]
pub struct Applied {
    pub changed: bool,
    pub events: Vec<CoreEvent>,
    /// Row id of the archived report, when the command ended a session
    pub archived_report: Option<i64>,
}

/// The session engine
pub struct SessionEngine {
    defaults: SessionDefaults,
    store: Arc<dyn Store>,
    state: SessionState,
}

impl SessionEngine {
    /// Create an engine, restoring the last saved state from `store`.
    ///
    /// An unreadable snapshot is logged and replaced with factory defaults.
    pub fn new(defaults: SessionDefaults, store: Arc<dyn Store>) -> Self {
        let state = match store.load_snapshot() {
            Ok(Some(state)) => {
                info!(
                    is_live = state.is_live,
                    exam_count = state.exams.len(),
                    "Restored session state"
                );
                state
            }
            Ok(None) => SessionState::with_settings(defaults.settings.clone()),
            Err(e) => {
                warn!(error = %e, "Failed to load session snapshot, starting fresh");
                SessionState::with_settings(defaults.settings.clone())
            }
        };

        info!(
            preset_count = defaults.session_presets.len(),
            "Session engine initialized"
        );

        Self {
            defaults,
            store,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Apply one command at `now`.
    ///
    /// When the state changes it is saved; a session that ends has its report
    /// archived. Store failures are logged and never undo the transition.
    pub fn apply(&mut self, command: Command, now: DateTime<Local>) -> Applied {
        let name = command.name();
        let ctx = TransitionContext::new(now, &self.defaults);
        let Transition {
            state,
            events,
            changed,
        } = reduce(self.state.clone(), command, &ctx);

        if !changed {
            debug!(command = name, "Command had no effect");
            return Applied::default();
        }

        self.state = state;
        debug!(command = name, "Command applied");

        if let Err(e) = self.store.save_snapshot(&self.state) {
            warn!(error = %e, "Failed to save session snapshot");
        }

        let mut archived_report = None;
        for event in &events {
            match event {
                CoreEvent::SessionCommenced {
                    started_at,
                    exam_count,
                } => {
                    info!(started_at = %started_at, exam_count, "Session commenced");
                }
                CoreEvent::SessionEnded { report } => {
                    info!(title = %report.title, entries = report.log.len(), "Session ended");
                    match self.store.archive_report(report) {
                        Ok(id) => archived_report = Some(id),
                        Err(e) => warn!(error = %e, "Failed to archive session report"),
                    }
                }
                CoreEvent::ExamFinished { exam_id, name } => {
                    info!(exam_id = %exam_id, name = %name, "Exam finished");
                }
                CoreEvent::AutoStartArmed { target } => {
                    info!(target = %target, "Auto-start armed");
                }
                CoreEvent::AutoStartCancelled => info!("Auto-start cancelled"),
            }
        }

        Applied {
            changed,
            events,
            archived_report,
        }
    }

    /// Apply whatever the timing watch says is due at `now`
    pub fn apply_due(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        for command in due_commands(&self.state, now) {
            events.extend(self.apply(command, now).events);
        }
        events
    }

    /// Projection of the current state at `now`
    pub fn view(&self, now: DateTime<Local>) -> SessionView {
        project(&self.state, now)
    }

    /// Session file for the current setup: `(file name, JSON contents)`
    pub fn export_session(&self, now: DateTime<Local>) -> StoreResult<(String, String)> {
        export_session(&self.state, now)
    }
}
