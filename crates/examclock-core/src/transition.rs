//! The transition function: one command applied to one state

use chrono::{DateTime, Local};
use examclock_api::{
    Command, Exam, ExamStatus, GRID_LAYOUT_MAX, GRID_LAYOUT_MIN, Interruption, LogEntry, Page,
    SessionFile, SessionMode, SessionState, SettingsPatch, SpecialProvisions,
};
use examclock_config::SessionDefaults;
use examclock_store::SessionReport;
use examclock_util::{ExamId, elapsed_since};

use crate::events::CoreEvent;
use crate::recalc::recalculate_end_times;

/// Inputs to a transition besides the state and the command
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// The single clock read used for the whole transition
    pub now: DateTime<Local>,
    /// Factory settings and presets used by reset and preset commands
    pub defaults: &'a SessionDefaults,
}

impl<'a> TransitionContext<'a> {
    pub fn new(now: DateTime<Local>, defaults: &'a SessionDefaults) -> Self {
        Self { now, defaults }
    }
}

/// Result of applying one command
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub events: Vec<CoreEvent>,
    /// False when the command's preconditions did not hold
    pub changed: bool,
}

/// Apply `command` to `state`.
///
/// Commands whose preconditions do not hold leave the state untouched and
/// report `changed == false`. This function never fails.
pub fn reduce(state: SessionState, command: Command, ctx: &TransitionContext<'_>) -> Transition {
    let before = state.clone();
    let mut reducer = Reducer {
        state,
        events: Vec::new(),
        ctx,
    };
    reducer.apply(command);

    let changed = reducer.state != before;
    Transition {
        state: reducer.state,
        events: reducer.events,
        changed,
    }
}

struct Reducer<'c> {
    state: SessionState,
    events: Vec<CoreEvent>,
    ctx: &'c TransitionContext<'c>,
}

impl Reducer<'_> {
    fn apply(&mut self, command: Command) {
        match command {
            Command::BeginLiveSession => self.begin_live_session(),
            Command::EndSession { should_reset } => self.end_session(should_reset),
            Command::Pause {
                exam_id: Some(id),
                justification,
            } => self.pause_exam(&id, &justification),
            Command::Pause {
                exam_id: None,
                justification,
            } => self.pause_session(&justification),
            Command::Resume { exam_id: Some(id) } => self.resume_exam(&id),
            Command::Resume { exam_id: None } => self.resume_session(),
            Command::ToggleRest { exam_id } => self.toggle_rest(&exam_id),
            Command::ToggleReaderWriter { exam_id } => self.toggle_reader_writer(&exam_id),
            Command::AbandonExam {
                exam_id,
                justification,
            } => self.abandon_exam(&exam_id, &justification),
            Command::FinishExam { exam_id } => self.finish_exam(&exam_id),
            Command::SetAutoStart { target } => self.set_auto_start(target),
            Command::CancelAutoStart => self.cancel_auto_start(),
            Command::AddExam { exam } => self.add_exams(vec![exam], false),
            Command::AddExams { exams } => self.add_exams(exams, true),
            Command::UpdateExam { exam } => self.update_exam(exam),
            Command::DeleteExam { exam_id } => self.delete_exam(&exam_id),
            Command::ReorderExams {
                old_index,
                new_index,
            } => self.reorder_exams(old_index, new_index),
            Command::UpdateSettings { patch } => self.update_settings(&patch),
            Command::ApplySessionPreset { title, clear_exams } => {
                self.apply_session_preset(&title, clear_exams)
            }
            Command::SetSessionMode { mode } => self.set_session_mode(mode),
            Command::ImportSession { file } => self.import_session(file),
            Command::ClearAllExams => {
                if !self.state.is_live {
                    self.state.exams.clear();
                }
            }
            Command::ResetAll => {
                if !self.state.is_live {
                    self.reset_keeping_ui();
                }
            }
            Command::PreviewExams => {
                if !self.state.is_live {
                    self.state.current_page = Page::Exam;
                }
            }
            Command::SetCurrentPage { page } => self.state.current_page = page,
            Command::SetTheme { theme } => self.state.ui.theme = theme,
            Command::ToggleTooltips => self.state.ui.show_tooltips = !self.state.ui.show_tooltips,
        }
    }

    fn now(&self) -> DateTime<Local> {
        self.ctx.now
    }

    /// Session log only records what happens while live
    fn log(&mut self, message: String) {
        if self.state.is_live {
            self.state.session_log.push(LogEntry {
                at: self.ctx.now,
                message,
            });
        }
    }

    fn recalculate(&mut self) {
        if self.state.is_live && self.state.is_examinations() {
            recalculate_end_times(&mut self.state, self.ctx.now);
        }
    }

    /// Running exam eligible for an interruption command while live
    fn live_exam(&mut self, id: &ExamId) -> Option<&mut Exam> {
        if !self.state.is_live {
            return None;
        }
        self.state
            .exam_mut(id)
            .filter(|exam| !exam.status.is_terminal())
    }

    fn begin_live_session(&mut self) {
        if self.state.is_live {
            return;
        }
        let now = self.now();

        self.state.is_live = true;
        self.state.pause_start_time = None;
        self.state.pause_duration_total = Default::default();
        self.state.current_page = Page::Exam;
        self.state.session_log.clear();
        self.log("Session commenced.".into());

        if self.state.is_examinations() {
            self.state.auto_start_target_time = None;
            for exam in &mut self.state.exams {
                exam.start_time = Some(now);
            }
            self.recalculate();
        }

        self.events.push(CoreEvent::SessionCommenced {
            started_at: now,
            exam_count: self.state.exams.len(),
        });
    }

    fn end_session(&mut self, should_reset: bool) {
        if self.state.is_live {
            self.log("Session ended by user.".into());
            self.events.push(CoreEvent::SessionEnded {
                report: SessionReport::build(&self.state, self.now()),
            });
        }

        self.state.current_page = Page::Setup;
        self.state.is_live = false;
        self.state.pause_start_time = None;
        self.state.pause_duration_total = Default::default();
        self.state.auto_start_target_time = None;
        self.state.session_log.clear();

        for exam in &mut self.state.exams {
            exam.status = ExamStatus::Running;
            exam.interruption = Interruption::None;
            exam.pause_duration_total = Default::default();
            exam.sp.rest_taken = Default::default();
            exam.sp.reader_writer_taken = Default::default();
        }

        if should_reset {
            self.reset_keeping_ui();
        }
    }

    fn pause_exam(&mut self, id: &ExamId, justification: &str) {
        let now = self.now();
        let Some(exam) = self.live_exam(id).filter(|e| !e.is_interrupted()) else {
            return;
        };
        exam.interruption = Interruption::Paused { since: now };
        let message = format!("Exam \"{}\" paused. Justification: {}", exam.name, justification);

        self.log(message);
        self.recalculate();
    }

    fn pause_session(&mut self, justification: &str) {
        if !self.state.is_live || self.state.is_paused() {
            return;
        }
        self.state.pause_start_time = Some(self.now());
        self.log(format!("Session paused. Justification: {}", justification));
        self.recalculate();
    }

    fn resume_exam(&mut self, id: &ExamId) {
        let now = self.now();
        let Some(exam) = self.live_exam(id) else {
            return;
        };
        let Some(since) = exam.pause_start_time() else {
            return;
        };
        exam.pause_duration_total += elapsed_since(since, now);
        exam.interruption = Interruption::None;
        let message = format!("Exam \"{}\" resumed.", exam.name);

        self.log(message);
        self.recalculate();
    }

    fn resume_session(&mut self) {
        let Some(since) = self.state.pause_start_time.take() else {
            return;
        };
        self.state.pause_duration_total += elapsed_since(since, self.now());
        self.log("Session resumed.".into());
        self.recalculate();
    }

    fn toggle_rest(&mut self, id: &ExamId) {
        let now = self.now();
        let Some(exam) = self.live_exam(id) else {
            return;
        };

        let message = match exam.interruption {
            Interruption::OnRest { since } => {
                exam.sp.rest_taken += elapsed_since(since, now);
                exam.interruption = Interruption::None;
                format!("Rest break ended for \"{}\".", exam.name)
            }
            Interruption::None if exam.rest_remaining_ms(now) > 0 => {
                exam.interruption = Interruption::OnRest { since: now };
                format!("Rest break started for \"{}\".", exam.name)
            }
            _ => return,
        };

        self.log(message);
        self.recalculate();
    }

    fn toggle_reader_writer(&mut self, id: &ExamId) {
        let now = self.now();
        let Some(exam) = self.live_exam(id) else {
            return;
        };

        let message = match exam.interruption {
            Interruption::OnReaderWriter { since } => {
                exam.sp.reader_writer_taken += elapsed_since(since, now);
                exam.interruption = Interruption::None;
                format!("Reader/Writer session ended for \"{}\".", exam.name)
            }
            Interruption::None if exam.reader_writer_remaining_ms(now) > 0 => {
                exam.interruption = Interruption::OnReaderWriter { since: now };
                format!("Reader/Writer session started for \"{}\".", exam.name)
            }
            _ => return,
        };

        self.log(message);
        self.recalculate();
    }

    fn abandon_exam(&mut self, id: &ExamId, justification: &str) {
        let now = self.now();
        let Some(exam) = self.live_exam(id) else {
            return;
        };
        settle_interruption(exam, now);
        exam.status = ExamStatus::Abandoned;
        let message = format!(
            "Exam \"{}\" abandoned. Justification: {}",
            exam.name, justification
        );

        self.log(message);
        self.recalculate();
    }

    fn finish_exam(&mut self, id: &ExamId) {
        let now = self.now();
        let Some(exam) = self.live_exam(id) else {
            return;
        };
        settle_interruption(exam, now);
        exam.status = ExamStatus::Finished;
        let (exam_id, name) = (exam.id.clone(), exam.name.clone());

        self.log(format!("Exam \"{}\" finished automatically.", name));
        self.events.push(CoreEvent::ExamFinished { exam_id, name });
    }

    fn set_auto_start(&mut self, target: DateTime<Local>) {
        if self.state.is_live || self.state.auto_start_target_time == Some(target) {
            return;
        }
        self.state.auto_start_target_time = Some(target);
        self.events.push(CoreEvent::AutoStartArmed { target });
    }

    fn cancel_auto_start(&mut self) {
        if self.state.auto_start_target_time.take().is_some() {
            self.events.push(CoreEvent::AutoStartCancelled);
        }
    }

    /// Append exams. With `skip_known_names`, exams whose name is already in
    /// the list (or earlier in the batch) are dropped. Duplicate ids always are.
    fn add_exams(&mut self, exams: Vec<Exam>, skip_known_names: bool) {
        for exam in exams {
            let mut exam = fresh_exam(exam);
            if exam.id.is_empty() {
                exam.id = ExamId::generate();
            }
            let duplicate = self.state.exams.iter().any(|existing| {
                existing.id == exam.id || (skip_known_names && existing.name == exam.name)
            });
            if !duplicate {
                self.state.exams.push(exam);
            }
        }
        self.recalculate();
    }

    /// Edit an exam's configuration. Status, interruption, usage totals and
    /// derived times stay with the existing record.
    fn update_exam(&mut self, exam: Exam) {
        let Some(slot) = self.state.exam_mut(&exam.id) else {
            return;
        };
        slot.name = exam.name;
        slot.read_mins = exam.read_mins;
        slot.write_hrs = exam.write_hrs;
        slot.write_mins = exam.write_mins;
        slot.optional_info = exam.optional_info;
        slot.has_access_code = exam.has_access_code;
        slot.access_code = exam.access_code;
        slot.sp.student_name = exam.sp.student_name;
        slot.sp.show_student_name = exam.sp.show_student_name;
        slot.sp.extra_time = exam.sp.extra_time;
        slot.sp.rest_breaks = exam.sp.rest_breaks;
        slot.sp.reader_writer_time = exam.sp.reader_writer_time;
        self.recalculate();
    }

    fn delete_exam(&mut self, id: &ExamId) {
        let before = self.state.exams.len();
        self.state.exams.retain(|exam| &exam.id != id);
        if self.state.exams.len() != before {
            self.recalculate();
        }
    }

    fn reorder_exams(&mut self, old_index: usize, new_index: usize) {
        let len = self.state.exams.len();
        if old_index >= len || new_index >= len {
            return;
        }
        let exam = self.state.exams.remove(old_index);
        self.state.exams.insert(new_index, exam);
        self.recalculate();
    }

    fn update_settings(&mut self, patch: &SettingsPatch) {
        let settings = &mut self.state.settings;
        patch.apply_to(settings);

        if self.state.session_mode == SessionMode::Examinations
            && patch.special_provisions == Some(true)
        {
            settings.grid_layout = GRID_LAYOUT_MIN;
        }
        settings.grid_layout = settings.grid_layout.clamp(GRID_LAYOUT_MIN, GRID_LAYOUT_MAX);
    }

    fn apply_session_preset(&mut self, title: &str, clear_exams: bool) {
        if self.state.is_live {
            return;
        }
        let defaults = self.ctx.defaults;

        if let Some(mode) = defaults.mode_for(title) {
            self.state.session_mode = mode;
        }
        self.state.settings = defaults.settings_for(title);
        if clear_exams {
            self.state.exams.clear();
        }
    }

    fn set_session_mode(&mut self, mode: SessionMode) {
        if self.state.is_live || self.state.session_mode == mode {
            return;
        }
        let defaults = self.ctx.defaults;

        self.state.session_mode = mode;
        self.state.settings = match defaults.first_preset_title(mode) {
            Some(title) => defaults.settings_for(title),
            None => defaults.settings.clone(),
        };
        self.state.exams.clear();
    }

    fn import_session(&mut self, file: SessionFile) {
        if self.state.is_live {
            return;
        }
        let mut settings = file.settings;
        settings.grid_layout = settings.grid_layout.clamp(GRID_LAYOUT_MIN, GRID_LAYOUT_MAX);

        self.state.settings = settings;
        self.state.exams = file.exams.into_iter().map(fresh_exam).collect();
        self.state.session_mode = file.session_mode;
        self.state.current_page = Page::Setup;
        self.state.pause_start_time = None;
        self.state.pause_duration_total = Default::default();
        self.state.auto_start_target_time = None;
        self.state.session_log.clear();
    }

    fn reset_keeping_ui(&mut self) {
        let ui = self.state.ui.clone();
        self.state = SessionState::with_settings(self.ctx.defaults.settings.clone());
        self.state.ui = ui;
    }
}

/// An incoming exam keeps its configuration and starts with no runtime state
fn fresh_exam(exam: Exam) -> Exam {
    Exam {
        status: ExamStatus::Running,
        interruption: Interruption::None,
        pause_duration_total: Default::default(),
        start_time: None,
        read_end_time: None,
        write_end_time: None,
        sp: SpecialProvisions {
            rest_taken: Default::default(),
            reader_writer_taken: Default::default(),
            ..exam.sp
        },
        ..exam
    }
}

/// Fold an in-progress interruption into the exam's totals and clear it
fn settle_interruption(exam: &mut Exam, now: DateTime<Local>) {
    match exam.interruption {
        Interruption::None => return,
        Interruption::Paused { since } => exam.pause_duration_total += elapsed_since(since, now),
        Interruption::OnRest { since } => exam.sp.rest_taken += elapsed_since(since, now),
        Interruption::OnReaderWriter { since } => {
            exam.sp.reader_writer_taken += elapsed_since(since, now)
        }
    }
    exam.interruption = Interruption::None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use examclock_api::{Settings, Theme};
    use std::time::Duration;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 12, h, m, 0).unwrap()
    }

    fn mins(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn step(state: SessionState, command: Command, now: DateTime<Local>) -> Transition {
        let defaults = SessionDefaults::default();
        reduce(state, command, &TransitionContext::new(now, &defaults))
    }

    fn run(state: SessionState, command: Command, now: DateTime<Local>) -> SessionState {
        step(state, command, now).state
    }

    fn setup(exams: Vec<Exam>) -> SessionState {
        let mut state = SessionState::default();
        state.exams = exams;
        state
    }

    fn chemistry() -> Exam {
        Exam::new("12 Chemistry", 10, 1, 0).with_id("chem")
    }

    fn physics() -> Exam {
        Exam::new("12 Physics", 10, 1, 0).with_id("phys")
    }

    fn live(exams: Vec<Exam>, start: DateTime<Local>) -> SessionState {
        run(setup(exams), Command::BeginLiveSession, start)
    }

    fn id(s: &str) -> ExamId {
        ExamId::new(s)
    }

    fn pause(exam: Option<&str>) -> Command {
        Command::Pause {
            exam_id: exam.map(id),
            justification: "Fire alarm".into(),
        }
    }

    fn resume(exam: Option<&str>) -> Command {
        Command::Resume {
            exam_id: exam.map(id),
        }
    }

    #[test]
    fn begin_stamps_every_exam_and_logs() {
        let result = step(setup(vec![chemistry(), physics()]), Command::BeginLiveSession, at(9, 0));
        let state = result.state;

        assert!(result.changed);
        assert!(state.is_live);
        assert_eq!(state.current_page, Page::Exam);
        for exam in &state.exams {
            assert_eq!(exam.start_time, Some(at(9, 0)));
            assert_eq!(exam.read_end_time, Some(at(9, 10)));
            assert_eq!(exam.write_end_time, Some(at(10, 10)));
        }
        assert_eq!(state.session_log.len(), 1);
        assert_eq!(state.session_log[0].message, "Session commenced.");
        assert_eq!(
            result.events,
            vec![CoreEvent::SessionCommenced {
                started_at: at(9, 0),
                exam_count: 2
            }]
        );
    }

    #[test]
    fn begin_clears_auto_start_in_examinations_mode() {
        let mut state = setup(vec![chemistry()]);
        state.auto_start_target_time = Some(at(9, 0));

        let state = run(state, Command::BeginLiveSession, at(9, 0));
        assert_eq!(state.auto_start_target_time, None);
    }

    #[test]
    fn begin_in_standardised_mode_leaves_times_alone() {
        let mut state = setup(vec![Exam::new("Year 9 Numeracy", 0, 0, 65)]);
        state.session_mode = SessionMode::Standardised;

        let state = run(state, Command::BeginLiveSession, at(9, 0));
        assert!(state.is_live);
        assert_eq!(state.exams[0].start_time, None);
        assert_eq!(state.exams[0].write_end_time, None);
    }

    #[test]
    fn begin_twice_is_a_no_op() {
        let state = live(vec![chemistry()], at(9, 0));
        let result = step(state.clone(), Command::BeginLiveSession, at(9, 5));

        assert!(!result.changed);
        assert!(result.events.is_empty());
        assert_eq!(result.state, state);
    }

    #[test]
    fn exam_pause_and_resume_shift_end_times() {
        let state = live(vec![chemistry()], at(9, 0));
        let state = run(state, pause(Some("chem")), at(9, 2));
        assert!(state.exams[0].is_paused());

        let state = run(state, resume(Some("chem")), at(9, 7));
        let exam = &state.exams[0];
        assert!(!exam.is_interrupted());
        assert_eq!(exam.pause_duration_total, mins(5));
        assert_eq!(exam.read_end_time, Some(at(9, 15)));
        assert_eq!(exam.write_end_time, Some(at(10, 15)));

        let messages: Vec<_> = state.session_log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Session commenced.",
                "Exam \"12 Chemistry\" paused. Justification: Fire alarm",
                "Exam \"12 Chemistry\" resumed.",
            ]
        );
    }

    #[test]
    fn resume_on_running_exam_is_a_no_op() {
        let state = live(vec![chemistry()], at(9, 0));
        let result = step(state.clone(), resume(Some("chem")), at(9, 5));

        assert!(!result.changed);
        assert_eq!(result.state, state);
    }

    #[test]
    fn pause_requires_live_session() {
        let state = setup(vec![chemistry()]);
        assert!(!step(state.clone(), pause(Some("chem")), at(9, 0)).changed);
        assert!(!step(state, pause(None), at(9, 0)).changed);
    }

    #[test]
    fn pause_unknown_exam_is_a_no_op() {
        let state = live(vec![chemistry()], at(9, 0));
        assert!(!step(state, pause(Some("missing")), at(9, 1)).changed);
    }

    #[test]
    fn global_pause_shifts_only_running_exams() {
        let state = live(vec![chemistry(), physics()], at(9, 0));
        let state = run(
            state,
            Command::AbandonExam {
                exam_id: id("phys"),
                justification: "Candidate unwell".into(),
            },
            at(9, 3),
        );
        let abandoned = state.exams[1].clone();

        let state = run(state, pause(None), at(9, 5));
        assert!(state.is_paused());
        let state = run(state, resume(None), at(9, 8));

        assert!(!state.is_paused());
        assert_eq!(state.pause_duration_total, mins(3));
        assert_eq!(state.exams[0].read_end_time, Some(at(9, 13)));
        assert_eq!(state.exams[0].write_end_time, Some(at(10, 13)));
        assert_eq!(state.exams[1], abandoned);
        assert_eq!(state.exams[1].write_end_time, Some(at(10, 10)));
    }

    #[test]
    fn global_pause_twice_keeps_first_start() {
        let state = live(vec![chemistry()], at(9, 0));
        let state = run(state, pause(None), at(9, 5));
        let result = step(state, pause(None), at(9, 6));

        assert!(!result.changed);
        assert_eq!(result.state.pause_start_time, Some(at(9, 5)));
    }

    #[test]
    fn global_and_exam_pause_overlap_additively() {
        let state = live(vec![chemistry()], at(9, 0));
        let state = run(state, pause(None), at(9, 1));
        let state = run(state, pause(Some("chem")), at(9, 2));
        let state = run(state, resume(None), at(9, 4));
        let state = run(state, resume(Some("chem")), at(9, 6));

        assert_eq!(state.pause_duration_total, mins(3));
        assert_eq!(state.exams[0].pause_duration_total, mins(4));
        assert_eq!(state.exams[0].read_end_time, Some(at(9, 17)));
    }

    #[test]
    fn rest_break_accumulates_taken_time() {
        let mut exam = chemistry();
        exam.sp.rest_breaks = 10;
        let state = live(vec![exam], at(9, 0));

        let state = run(state, Command::ToggleRest { exam_id: id("chem") }, at(9, 20));
        assert!(state.exams[0].on_rest());
        let state = run(state, Command::ToggleRest { exam_id: id("chem") }, at(9, 24));

        let exam = &state.exams[0];
        assert!(!exam.on_rest());
        assert_eq!(exam.sp.rest_taken, mins(4));
        assert_eq!(exam.write_end_time, Some(at(10, 14)));
        assert!(state.session_log.iter().any(|e| e.message == "Rest break ended for \"12 Chemistry\"."));
    }

    #[test]
    fn rest_refused_while_otherwise_interrupted() {
        let mut exam = chemistry();
        exam.sp.rest_breaks = 10;
        exam.sp.reader_writer_time = 10;
        let state = live(vec![exam], at(9, 0));
        let state = run(state, Command::ToggleReaderWriter { exam_id: id("chem") }, at(9, 5));
        assert!(state.exams[0].on_reader_writer());

        let result = step(state.clone(), Command::ToggleRest { exam_id: id("chem") }, at(9, 6));
        assert!(!result.changed);

        let paused = run(state, Command::ToggleReaderWriter { exam_id: id("chem") }, at(9, 7));
        let paused = run(paused, pause(Some("chem")), at(9, 8));
        assert!(!step(paused, Command::ToggleReaderWriter { exam_id: id("chem") }, at(9, 9)).changed);
    }

    #[test]
    fn rest_refused_without_budget() {
        let state = live(vec![chemistry()], at(9, 0));
        assert!(!step(state, Command::ToggleRest { exam_id: id("chem") }, at(9, 5)).changed);

        let mut used = chemistry();
        used.sp.rest_breaks = 5;
        used.sp.rest_taken = mins(5);
        let state = live(vec![used], at(9, 0));
        assert!(!step(state, Command::ToggleRest { exam_id: id("chem") }, at(9, 5)).changed);
    }

    #[test]
    fn reader_writer_accumulates_taken_time() {
        let mut exam = chemistry();
        exam.sp.reader_writer_time = 30;
        let state = live(vec![exam], at(9, 0));

        let state = run(state, Command::ToggleReaderWriter { exam_id: id("chem") }, at(9, 15));
        let state = run(state, Command::ToggleReaderWriter { exam_id: id("chem") }, at(9, 27));

        assert_eq!(state.exams[0].sp.reader_writer_taken, mins(12));
        assert_eq!(state.exams[0].write_end_time, Some(at(10, 22)));
        let last = state.session_log.last().unwrap();
        assert_eq!(last.message, "Reader/Writer session ended for \"12 Chemistry\".");
    }

    #[test]
    fn abandoned_exam_is_frozen() {
        let state = live(vec![chemistry()], at(9, 0));
        let abandon = Command::AbandonExam {
            exam_id: id("chem"),
            justification: "Candidate left".into(),
        };
        let state = run(state, abandon.clone(), at(9, 3));
        assert_eq!(state.exams[0].status, ExamStatus::Abandoned);
        assert_eq!(
            state.session_log.last().unwrap().message,
            "Exam \"12 Chemistry\" abandoned. Justification: Candidate left"
        );

        for command in [
            abandon,
            Command::FinishExam { exam_id: id("chem") },
            pause(Some("chem")),
            Command::ToggleRest { exam_id: id("chem") },
        ] {
            assert!(!step(state.clone(), command, at(9, 5)).changed);
        }
    }

    #[test]
    fn abandoning_a_paused_exam_settles_the_pause() {
        let state = live(vec![chemistry()], at(9, 0));
        let state = run(state, pause(Some("chem")), at(9, 1));
        let state = run(
            state,
            Command::AbandonExam {
                exam_id: id("chem"),
                justification: "Candidate left".into(),
            },
            at(9, 4),
        );

        let exam = &state.exams[0];
        assert!(!exam.is_interrupted());
        assert_eq!(exam.pause_duration_total, mins(3));
    }

    #[test]
    fn abandon_and_finish_require_live_session() {
        let state = setup(vec![chemistry()]);
        let abandon = Command::AbandonExam {
            exam_id: id("chem"),
            justification: "Candidate absent".into(),
        };
        assert!(!step(state.clone(), abandon, at(8, 55)).changed);
        assert!(!step(state.clone(), Command::FinishExam { exam_id: id("chem") }, at(8, 55)).changed);

        let state = run(state, Command::BeginLiveSession, at(9, 0));
        assert_eq!(state.exams[0].status, ExamStatus::Running);
        assert_eq!(state.exams[0].write_end_time, Some(at(10, 10)));
    }

    #[test]
    fn repeated_interruptions_accumulate() {
        let mut exam = chemistry();
        exam.sp.rest_breaks = 20;
        exam.sp.reader_writer_time = 10;
        let mut state = live(vec![exam], at(9, 0));

        let rest = || Command::ToggleRest { exam_id: id("chem") };
        let reader_writer = || Command::ToggleReaderWriter { exam_id: id("chem") };
        let steps = [
            (pause(Some("chem")), at(9, 5)),
            (resume(Some("chem")), at(9, 6)),
            (pause(Some("chem")), at(9, 10)),
            (resume(Some("chem")), at(9, 13)),
            (pause(Some("chem")), at(9, 20)),
            (resume(Some("chem")), at(9, 27)),
            (rest(), at(9, 30)),
            (rest(), at(9, 32)),
            (rest(), at(9, 40)),
            (rest(), at(9, 45)),
            (reader_writer(), at(9, 50)),
            (reader_writer(), at(9, 51)),
            (reader_writer(), at(9, 55)),
            (reader_writer(), at(9, 58)),
        ];

        let mut last_end = state.exams[0].write_end_time;
        for (command, now) in steps {
            let result = step(state, command, now);
            assert!(result.changed);
            state = result.state;

            let end = state.exams[0].write_end_time;
            assert!(end >= last_end, "write end moved back at {}", now);
            last_end = end;
        }

        let exam = &state.exams[0];
        assert!(!exam.is_interrupted());
        assert_eq!(exam.pause_duration_total, mins(1 + 3 + 7));
        assert_eq!(exam.sp.rest_taken, mins(2 + 5));
        assert_eq!(exam.sp.reader_writer_taken, mins(1 + 3));
        assert_eq!(exam.start_time, Some(at(9, 0)));
        assert_eq!(exam.read_end_time, Some(at(9, 32)));
        assert_eq!(exam.write_end_time, Some(at(10, 32)));
    }

    #[test]
    fn finish_emits_event_once() {
        let state = live(vec![chemistry()], at(9, 0));
        let result = step(state, Command::FinishExam { exam_id: id("chem") }, at(10, 10));

        assert_eq!(result.state.exams[0].status, ExamStatus::Finished);
        assert_eq!(
            result.events,
            vec![CoreEvent::ExamFinished {
                exam_id: id("chem"),
                name: "12 Chemistry".into()
            }]
        );
        assert_eq!(
            result.state.session_log.last().unwrap().message,
            "Exam \"12 Chemistry\" finished automatically."
        );

        let again = step(result.state, Command::FinishExam { exam_id: id("chem") }, at(10, 11));
        assert!(!again.changed);
        assert!(again.events.is_empty());
    }

    #[test]
    fn end_session_reports_and_resets_runtime_state() {
        let mut exam = chemistry();
        exam.sp.rest_breaks = 10;
        exam.sp.extra_time = 15;
        let state = live(vec![exam, physics()], at(9, 0));
        let state = run(state, Command::ToggleRest { exam_id: id("chem") }, at(9, 10));
        let state = run(state, pause(Some("phys")), at(9, 11));
        let state = run(state, pause(None), at(9, 12));

        let result = step(state, Command::EndSession { should_reset: false }, at(9, 30));
        let state = result.state;

        let [CoreEvent::SessionEnded { report }] = result.events.as_slice() else {
            panic!("expected a single SessionEnded event, got {:?}", result.events);
        };
        assert_eq!(report.ended_at, at(9, 30));
        assert_eq!(report.log.last().unwrap().message, "Session ended by user.");

        assert!(!state.is_live);
        assert!(!state.is_paused());
        assert_eq!(state.current_page, Page::Setup);
        assert!(state.session_log.is_empty());
        for exam in &state.exams {
            assert_eq!(exam.status, ExamStatus::Running);
            assert!(!exam.is_interrupted());
            assert_eq!(exam.sp.rest_taken, Duration::ZERO);
            assert_eq!(exam.pause_duration_total, Duration::ZERO);
        }
        assert_eq!(state.exams[0].sp.rest_breaks, 10);
        assert_eq!(state.exams[0].sp.extra_time, 15);
    }

    #[test]
    fn end_session_when_not_live_emits_nothing() {
        let result = step(setup(vec![chemistry()]), Command::EndSession { should_reset: false }, at(9, 0));
        assert!(result.events.is_empty());
    }

    #[test]
    fn end_session_with_reset_keeps_ui_prefs() {
        let mut state = live(vec![chemistry()], at(9, 0));
        state.settings.school_name = "Armidale High School".into();
        state.ui.theme = Theme::Dark;
        state.ui.show_tooltips = false;

        let state = run(state, Command::EndSession { should_reset: true }, at(9, 30));

        assert!(state.exams.is_empty());
        assert_eq!(state.settings, Settings::default());
        assert_eq!(state.ui.theme, Theme::Dark);
        assert!(!state.ui.show_tooltips);
    }

    #[test]
    fn auto_start_arm_and_cancel() {
        let state = setup(vec![chemistry()]);
        let armed = step(state, Command::SetAutoStart { target: at(9, 0) }, at(8, 30));
        assert_eq!(armed.state.auto_start_target_time, Some(at(9, 0)));
        assert_eq!(armed.events, vec![CoreEvent::AutoStartArmed { target: at(9, 0) }]);

        let cancelled = step(armed.state, Command::CancelAutoStart, at(8, 31));
        assert_eq!(cancelled.state.auto_start_target_time, None);
        assert_eq!(cancelled.events, vec![CoreEvent::AutoStartCancelled]);

        assert!(!step(cancelled.state, Command::CancelAutoStart, at(8, 32)).changed);
    }

    #[test]
    fn add_exams_skips_known_names() {
        let state = setup(vec![chemistry()]);
        let batch = vec![
            Exam::new("12 Chemistry", 5, 3, 0),
            Exam::new("12 Biology", 5, 3, 0),
            Exam::new("12 Biology", 5, 3, 0),
        ];

        let state = run(state, Command::AddExams { exams: batch }, at(8, 0));
        let names: Vec<_> = state.exams.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["12 Chemistry", "12 Biology"]);
    }

    #[test]
    fn add_exam_generates_missing_id() {
        let state = run(
            setup(vec![]),
            Command::AddExam {
                exam: Exam::new("12 Music 1", 5, 1, 30).with_id(""),
            },
            at(8, 0),
        );
        assert!(!state.exams[0].id.is_empty());
    }

    #[test]
    fn update_exam_while_live_recalculates() {
        let state = live(vec![chemistry()], at(9, 0));
        let mut edited = state.exams[0].clone();
        edited.sp.extra_time = 20;

        let state = run(state, Command::UpdateExam { exam: edited }, at(9, 5));
        assert_eq!(state.exams[0].write_end_time, Some(at(10, 30)));
    }

    #[test]
    fn update_keeps_runtime_state() {
        let state = live(vec![chemistry(), physics()], at(9, 0));
        let state = run(
            state,
            Command::AbandonExam {
                exam_id: id("chem"),
                justification: "Candidate left".into(),
            },
            at(9, 3),
        );
        let abandoned = state.exams[0].clone();

        let mut edited = abandoned.clone();
        edited.name = "12 Chemistry (Room 4)".into();
        edited.status = ExamStatus::Running;
        edited.interruption = Interruption::Paused { since: at(8, 0) };
        edited.sp.rest_taken = mins(30);
        edited.start_time = None;

        let state = run(state, Command::UpdateExam { exam: edited }, at(9, 5));
        let exam = &state.exams[0];
        assert_eq!(exam.name, "12 Chemistry (Room 4)");
        assert_eq!(exam.status, ExamStatus::Abandoned);
        assert_eq!(exam.interruption, Interruption::None);
        assert_eq!(exam.sp.rest_taken, abandoned.sp.rest_taken);
        assert_eq!(exam.start_time, Some(at(9, 0)));
        assert_eq!(exam.write_end_time, abandoned.write_end_time);
    }

    #[test]
    fn update_running_exam_keeps_pause() {
        let state = live(vec![chemistry()], at(9, 0));
        let state = run(state, pause(Some("chem")), at(9, 2));

        let mut edited = chemistry();
        edited.write_mins = 30;
        let state = run(state, Command::UpdateExam { exam: edited }, at(9, 4));

        let exam = &state.exams[0];
        assert_eq!(exam.interruption, Interruption::Paused { since: at(9, 2) });
        assert_eq!(exam.write_end_time, Some(at(10, 42)));
    }

    #[test]
    fn update_unknown_exam_is_a_no_op() {
        let state = setup(vec![chemistry()]);
        assert!(!step(state, Command::UpdateExam { exam: physics() }, at(8, 0)).changed);
    }

    #[test]
    fn delete_and_reorder() {
        let biology = Exam::new("12 Biology", 5, 3, 0).with_id("bio");
        let state = setup(vec![chemistry(), physics(), biology]);

        let state = run(state, Command::ReorderExams { old_index: 2, new_index: 0 }, at(8, 0));
        let ids: Vec<_> = state.exams.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["bio", "chem", "phys"]);

        assert!(!step(state.clone(), Command::ReorderExams { old_index: 0, new_index: 3 }, at(8, 0)).changed);

        let state = run(state, Command::DeleteExam { exam_id: id("chem") }, at(8, 0));
        assert_eq!(state.exams.len(), 2);
        assert!(!step(state, Command::DeleteExam { exam_id: id("chem") }, at(8, 0)).changed);
    }

    #[test]
    fn special_provisions_force_single_column() {
        let state = setup(vec![]);
        let patch = SettingsPatch {
            special_provisions: Some(true),
            ..Default::default()
        };

        let state = run(state, Command::UpdateSettings { patch }, at(8, 0));
        assert!(state.settings.special_provisions);
        assert_eq!(state.settings.grid_layout, 1);
    }

    #[test]
    fn grid_layout_is_clamped() {
        let patch = SettingsPatch {
            grid_layout: Some(9),
            ..Default::default()
        };
        let state = run(setup(vec![]), Command::UpdateSettings { patch }, at(8, 0));
        assert_eq!(state.settings.grid_layout, GRID_LAYOUT_MAX);
    }

    #[test]
    fn standardised_preset_switches_mode() {
        let state = setup(vec![chemistry()]);
        let state = run(
            state,
            Command::ApplySessionPreset {
                title: "NAPLAN".into(),
                clear_exams: true,
            },
            at(8, 0),
        );

        assert_eq!(state.session_mode, SessionMode::Standardised);
        assert_eq!(state.settings.session_title, "NAPLAN");
        assert!(state.exams.is_empty());
    }

    #[test]
    fn unknown_preset_only_sets_title() {
        let state = setup(vec![chemistry()]);
        let state = run(
            state,
            Command::ApplySessionPreset {
                title: "Mock Exams".into(),
                clear_exams: false,
            },
            at(8, 0),
        );

        assert_eq!(state.session_mode, SessionMode::Examinations);
        assert_eq!(state.settings.session_title, "Mock Exams");
        assert_eq!(state.exams.len(), 1);
    }

    #[test]
    fn switching_mode_clears_exams() {
        let state = setup(vec![chemistry()]);
        let state = run(state, Command::SetSessionMode { mode: SessionMode::Standardised }, at(8, 0));

        assert_eq!(state.session_mode, SessionMode::Standardised);
        assert_eq!(state.settings.session_title, "NAPLAN");
        assert!(state.exams.is_empty());

        assert!(!step(state, Command::SetSessionMode { mode: SessionMode::Standardised }, at(8, 0)).changed);
    }

    #[test]
    fn setup_commands_ignored_while_live() {
        let state = live(vec![chemistry()], at(9, 0));
        for command in [
            Command::ClearAllExams,
            Command::ResetAll,
            Command::PreviewExams,
            Command::SetSessionMode {
                mode: SessionMode::Standardised,
            },
            Command::ImportSession {
                file: SessionFile::from_state(&SessionState::default()),
            },
        ] {
            assert!(!step(state.clone(), command, at(9, 1)).changed);
        }
    }

    #[test]
    fn import_replaces_setup() {
        let mut state = setup(vec![chemistry()]);
        state.auto_start_target_time = Some(at(9, 0));
        state.current_page = Page::Exam;

        let mut settings = Settings::default();
        settings.session_title = "Exit Examinations".into();
        let file = SessionFile {
            session_mode: SessionMode::Examinations,
            settings,
            exams: vec![physics()],
        };

        let state = run(state, Command::ImportSession { file }, at(8, 0));
        assert_eq!(state.settings.session_title, "Exit Examinations");
        assert_eq!(state.exams, vec![physics()]);
        assert_eq!(state.current_page, Page::Setup);
        assert_eq!(state.auto_start_target_time, None);
    }

    fn with_runtime_state(exam: Exam) -> Exam {
        let mut exam = exam;
        exam.status = ExamStatus::Abandoned;
        exam.interruption = Interruption::Paused { since: at(8, 0) };
        exam.pause_duration_total = mins(5);
        exam.sp.rest_breaks = 10;
        exam.sp.rest_taken = mins(4);
        exam.sp.reader_writer_taken = mins(2);
        exam.start_time = Some(at(8, 0));
        exam.read_end_time = Some(at(8, 10));
        exam.write_end_time = Some(at(9, 10));
        exam
    }

    fn assert_fresh(exam: &Exam) {
        assert_eq!(exam.status, ExamStatus::Running);
        assert_eq!(exam.interruption, Interruption::None);
        assert_eq!(exam.pause_duration_total, Duration::ZERO);
        assert_eq!(exam.sp.rest_taken, Duration::ZERO);
        assert_eq!(exam.sp.reader_writer_taken, Duration::ZERO);
        assert_eq!(exam.sp.rest_breaks, 10);
        assert_eq!(exam.start_time, None);
        assert_eq!(exam.write_end_time, None);
    }

    #[test]
    fn imported_exams_lose_runtime_state() {
        let file = SessionFile {
            session_mode: SessionMode::Examinations,
            settings: Settings::default(),
            exams: vec![with_runtime_state(chemistry())],
        };

        let state = run(setup(vec![]), Command::ImportSession { file }, at(8, 30));
        assert_fresh(&state.exams[0]);

        let state = run(state, Command::BeginLiveSession, at(9, 0));
        assert_eq!(state.exams[0].status, ExamStatus::Running);
        assert_eq!(state.exams[0].read_end_time, Some(at(9, 10)));
        assert_eq!(state.exams[0].write_end_time, Some(at(10, 10)));
    }

    #[test]
    fn added_exams_lose_runtime_state() {
        let state = run(
            setup(vec![]),
            Command::AddExam {
                exam: with_runtime_state(chemistry()),
            },
            at(8, 30),
        );
        assert_fresh(&state.exams[0]);

        let state = run(
            state,
            Command::AddExams {
                exams: vec![with_runtime_state(physics())],
            },
            at(8, 30),
        );
        assert_fresh(&state.exams[1]);
    }

    #[test]
    fn reset_all_keeps_theme_and_tooltips() {
        let mut state = setup(vec![chemistry()]);
        state.ui.theme = Theme::Light;
        let state = run(state, Command::ToggleTooltips, at(8, 0));
        let state = run(state, Command::ResetAll, at(8, 0));

        assert!(state.exams.is_empty());
        assert_eq!(state.ui.theme, Theme::Light);
        assert!(!state.ui.show_tooltips);
    }

    #[test]
    fn preview_and_page_and_theme() {
        let state = run(setup(vec![chemistry()]), Command::PreviewExams, at(8, 0));
        assert_eq!(state.current_page, Page::Exam);
        assert!(!state.is_live);

        let state = run(state, Command::SetCurrentPage { page: Page::Setup }, at(8, 0));
        assert_eq!(state.current_page, Page::Setup);

        let state = run(state, Command::SetTheme { theme: Theme::Dark }, at(8, 0));
        assert_eq!(state.ui.theme, Theme::Dark);
    }
}
