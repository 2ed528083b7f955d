//! The proctoring state machine.
//!
//! Pure: it consumes one [`SessionEvent`] at a time and returns the [`Effect`]s the
//! runtime must carry out. Network results come back in as events, so every state
//! check for a late completion happens here, on the single event loop.

use crate::core::time::{format_offset, now_utc, seconds_since};
use crate::proctor::answers::AnswerOption;
use crate::proctor::presenter::{QuestionView, SessionOutcome, ShellNotice};
use crate::proctor::session::{NavTarget, TestSession};
use crate::proctor::submission::{SubmissionCoordinator, SubmissionState, SubmitTrigger};
use crate::proctor::warnings::{ExitKind, WarningOutcome, WarningState};
use crate::schemas::TestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionPhase {
    Running,
    /// Paused behind the warning notice until focus returns.
    Warned,
    LockedOut,
    /// The teacher ended the test; final submission is under way or done.
    EndedExternally,
    /// The student finished; final submission is under way or done.
    Finishing,
}

impl SessionPhase {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Running => "running",
            SessionPhase::Warned => "warned",
            SessionPhase::LockedOut => "locked_out",
            SessionPhase::EndedExternally => "ended_externally",
            SessionPhase::Finishing => "finishing",
        }
    }
}

/// Input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiEvent {
    FocusLost,
    FocusGained,
    CloseRequested,
    Minimized,
    SelectAnswer(AnswerOption),
    Navigate(NavTarget),
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    Ui(UiEvent),
    AutosaveTick,
    PollTick,
    AutosaveCompleted(Result<(), String>),
    StatusFetched(Result<TestStatus, String>),
    SubmissionCompleted(Result<(), String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Render(QuestionView),
    ShowPause(ShellNotice),
    ClearPause,
    ShowBanner(ShellNotice),
    /// Autosave: push this canonical-order snapshot.
    PushAnswers(Vec<String>),
    FetchStatus,
    /// Final submission. The guard is already claimed when this is emitted.
    Submit { trigger: SubmitTrigger, answers: Vec<String> },
    /// Terminal notice; wait for the student before continuing.
    Acknowledge(ShellNotice),
    ReturnToShell(SessionOutcome),
}

#[derive(Debug)]
pub(crate) struct SessionMachine {
    session: TestSession,
    phase: SessionPhase,
    warnings: WarningState,
    submission: SubmissionCoordinator,
    /// A blocking notice is on screen and needs a `ClearPause`.
    pause_shown: bool,
    autosaving: bool,
    polling: bool,
    autosave_in_flight: bool,
    status_in_flight: bool,
}

impl SessionMachine {
    /// Enters `Running`. Only build this once the test is loaded and confirmed active.
    pub(crate) fn new(session: TestSession, max_warnings: u32) -> Self {
        let warnings = WarningState::new(max_warnings);
        let submission = SubmissionCoordinator::new(warnings.max());
        Self {
            session,
            phase: SessionPhase::Running,
            warnings,
            submission,
            pause_shown: false,
            autosaving: true,
            polling: true,
            autosave_in_flight: false,
            status_in_flight: false,
        }
    }

    pub(crate) fn start(&self) -> Vec<Effect> {
        vec![Effect::Render(self.session.view())]
    }

    pub(crate) fn session(&self) -> &TestSession {
        &self.session
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub(crate) fn warning_count(&self) -> u32 {
        self.warnings.count()
    }

    pub(crate) fn is_autosaving(&self) -> bool {
        self.autosaving
    }

    pub(crate) fn is_polling(&self) -> bool {
        self.polling
    }

    pub(crate) fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Ui(ui) => self.on_ui(ui),
            SessionEvent::AutosaveTick => {
                if !self.autosaving {
                    return Vec::new();
                }
                self.try_autosave().into_iter().collect()
            }
            SessionEvent::PollTick => self.on_poll_tick(),
            SessionEvent::AutosaveCompleted(result) => {
                self.on_autosave_completed(result);
                Vec::new()
            }
            SessionEvent::StatusFetched(result) => self.on_status_fetched(result),
            SessionEvent::SubmissionCompleted(result) => self.on_submission_completed(result),
        }
    }

    fn on_ui(&mut self, event: UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::FocusLost => self.on_exit_attempt(ExitKind::FocusLost),
            UiEvent::CloseRequested => self.on_exit_attempt(ExitKind::CloseRequested),
            UiEvent::Minimized => self.on_exit_attempt(ExitKind::Minimized),
            UiEvent::FocusGained => {
                if self.submission.has_begun() || !self.warnings.regain_focus() {
                    return Vec::new();
                }
                if self.phase == SessionPhase::Warned {
                    self.phase = SessionPhase::Running;
                }
                tracing::info!(
                    session_id = %self.session.id(),
                    warning_count = self.warnings.count(),
                    "Test resumed"
                );
                self.pause_shown = false;
                vec![Effect::ClearPause, Effect::Render(self.session.view())]
            }
            UiEvent::SelectAnswer(option) => {
                if !self.accepting_input() {
                    return Vec::new();
                }
                if let Err(err) = self.session.select_answer(option) {
                    tracing::warn!(
                        session_id = %self.session.id(),
                        error = %err,
                        "Answer rejected"
                    );
                    return Vec::new();
                }
                vec![Effect::Render(self.session.view())]
            }
            UiEvent::Navigate(target) => {
                if self.accepting_input() && self.session.navigate(target) {
                    vec![Effect::Render(self.session.view())]
                } else {
                    Vec::new()
                }
            }
            UiEvent::Finish => {
                if !self.accepting_input() {
                    return Vec::new();
                }
                self.phase = SessionPhase::Finishing;
                self.begin_submission(SubmitTrigger::Normal)
            }
        }
    }

    fn accepting_input(&self) -> bool {
        self.phase == SessionPhase::Running && !self.submission.has_begun()
    }

    fn on_exit_attempt(&mut self, kind: ExitKind) -> Vec<Effect> {
        if !matches!(self.phase, SessionPhase::Running | SessionPhase::Warned) {
            return Vec::new();
        }

        match self.warnings.register_exit(kind) {
            WarningOutcome::Ignored => Vec::new(),
            WarningOutcome::Paused { count, max } => {
                self.phase = SessionPhase::Warned;
                tracing::warn!(
                    session_id = %self.session.id(),
                    exit = kind.as_str(),
                    view_position = self.session.current_view(),
                    warning_count = count,
                    max_warnings = max,
                    "Student left the test environment"
                );
                self.pause_shown = true;
                vec![Effect::ShowPause(ShellNotice::warning(
                    "Test Paused",
                    format!(
                        "You have left the fullscreen test environment.\n\
                         You must return to continue.\n\n\
                         Warning: {count} / {max}"
                    ),
                ))]
            }
            WarningOutcome::LockedOut { count } => {
                self.phase = SessionPhase::LockedOut;
                tracing::warn!(
                    session_id = %self.session.id(),
                    exit = kind.as_str(),
                    warning_count = count,
                    "Student locked out"
                );
                self.begin_submission(SubmitTrigger::Lockout)
            }
        }
    }

    fn try_autosave(&mut self) -> Option<Effect> {
        if self.submission.has_begun()
            || self.autosave_in_flight
            || self.session.answers().is_empty()
        {
            return None;
        }
        self.autosave_in_flight = true;
        Some(Effect::PushAnswers(self.session.answer_snapshot()))
    }

    fn on_poll_tick(&mut self) -> Vec<Effect> {
        if !self.polling {
            return Vec::new();
        }
        // Save first so an answer picked just before the end is not lost.
        let mut effects: Vec<Effect> = self.try_autosave().into_iter().collect();
        if !self.status_in_flight {
            self.status_in_flight = true;
            effects.push(Effect::FetchStatus);
        }
        effects
    }

    fn on_autosave_completed(&mut self, result: Result<(), String>) {
        self.autosave_in_flight = false;
        match result {
            Ok(()) => tracing::debug!(
                session_id = %self.session.id(),
                saved_at = %format_offset(now_utc()),
                answered = self.session.answers().answered_count(),
                "Answers auto-saved"
            ),
            Err(err) => tracing::warn!(
                session_id = %self.session.id(),
                error = %err,
                "Failed to auto-save answers"
            ),
        }
    }

    fn on_status_fetched(&mut self, result: Result<TestStatus, String>) -> Vec<Effect> {
        self.status_in_flight = false;
        if !self.polling {
            tracing::debug!(
                session_id = %self.session.id(),
                "Ignoring status result after polling stopped"
            );
            return Vec::new();
        }

        match result {
            Ok(TestStatus::Ended) => {
                tracing::info!(session_id = %self.session.id(), "Test ended by teacher");
                self.phase = SessionPhase::EndedExternally;
                self.begin_submission(SubmitTrigger::TeacherEnded)
            }
            Ok(status) => {
                tracing::trace!(
                    session_id = %self.session.id(),
                    status = status.as_str(),
                    "Test status"
                );
                Vec::new()
            }
            Err(err) => {
                self.polling = false;
                tracing::error!(
                    session_id = %self.session.id(),
                    error = %err,
                    "Polling error; status polling stopped"
                );
                vec![Effect::ShowBanner(ShellNotice::warning(
                    "Connection Problem",
                    format!(
                        "Lost contact with the server: {err}\n\
                         The test will not end automatically. Your answers are still being saved."
                    ),
                ))]
            }
        }
    }

    fn begin_submission(&mut self, trigger: SubmitTrigger) -> Vec<Effect> {
        if !self.submission.begin(trigger) {
            tracing::debug!(
                session_id = %self.session.id(),
                trigger = trigger.as_str(),
                "Submission already in progress; ignoring trigger"
            );
            return Vec::new();
        }

        self.polling = false;
        self.autosaving = false;
        self.warnings.end_pause();

        // Lockout replaces any warning pause with its own notice; other endings lift it.
        let mut effects = Vec::new();
        if trigger == SubmitTrigger::Lockout {
            self.pause_shown = true;
            effects.push(Effect::ShowPause(self.submission.lockout_notice()));
        } else if std::mem::take(&mut self.pause_shown) {
            effects.push(Effect::ClearPause);
        }

        let answers = self.session.answer_snapshot();
        tracing::info!(
            session_id = %self.session.id(),
            trigger = trigger.as_str(),
            answered = self.session.answers().answered_count(),
            total = answers.len(),
            elapsed_seconds = seconds_since(self.session.started_at()),
            "Submitting answers"
        );
        effects.push(Effect::Submit { trigger, answers });
        effects
    }

    fn on_submission_completed(&mut self, result: Result<(), String>) -> Vec<Effect> {
        let Some(completion) = self.submission.complete(result) else {
            return Vec::new();
        };

        match &completion.outcome {
            SessionOutcome::SubmissionFailed { trigger, message } => tracing::error!(
                session_id = %self.session.id(),
                trigger = trigger.as_str(),
                error = %message,
                "Final submission failed"
            ),
            _ => tracing::info!(
                session_id = %self.session.id(),
                phase = self.phase.as_str(),
                "Answers submitted"
            ),
        }

        let mut effects = Vec::new();
        if std::mem::take(&mut self.pause_shown) {
            effects.push(Effect::ClearPause);
        }
        effects.push(Effect::Acknowledge(completion.notice));
        effects.push(Effect::ReturnToShell(completion.outcome));
        effects
    }
}
