use std::future::Future;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::Instrument;

use crate::core::config::SessionSettings;
use crate::core::time::format_offset;
use crate::proctor::machine::{Effect, SessionEvent, SessionMachine, UiEvent};
use crate::proctor::order::QuestionOrder;
use crate::proctor::presenter::{SessionHeader, SessionOutcome, SessionPresenter, ShellNotice};
use crate::proctor::session::TestSession;
use crate::proctor::submission::SubmissionState;
use crate::schemas::{QuestionDocument, TestDto, TestRef, TestStatus};
use crate::services::{ApiError, Identity, QuizApi};

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("failed to load test: {0}")]
    Load(#[from] ApiError),
    #[error("test has no questions")]
    NoQuestions,
    #[error("event channel closed before the session ended")]
    EventChannelClosed,
}

/// Runs one proctored attempt: load, the event loop, final submission, hand-back.
pub(crate) struct SessionController {
    api: Arc<dyn QuizApi>,
    presenter: Arc<dyn SessionPresenter>,
    identity: Identity,
    test: TestRef,
    settings: SessionSettings,
    order_seed: Option<u64>,
}

impl SessionController {
    pub(crate) fn new(
        api: Arc<dyn QuizApi>,
        presenter: Arc<dyn SessionPresenter>,
        identity: Identity,
        test: TestRef,
        settings: SessionSettings,
    ) -> Self {
        Self { api, presenter, identity, test, settings, order_seed: None }
    }

    #[cfg(test)]
    pub(crate) fn with_order_seed(mut self, seed: u64) -> Self {
        self.order_seed = Some(seed);
        self
    }

    /// Resolves once, when control goes back to the shell.
    pub(crate) async fn run(
        self,
        mut events: mpsc::Receiver<UiEvent>,
    ) -> Result<SessionOutcome, SessionError> {
        let span = tracing::info_span!(
            "proctor_session",
            classroom = %self.test.classroom_code,
            testname = %self.test.testname,
            session_id = tracing::field::Empty,
        );
        self.run_session(&mut events).instrument(span).await
    }

    async fn run_session(
        &self,
        events: &mut mpsc::Receiver<UiEvent>,
    ) -> Result<SessionOutcome, SessionError> {
        let (dto, document) = match self.load().await? {
            Some(loaded) => loaded,
            None => return Ok(SessionOutcome::NotActive),
        };

        let total = dto.question_count;
        let order = match self.order_seed {
            Some(seed) => QuestionOrder::shuffled(total, &mut StdRng::seed_from_u64(seed)),
            None => QuestionOrder::shuffled(total, &mut rand::thread_rng()),
        };
        let session =
            TestSession::new(self.test.clone(), order).map_err(|_| SessionError::NoQuestions)?;
        tracing::Span::current().record("session_id", tracing::field::display(session.id()));

        self.presenter.session_started(&SessionHeader {
            testname: dto.testname.clone(),
            student: self.identity.banner_label(),
            total_questions: session.total_questions(),
            document: Arc::new(document),
        });
        tracing::info!(
            session_id = %session.id(),
            total_questions = session.total_questions(),
            max_warnings = self.settings.max_warnings,
            started_at = %format_offset(session.started_at()),
            "Proctored session started"
        );

        let mut machine = SessionMachine::new(session, self.settings.max_warnings);
        self.event_loop(&mut machine, events).await
    }

    /// `Ok(None)` when the test is not active; the student has been told.
    async fn load(&self) -> Result<Option<(TestDto, QuestionDocument)>, SessionError> {
        let dto = match self.api.fetch_test(&self.test).await {
            Ok(dto) => dto,
            Err(err) => return Err(self.load_failed(err).await),
        };

        if dto.status != TestStatus::Active {
            tracing::info!(status = dto.status.as_str(), "Test is not active");
            let notice = ShellNotice::info("Test Not Active", "This test is no longer active.");
            self.presenter.acknowledge(&notice).await;
            return Ok(None);
        }

        if dto.question_count == 0 {
            tracing::error!("Test has no questions");
            let notice = ShellNotice::error("Failed to Load Test", "This test has no questions.");
            self.presenter.acknowledge(&notice).await;
            return Err(SessionError::NoQuestions);
        }

        let document = match self.api.fetch_question_document(&self.test).await {
            Ok(document) => document,
            Err(err) => return Err(self.load_failed(err).await),
        };

        Ok(Some((dto, document)))
    }

    async fn load_failed(&self, err: ApiError) -> SessionError {
        tracing::error!(error = %err, "Failed to load test");
        let notice = ShellNotice::error("Failed to Load Test", format!("Failed to load test: {err}"));
        self.presenter.acknowledge(&notice).await;
        SessionError::Load(err)
    }

    async fn event_loop(
        &self,
        machine: &mut SessionMachine,
        events: &mut mpsc::Receiver<UiEvent>,
    ) -> Result<SessionOutcome, SessionError> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SessionEvent>();
        let mut autosave = ticker(self.settings.autosave_interval);
        let mut poll = ticker(self.settings.poll_interval);
        let mut events_open = true;

        for effect in machine.start() {
            self.apply(effect, &done_tx).await;
        }

        loop {
            let event = tokio::select! {
                Some(event) = done_rx.recv() => event,
                event = events.recv(), if events_open => match event {
                    Some(event) => SessionEvent::Ui(event),
                    None => {
                        events_open = false;
                        if machine.submission_state() == SubmissionState::NotSubmitted {
                            tracing::error!("UI event channel closed mid-session");
                            return Err(SessionError::EventChannelClosed);
                        }
                        continue;
                    }
                },
                _ = autosave.tick(), if machine.is_autosaving() => SessionEvent::AutosaveTick,
                _ = poll.tick(), if machine.is_polling() => SessionEvent::PollTick,
            };

            for effect in machine.handle(event) {
                if let Some(outcome) = self.apply(effect, &done_tx).await {
                    tracing::info!(
                        test = %machine.session().test(),
                        phase = machine.phase().as_str(),
                        warning_count = machine.warning_count(),
                        answered = machine.session().answers().answered_count(),
                        "Returning control to the shell"
                    );
                    return Ok(outcome);
                }
            }
        }
    }

    async fn apply(
        &self,
        effect: Effect,
        done: &mpsc::UnboundedSender<SessionEvent>,
    ) -> Option<SessionOutcome> {
        match effect {
            Effect::Render(view) => self.presenter.render(&view),
            Effect::ShowPause(notice) => self.presenter.show_pause(&notice),
            Effect::ClearPause => self.presenter.clear_pause(),
            Effect::ShowBanner(notice) => self.presenter.show_banner(&notice),
            Effect::Acknowledge(notice) => self.presenter.acknowledge(&notice).await,
            Effect::ReturnToShell(outcome) => return Some(outcome),
            Effect::PushAnswers(answers) => {
                let api = Arc::clone(&self.api);
                let test = self.test.clone();
                dispatch(done, async move {
                    let result = api.update_answers(&test, &answers).await;
                    SessionEvent::AutosaveCompleted(result.map_err(|err| err.to_string()))
                });
            }
            Effect::FetchStatus => {
                let api = Arc::clone(&self.api);
                let test = self.test.clone();
                dispatch(done, async move {
                    let result = api.fetch_status(&test).await;
                    SessionEvent::StatusFetched(result.map_err(|err| err.to_string()))
                });
            }
            Effect::Submit { trigger, answers } => {
                let api = Arc::clone(&self.api);
                let test = self.test.clone();
                tracing::info!(trigger = trigger.as_str(), "Dispatching final submission");
                dispatch(done, async move {
                    let result = api.submit_answers(&test, &answers).await;
                    SessionEvent::SubmissionCompleted(result.map_err(|err| err.to_string()))
                });
            }
        }
        None
    }
}

/// Runs a network call off the event loop and posts its completion back.
fn dispatch<F>(done: &mpsc::UnboundedSender<SessionEvent>, call: F)
where
    F: Future<Output = SessionEvent> + Send + 'static,
{
    let done = done.clone();
    tokio::spawn(
        async move {
            if done.send(call.await).is_err() {
                tracing::debug!("Session ended before a network call completed");
            }
        }
        .in_current_span(),
    );
}

/// First tick one full period after start; late ticks are dropped, not bunched.
fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
