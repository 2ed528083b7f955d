use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use crate::proctor::presenter::{QuestionView, SessionHeader, SessionPresenter, ShellNotice};
use crate::schemas::{QuestionDocument, TestDto, TestRef, TestStatus};
use crate::services::{ApiError, QuizApi};

pub(crate) const TEST_API_BASE_URL: &str = "http://127.0.0.1:8080";

pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn set_test_env() {
    std::env::set_var("MCQ_ENV", "test");
    std::env::set_var("MCQ_STRICT_CONFIG", "0");
    std::env::set_var("MCQ_API_BASE_URL", TEST_API_BASE_URL);
    std::env::remove_var("ENVIRONMENT");
    std::env::remove_var("MCQ_CONNECT_TIMEOUT_SECONDS");
    std::env::remove_var("MCQ_REQUEST_TIMEOUT_SECONDS");
    std::env::remove_var("PROCTOR_AUTOSAVE_INTERVAL_SECONDS");
    std::env::remove_var("PROCTOR_POLL_INTERVAL_SECONDS");
    std::env::remove_var("PROCTOR_MAX_WARNINGS");
    std::env::remove_var("MCQ_USERNAME");
    std::env::remove_var("MCQ_DISPLAY_NAME");
    std::env::remove_var("MCQ_SESSION_COOKIE");
}

pub(crate) fn test_dto(status: TestStatus, question_count: usize) -> TestDto {
    TestDto {
        id: 42,
        testname: "Unit 3".to_string(),
        status,
        question_count,
        questions_pdf_path: Some("tests/42/questions.pdf".to_string()),
        classroom: None,
    }
}

/// In-memory [`QuizApi`] with scripted statuses and optional delays. Calls are recorded
/// when they start.
pub(crate) struct FakeQuizApi {
    test: Result<TestDto, String>,
    statuses: Mutex<VecDeque<Result<TestStatus, String>>>,
    status_delay: Duration,
    update_delay: Duration,
    submit_delay: Duration,
    submit_error: Option<String>,
    status_calls: Mutex<usize>,
    updates: Mutex<Vec<Vec<String>>>,
    submissions: Mutex<Vec<Vec<String>>>,
}

impl FakeQuizApi {
    pub(crate) fn new(test: TestDto) -> Self {
        Self {
            test: Ok(test),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            update_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            submit_error: None,
            status_calls: Mutex::new(0),
            updates: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn active(question_count: usize) -> Self {
        Self::new(test_dto(TestStatus::Active, question_count))
    }

    pub(crate) fn unreachable() -> Self {
        let mut api = Self::active(1);
        api.test = Err("connection refused".to_string());
        api
    }

    /// Status results handed out one per poll; `ACTIVE` once the script runs out.
    pub(crate) fn with_statuses(self, statuses: Vec<Result<TestStatus, String>>) -> Self {
        *lock(&self.statuses) = statuses.into();
        self
    }

    pub(crate) fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub(crate) fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    pub(crate) fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub(crate) fn failing_submit(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    pub(crate) fn status_calls(&self) -> usize {
        *lock(&self.status_calls)
    }

    pub(crate) fn updates(&self) -> Vec<Vec<String>> {
        lock(&self.updates).clone()
    }

    pub(crate) fn submissions(&self) -> Vec<Vec<String>> {
        lock(&self.submissions).clone()
    }
}

#[async_trait]
impl QuizApi for FakeQuizApi {
    async fn fetch_test(&self, _test: &TestRef) -> Result<TestDto, ApiError> {
        self.test.clone().map_err(|message| ApiError::Status { status: 503, message })
    }

    async fn fetch_question_document(&self, _test: &TestRef) -> Result<QuestionDocument, ApiError> {
        Ok(QuestionDocument::new(b"%PDF-1.4 fake".to_vec()))
    }

    async fn fetch_status(&self, _test: &TestRef) -> Result<TestStatus, ApiError> {
        *lock(&self.status_calls) += 1;
        let next = lock(&self.statuses).pop_front().unwrap_or(Ok(TestStatus::Active));
        sleep(self.status_delay).await;
        next.map_err(|message| ApiError::Status { status: 503, message })
    }

    async fn update_answers(&self, _test: &TestRef, answers: &[String]) -> Result<(), ApiError> {
        lock(&self.updates).push(answers.to_vec());
        sleep(self.update_delay).await;
        Ok(())
    }

    async fn submit_answers(&self, _test: &TestRef, answers: &[String]) -> Result<(), ApiError> {
        lock(&self.submissions).push(answers.to_vec());
        sleep(self.submit_delay).await;
        match &self.submit_error {
            Some(message) => Err(ApiError::Status { status: 500, message: message.clone() }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PresenterCall {
    SessionStarted { total_questions: usize },
    Render(QuestionView),
    ShowPause(ShellNotice),
    ClearPause,
    ShowBanner(ShellNotice),
    Acknowledge(ShellNotice),
}

/// Presenter that records every call and acknowledges notices immediately.
#[derive(Default)]
pub(crate) struct RecordingPresenter {
    calls: Mutex<Vec<PresenterCall>>,
}

impl RecordingPresenter {
    pub(crate) fn calls(&self) -> Vec<PresenterCall> {
        lock(&self.calls).clone()
    }

    pub(crate) fn acknowledged(&self) -> Vec<ShellNotice> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Acknowledge(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn banners(&self) -> Vec<ShellNotice> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::ShowBanner(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn pauses(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, PresenterCall::ShowPause(_))).count()
    }

    fn record(&self, call: PresenterCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl SessionPresenter for RecordingPresenter {
    fn session_started(&self, header: &SessionHeader) {
        self.record(PresenterCall::SessionStarted { total_questions: header.total_questions });
    }

    fn render(&self, view: &QuestionView) {
        self.record(PresenterCall::Render(view.clone()));
    }

    fn show_pause(&self, notice: &ShellNotice) {
        self.record(PresenterCall::ShowPause(notice.clone()));
    }

    fn clear_pause(&self) {
        self.record(PresenterCall::ClearPause);
    }

    fn show_banner(&self, notice: &ShellNotice) {
        self.record(PresenterCall::ShowBanner(notice.clone()));
    }

    async fn acknowledge(&self, notice: &ShellNotice) {
        self.record(PresenterCall::Acknowledge(notice.clone()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
