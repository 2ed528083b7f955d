use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{QuestionDocument, TestDto, TestRef, TestStatus};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request url: {0}")]
    Url(String),
}

/// The server calls a proctored session relies on.
///
/// `update_answers` is an idempotent upsert and may be called any number of times.
/// `submit_answers` is final; callers must invoke it at most once per session and must
/// not count on the server to deduplicate.
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn fetch_test(&self, test: &TestRef) -> Result<TestDto, ApiError>;

    async fn fetch_question_document(&self, test: &TestRef)
        -> Result<QuestionDocument, ApiError>;

    async fn fetch_status(&self, test: &TestRef) -> Result<TestStatus, ApiError> {
        Ok(self.fetch_test(test).await?.status)
    }

    /// `answers` is in canonical order, one entry per question, `""` when unanswered.
    async fn update_answers(&self, test: &TestRef, answers: &[String]) -> Result<(), ApiError>;

    /// Same shape as [`QuizApi::update_answers`].
    async fn submit_answers(&self, test: &TestRef, answers: &[String]) -> Result<(), ApiError>;
}
