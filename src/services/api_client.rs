use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::core::config::Settings;
use crate::schemas::{ApiErrorBody, QuestionDocument, TestDto, TestRef};
use crate::services::identity::Identity;
use crate::services::quiz_api::{ApiError, QuizApi};

/// reqwest-backed [`QuizApi`] talking to the classroom quiz server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    identity: Identity,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        identity: Identity,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| ApiError::Url(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Url(base_url.to_string()));
        }

        let client =
            Client::builder().connect_timeout(connect_timeout).timeout(request_timeout).build()?;

        Ok(Self { client, base_url, identity })
    }

    pub(crate) fn from_settings(settings: &Settings, identity: Identity) -> Result<Self, ApiError> {
        let api = settings.api();
        Self::new(
            &api.base_url,
            Duration::from_secs(api.connect_timeout_seconds),
            Duration::from_secs(api.request_timeout_seconds),
            identity,
        )
    }

    fn test_url(&self, test: &TestRef, suffix: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments =
                url.path_segments_mut().map_err(|_| ApiError::Url(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["api", "classrooms", test.classroom_code.as_str(), "tests"])
                .push(&test.testname)
                .extend(suffix.iter().copied());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.identity.session_cookie() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.request(Method::GET, url).send().await?;
        let raw_body = error_for_status(response).await?.text().await?;
        Ok(serde_json::from_str(&raw_body)?)
    }

    async fn send_answers(
        &self,
        method: Method,
        url: Url,
        answers: &[String],
    ) -> Result<(), ApiError> {
        let response = self.request(method, url).json(answers).send().await?;
        error_for_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl QuizApi for ApiClient {
    async fn fetch_test(&self, test: &TestRef) -> Result<TestDto, ApiError> {
        let url = self.test_url(test, &[])?;
        self.get_json(url).await
    }

    async fn fetch_question_document(
        &self,
        test: &TestRef,
    ) -> Result<QuestionDocument, ApiError> {
        let url = self.test_url(test, &["pdf"])?;
        let response = self.request(Method::GET, url).send().await?;
        let bytes = error_for_status(response).await?.bytes().await?;
        Ok(QuestionDocument::new(bytes.to_vec()))
    }

    async fn update_answers(&self, test: &TestRef, answers: &[String]) -> Result<(), ApiError> {
        let url = self.test_url(test, &["submissions", "answers"])?;
        self.send_answers(Method::PUT, url, answers).await
    }

    async fn submit_answers(&self, test: &TestRef, answers: &[String]) -> Result<(), ApiError> {
        let url = self.test_url(test, &["submissions", "submit"])?;
        self.send_answers(Method::POST, url, answers).await
    }
}

async fn error_for_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }

    let raw_body = response.text().await.unwrap_or_default();
    let message = extract_error_message(status, &raw_body);
    Err(ApiError::Status { status: status.as_u16(), message })
}

fn extract_error_message(status: reqwest::StatusCode, raw_body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ApiErrorBody>(raw_body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
    {
        return message;
    }

    if raw_body.trim().is_empty() {
        return status.canonical_reason().unwrap_or("request failed").to_string();
    }

    raw_body.trim().to_string()
}
