use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use validator::Validate;

use crate::core::config::Settings;
use crate::domain::models::Exam;
use crate::repositories::{ExamRepository, RepositoryError, ResultReporter};
use crate::schemas::exam::ExamPayload;
use crate::schemas::result::ResultSubmission;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for the exam and results endpoints. Stateless, safe to share.
#[derive(Debug, Clone)]
pub(crate) struct HttpExamClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpExamClient {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.api().connect_timeout_seconds))
            .timeout(Duration::from_secs(settings.api().timeout_seconds))
            .build()
            .context("Failed to build exam API HTTP client")?;

        let base_url = Url::parse(&settings.api().base_url)
            .with_context(|| format!("Invalid exam API base URL {}", settings.api().base_url))?;

        Ok(Self::new(client, base_url, settings.api().token.clone()))
    }

    pub(crate) fn new(client: Client, base_url: Url, token: Option<String>) -> Self {
        Self { client, base_url, token }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ExamRepository for HttpExamClient {
    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, RepositoryError> {
        let exam_id = exam_id.trim();
        if exam_id.is_empty() {
            return Err(RepositoryError::NotFound(String::new()));
        }

        let url = self.endpoint(&["exams", exam_id]).map_err(RepositoryError::FetchFailed)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|err| RepositoryError::FetchFailed(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound(exam_id.to_string()));
        }

        let raw_body = response
            .text()
            .await
            .map_err(|err| RepositoryError::FetchFailed(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            return Err(RepositoryError::FetchFailed(format!(
                "status {}: {}",
                status,
                truncate(&raw_body)
            )));
        }

        let payload: ExamPayload = serde_json::from_str(&raw_body).map_err(|err| {
            RepositoryError::FetchFailed(format!("malformed exam payload: {err}"))
        })?;
        payload
            .validate()
            .map_err(|err| RepositoryError::FetchFailed(format!("invalid exam payload: {err}")))?;

        let exam = payload.into_exam();
        tracing::debug!(
            exam_id = %exam.id,
            questions = exam.question_count(),
            "exam fetched"
        );
        Ok(exam)
    }
}

#[async_trait]
impl ResultReporter for HttpExamClient {
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), RepositoryError> {
        let url =
            self.endpoint(&["results"]).map_err(RepositoryError::SubmissionReportingFailed)?;
        let response = self
            .authorize(self.client.post(url))
            .json(submission)
            .send()
            .await
            .map_err(|err| RepositoryError::SubmissionReportingFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw_body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::SubmissionReportingFailed(format!(
                "status {}: {}",
                status,
                truncate(&raw_body)
            )));
        }

        Ok(())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
