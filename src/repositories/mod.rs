pub(crate) mod exams;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::Exam;
use crate::schemas::result::ResultSubmission;

#[derive(Debug, Error)]
pub(crate) enum RepositoryError {
    #[error("exam not found: {0}")]
    NotFound(String),
    #[error("failed to fetch exam: {0}")]
    FetchFailed(String),
    #[error("failed to report result: {0}")]
    SubmissionReportingFailed(String),
}

impl RepositoryError {
    /// Not-found exams are never retried within the same attempt.
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::FetchFailed(_) => "fetch_failed",
            Self::SubmissionReportingFailed(_) => "report_failed",
        }
    }
}

#[async_trait]
pub(crate) trait ExamRepository: Send + Sync {
    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, RepositoryError>;
}

#[async_trait]
pub(crate) trait ResultReporter: Send + Sync {
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), RepositoryError>;
}
