use serde::Serialize;

use crate::domain::types::SubmitMode;
use crate::services::scoring::Score;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerPayload {
    pub(crate) question_id: String,
    pub(crate) answer: Option<String>,
}

/// Body of the "submit result" call, one per transition into `Submitted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResultSubmission {
    pub(crate) exam_id: String,
    pub(crate) attempt_id: String,
    pub(crate) mode: SubmitMode,
    pub(crate) answers: Vec<AnswerPayload>,
    pub(crate) time_spent_seconds: u64,
    pub(crate) submitted_at: String,
    pub(crate) score: Score,
}
