use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::domain::models::{Exam, Question};
use crate::domain::types::QuestionType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionPayload {
    #[serde(alias = "_id", deserialize_with = "deserialize_text_flexible")]
    #[validate(length(min = 1, message = "question id must not be empty"))]
    pub(crate) id: String,
    #[serde(rename = "type", alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[serde(alias = "question")]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(
        alias = "correctAnswer",
        alias = "correct_answer",
        deserialize_with = "deserialize_text_flexible"
    )]
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamPayload {
    #[serde(alias = "_id", deserialize_with = "deserialize_text_flexible")]
    #[validate(length(min = 1, message = "exam id must not be empty"))]
    pub(crate) id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(alias = "durationMinutes", alias = "duration_minutes")]
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub(crate) duration: u32,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionPayload>,
}

impl QuestionPayload {
    fn into_question(self) -> Question {
        let options = match self.question_type {
            QuestionType::MultipleChoice => self.options.unwrap_or_default(),
            QuestionType::TrueFalse | QuestionType::FillBlank => Vec::new(),
        };

        Question {
            id: self.id,
            content: self.content,
            question_type: self.question_type,
            options,
            answer: self.answer,
        }
    }
}

impl ExamPayload {
    /// Converts a validated payload into the immutable exam used by a session.
    pub(crate) fn into_exam(self) -> Exam {
        Exam {
            id: self.id,
            title: self.title,
            duration_minutes: self.duration,
            questions: self.questions.into_iter().map(QuestionPayload::into_question).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleText {
    Text(String),
    Flag(bool),
    Integer(i64),
    Float(f64),
}

// Backends disagree on ids (numeric vs string) and true/false answers (bool vs string).
fn deserialize_text_flexible<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlexibleText::deserialize(deserializer)? {
        FlexibleText::Text(value) => value,
        FlexibleText::Flag(value) => value.to_string(),
        FlexibleText::Integer(value) => value.to_string(),
        FlexibleText::Float(value) => value.to_string(),
    })
}
