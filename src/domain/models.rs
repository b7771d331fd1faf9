use serde::Serialize;

use crate::domain::types::QuestionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) question_type: QuestionType,
    /// Populated for `multiple_choice` only, empty otherwise.
    pub(crate) options: Vec<String>,
    pub(crate) answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: u32,
    pub(crate) questions: Vec<Question>,
}

impl Exam {
    pub(crate) fn total_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    pub(crate) fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub(crate) fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}
