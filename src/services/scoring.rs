//! Scoring of a frozen answer snapshot against an exam.
//!
//! Responses are compared to the canonical answer after trimming surrounding
//! whitespace and lowercasing both sides. The same rule applies to every
//! question type; multiple-choice responses hold the option text, not an index.
//! Percentages round half-up.

use serde::Serialize;

use crate::domain::models::Exam;
use crate::domain::types::Verdict;
use crate::services::answer_store::AnswerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Score {
    pub(crate) answered_count: usize,
    pub(crate) correct_count: usize,
    pub(crate) wrong_count: usize,
    pub(crate) percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionReview {
    pub(crate) question_id: String,
    pub(crate) response: Option<String>,
    pub(crate) canonical_answer: String,
    pub(crate) verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Grading {
    pub(crate) score: Score,
    pub(crate) review: Vec<QuestionReview>,
}

pub(crate) fn score(exam: &Exam, answers: &AnswerSnapshot) -> Score {
    grade(exam, answers).score
}

pub(crate) fn grade(exam: &Exam, answers: &AnswerSnapshot) -> Grading {
    let review: Vec<QuestionReview> = exam
        .questions
        .iter()
        .map(|question| {
            let response = answers.response(&question.id);
            let verdict = match response {
                None => Verdict::Unanswered,
                Some(value) if answers_match(value, &question.answer) => Verdict::Correct,
                Some(_) => Verdict::Wrong,
            };
            QuestionReview {
                question_id: question.id.clone(),
                response: response.map(str::to_string),
                canonical_answer: question.answer.clone(),
                verdict,
            }
        })
        .collect();

    let answered_count = review.iter().filter(|item| item.verdict != Verdict::Unanswered).count();
    let correct_count = review.iter().filter(|item| item.verdict == Verdict::Correct).count();

    Grading {
        score: Score {
            answered_count,
            correct_count,
            wrong_count: answered_count - correct_count,
            percentage: percentage(correct_count, exam.question_count()),
        },
        review,
    }
}

pub(crate) fn answers_match(response: &str, canonical: &str) -> bool {
    normalize(response) == normalize(canonical)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    let (correct, total) = (correct as u64, total as u64);
    ((correct * 200 + total) / (total * 2)) as u32
}
