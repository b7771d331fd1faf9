use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::time::format_offset;
use crate::domain::models::{Exam, Question};
use crate::domain::types::{NavigationPolicy, SessionStatus, SubmitMode};
use crate::repositories::{ExamRepository, RepositoryError};
use crate::schemas::result::{AnswerPayload, ResultSubmission};
use crate::services::answer_store::{is_answered, AnswerStore};
use crate::services::countdown::{Countdown, Tick};
use crate::services::scoring::{self, QuestionReview, Score};

/// Frozen result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionOutcome {
    pub(crate) mode: SubmitMode,
    pub(crate) score: Score,
    pub(crate) review: Vec<QuestionReview>,
    pub(crate) time_spent_seconds: u64,
    pub(crate) remaining_seconds: u64,
}

/// Read-only picture of a session for whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionView {
    pub(crate) status: SessionStatus,
    pub(crate) exam_title: String,
    pub(crate) attempt_id: String,
    pub(crate) current_index: usize,
    pub(crate) question_count: usize,
    pub(crate) question: Option<Question>,
    pub(crate) current_answer: Option<String>,
    pub(crate) remaining_seconds: u64,
    pub(crate) answered_count: usize,
    pub(crate) outcome: Option<SessionOutcome>,
}

impl SessionView {
    pub(crate) fn loading(exam_title: impl Into<String>) -> Self {
        Self {
            status: SessionStatus::Loading,
            exam_title: exam_title.into(),
            attempt_id: String::new(),
            current_index: 0,
            question_count: 0,
            question: None,
            current_answer: None,
            remaining_seconds: 0,
            answered_count: 0,
            outcome: None,
        }
    }
}

/// One learner's attempt at one exam.
///
/// Every transition into `Submitted` queues exactly one [`ResultSubmission`];
/// the owner drains them with [`ExamSession::take_reports`] and delivers them.
#[derive(Debug)]
pub(crate) struct ExamSession {
    exam: Arc<Exam>,
    policy: NavigationPolicy,
    status: SessionStatus,
    attempt_id: Uuid,
    current_index: usize,
    answers: AnswerStore,
    clock: Countdown,
    outcome: Option<SessionOutcome>,
    reports: Vec<ResultSubmission>,
}

/// Fetches the exam and opens a session for it. No session or clock exists on failure.
pub(crate) async fn load_session<R>(
    repository: &R,
    exam_id: &str,
    policy: NavigationPolicy,
) -> Result<ExamSession, RepositoryError>
where
    R: ExamRepository + ?Sized,
{
    tracing::debug!(exam_id, "loading exam");
    match repository.fetch_exam(exam_id).await {
        Ok(exam) => Ok(ExamSession::start(Arc::new(exam), policy)),
        Err(err) => {
            tracing::warn!(
                exam_id,
                error = %err,
                terminal = err.is_terminal(),
                "exam could not be loaded"
            );
            metrics::counter!("exam_fetch_failures_total", "reason" => err.reason())
                .increment(1);
            Err(err)
        }
    }
}

impl ExamSession {
    pub(crate) fn start(exam: Arc<Exam>, policy: NavigationPolicy) -> Self {
        let mut session = Self {
            exam,
            policy,
            status: SessionStatus::InProgress,
            attempt_id: Uuid::new_v4(),
            current_index: 0,
            answers: AnswerStore::default(),
            clock: Countdown::default(),
            outcome: None,
            reports: Vec::new(),
        };

        tracing::info!(
            exam_id = %session.exam.id,
            attempt_id = %session.attempt_id,
            questions = session.exam.question_count(),
            duration_minutes = session.exam.duration_minutes,
            "exam session started"
        );
        metrics::counter!("exam_sessions_started_total").increment(1);

        session.start_clock();
        session
    }

    fn start_clock(&mut self) {
        if self.clock.start(self.exam.total_seconds()) == Tick::Expired {
            self.submit(SubmitMode::AutoDeadline);
        }
    }

    pub(crate) fn exam(&self) -> &Exam {
        &self.exam
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current_index
    }

    pub(crate) fn current_question(&self) -> Option<&Question> {
        self.exam.question(self.current_index)
    }

    pub(crate) fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        self.clock.remaining_seconds()
    }

    pub(crate) fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub(crate) fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Records a response for `question_id`. Ignored outside `InProgress` or for unknown ids.
    pub(crate) fn answer(&mut self, question_id: &str, value: impl Into<String>) -> bool {
        if self.status != SessionStatus::InProgress {
            return false;
        }
        if !self.exam.questions.iter().any(|question| question.id == question_id) {
            tracing::debug!(question_id, "ignoring answer for unknown question");
            return false;
        }

        self.answers.set(question_id, value);
        true
    }

    pub(crate) fn answer_current(&mut self, value: impl Into<String>) -> bool {
        let Some(question_id) = self.current_question().map(|question| question.id.clone()) else {
            return false;
        };
        self.answer(&question_id, value)
    }

    pub(crate) fn next(&mut self) -> bool {
        self.jump_to(self.current_index + 1)
    }

    pub(crate) fn previous(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.jump_to(index),
            None => false,
        }
    }

    /// Moves to `index`. Out-of-range targets are ignored, as are forward moves
    /// away from an unanswered question under [`NavigationPolicy::RequireAnswer`].
    pub(crate) fn jump_to(&mut self, index: usize) -> bool {
        if self.status == SessionStatus::Cancelled
            || index >= self.exam.question_count()
            || index == self.current_index
        {
            return false;
        }
        if index > self.current_index && !self.may_advance() {
            return false;
        }

        self.current_index = index;
        true
    }

    fn may_advance(&self) -> bool {
        if self.status != SessionStatus::InProgress {
            return true;
        }
        match self.policy {
            NavigationPolicy::Free => true,
            NavigationPolicy::RequireAnswer => self
                .current_question()
                .and_then(|question| self.answers.get(&question.id))
                .is_some_and(is_answered),
        }
    }

    /// Advances the clock by one second. Returns `true` when this tick expired
    /// the clock and submitted the attempt.
    pub(crate) fn tick(&mut self) -> bool {
        match self.clock.tick() {
            Tick::Expired => self.submit(SubmitMode::AutoDeadline),
            Tick::Remaining(_) | Tick::Idle => false,
        }
    }

    /// Moves `InProgress → Submitted`. Any later call is a no-op returning `false`.
    pub(crate) fn submit(&mut self, mode: SubmitMode) -> bool {
        if self.status != SessionStatus::InProgress {
            tracing::debug!(
                attempt_id = %self.attempt_id,
                status = self.status.as_str(),
                mode = mode.as_str(),
                "ignoring submit outside of an active attempt"
            );
            return false;
        }

        self.clock.stop();
        let remaining_seconds = self.clock.remaining_seconds();
        let time_spent_seconds = self.exam.total_seconds().saturating_sub(remaining_seconds);

        let snapshot = self.answers.snapshot();
        let grading = scoring::grade(&self.exam, &snapshot);

        let answers = self
            .exam
            .questions
            .iter()
            .map(|question| AnswerPayload {
                question_id: question.id.clone(),
                answer: snapshot.response(&question.id).map(str::to_string),
            })
            .collect();

        self.reports.push(ResultSubmission {
            exam_id: self.exam.id.clone(),
            attempt_id: self.attempt_id.to_string(),
            mode,
            answers,
            time_spent_seconds,
            submitted_at: format_offset(OffsetDateTime::now_utc()),
            score: grading.score,
        });

        tracing::info!(
            exam_id = %self.exam.id,
            attempt_id = %self.attempt_id,
            mode = mode.as_str(),
            answered = grading.score.answered_count,
            correct = grading.score.correct_count,
            percentage = grading.score.percentage,
            time_spent_seconds,
            "exam attempt submitted"
        );
        metrics::counter!("exam_submissions_total", "mode" => mode.as_str()).increment(1);

        self.outcome = Some(SessionOutcome {
            mode,
            score: grading.score,
            review: grading.review,
            time_spent_seconds,
            remaining_seconds,
        });
        self.status = SessionStatus::Submitted;
        true
    }

    /// Moves `Submitted → InProgress` with a cleared store, the first question
    /// and a full clock. The loaded exam is reused as is.
    pub(crate) fn restart(&mut self) -> bool {
        if self.status != SessionStatus::Submitted {
            return false;
        }

        self.answers.reset();
        self.current_index = 0;
        self.outcome = None;
        self.attempt_id = Uuid::new_v4();
        self.status = SessionStatus::InProgress;

        tracing::info!(
            exam_id = %self.exam.id,
            attempt_id = %self.attempt_id,
            "exam session restarted"
        );

        self.start_clock();
        true
    }

    /// Stops the clock for good when the page goes away. Nothing is submitted:
    /// an in-progress attempt becomes `Cancelled`, a submitted one keeps its result.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.status == SessionStatus::Cancelled {
            return false;
        }

        self.clock.stop();
        if self.status == SessionStatus::InProgress {
            self.status = SessionStatus::Cancelled;
        }
        tracing::info!(
            exam_id = %self.exam.id,
            attempt_id = %self.attempt_id,
            remaining_seconds = self.clock.remaining_seconds(),
            "exam session cancelled"
        );
        true
    }

    pub(crate) fn take_reports(&mut self) -> Vec<ResultSubmission> {
        std::mem::take(&mut self.reports)
    }

    pub(crate) fn view(&self) -> SessionView {
        let question = self.current_question().cloned();
        let current_answer = question
            .as_ref()
            .and_then(|question| self.answers.get(&question.id))
            .map(str::to_string);

        SessionView {
            status: self.status,
            exam_title: self.exam.title.clone(),
            attempt_id: self.attempt_id.to_string(),
            current_index: self.current_index,
            question_count: self.exam.question_count(),
            question,
            current_answer,
            remaining_seconds: self.clock.remaining_seconds(),
            answered_count: self.answers.answered_count(),
            outcome: self.outcome.clone(),
        }
    }
}
