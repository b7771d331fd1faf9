use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::models::{Exam, Question};
use crate::domain::types::QuestionType;
use crate::repositories::{ExamRepository, RepositoryError, ResultReporter};
use crate::schemas::result::ResultSubmission;
use crate::services::notifications::{Notification, Notifier};

const ENGINE_ENV_KEYS: &[&str] = &[
    "EXAM_ENGINE_ENV",
    "ENVIRONMENT",
    "EXAM_ENGINE_STRICT_CONFIG",
    "EXAM_API_BASE_URL",
    "EXAM_API_TOKEN",
    "EXAM_API_TIMEOUT_SECONDS",
    "EXAM_API_CONNECT_TIMEOUT_SECONDS",
    "EXAM_ID",
    "EXAM_REQUIRE_ANSWER_TO_ADVANCE",
    "EXAM_ENGINE_LOG_LEVEL",
    "EXAM_ENGINE_LOG_JSON",
    "PROMETHEUS_ENABLED",
    "PROMETHEUS_LISTEN_ADDR",
];

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<AsyncMutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(AsyncMutex::new(()))).clone();
    lock.lock_owned().await
}

/// Clears engine variables and sets the minimum a test run needs.
pub(crate) fn set_test_env() {
    for key in ENGINE_ENV_KEYS {
        std::env::remove_var(key);
    }
    std::env::set_var("EXAM_ENGINE_ENV", "test");
    std::env::set_var("EXAM_API_BASE_URL", "http://127.0.0.1:9/api");
    std::env::set_var("EXAM_ID", "exam-1");
}

/// Three questions, one minute: Q1 multiple choice "B", Q2 true/false "true", Q3 fill-in "Paris".
pub(crate) fn sample_exam() -> Exam {
    Exam {
        id: "exam-1".to_string(),
        title: "Unit 3 review".to_string(),
        duration_minutes: 1,
        questions: vec![
            Question {
                id: "q1".to_string(),
                content: "Choose the correct form: She ___ to school every day.".to_string(),
                question_type: QuestionType::MultipleChoice,
                options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                answer: "B".to_string(),
            },
            Question {
                id: "q2".to_string(),
                content: "\"Their\" is a possessive determiner.".to_string(),
                question_type: QuestionType::TrueFalse,
                options: Vec::new(),
                answer: "true".to_string(),
            },
            Question {
                id: "q3".to_string(),
                content: "The capital of France is ___.".to_string(),
                question_type: QuestionType::FillBlank,
                options: Vec::new(),
                answer: "Paris".to_string(),
            },
        ],
    }
}

#[derive(Debug, Default)]
pub(crate) struct StaticExamRepository {
    exams: HashMap<String, Exam>,
    fetches: AtomicUsize,
}

impl StaticExamRepository {
    pub(crate) fn with_exam(exam: Exam) -> Self {
        let mut exams = HashMap::new();
        exams.insert(exam.id.clone(), exam);
        Self { exams, fetches: AtomicUsize::new(0) }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExamRepository for StaticExamRepository {
    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, RepositoryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.exams
            .get(exam_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(exam_id.to_string()))
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    submissions: Mutex<Vec<ResultSubmission>>,
    fail: bool,
}

impl RecordingReporter {
    pub(crate) fn failing() -> Self {
        Self { submissions: Mutex::new(Vec::new()), fail: true }
    }

    pub(crate) fn submissions(&self) -> Vec<ResultSubmission> {
        self.submissions.lock().expect("reporter lock").clone()
    }
}

#[async_trait]
impl ResultReporter for RecordingReporter {
    async fn submit_result(&self, submission: &ResultSubmission) -> Result<(), RepositoryError> {
        self.submissions.lock().expect("reporter lock").push(submission.clone());
        if self.fail {
            return Err(RepositoryError::SubmissionReportingFailed("status 503".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().expect("notifier lock").push(notification);
    }
}
