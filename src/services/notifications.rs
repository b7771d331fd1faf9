use std::fmt;

/// Transient user-facing notices raised by the session engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    /// The exam could not be loaded; the learner goes back to the exam listing.
    ExamUnavailable { exam_id: String, reason: String },
    TimeExpired,
    ResultSaved { attempt_id: String },
    ResultNotSaved { attempt_id: String, reason: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExamUnavailable { exam_id, reason } => {
                write!(f, "Exam {exam_id} is unavailable ({reason}). Returning to the exam list.")
            }
            Self::TimeExpired => f.write_str("Time is up. Your answers were submitted."),
            Self::ResultSaved { .. } => f.write_str("Your result was saved."),
            Self::ResultNotSaved { reason, .. } => {
                write!(f, "Your result could not be saved ({reason}). Your score is shown below.")
            }
        }
    }
}

pub(crate) trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Routes notifications into the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::ExamUnavailable { .. } | Notification::ResultNotSaved { .. } => {
                tracing::warn!(notification = %notification, "user notification");
            }
            Notification::TimeExpired | Notification::ResultSaved { .. } => {
                tracing::info!(notification = %notification, "user notification");
            }
        }
    }
}
