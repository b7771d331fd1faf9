use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

use crate::domain::types::SubmitMode;
use crate::repositories::ResultReporter;
use crate::schemas::result::ResultSubmission;
use crate::services::notifications::{Notification, Notifier};
use crate::services::session::{ExamSession, SessionView};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Learner intents delivered to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    AnswerCurrent(String),
    Answer { question_id: String, value: String },
    Next,
    Previous,
    JumpTo(usize),
    Submit,
    Restart,
    Leave,
}

/// Owns one [`ExamSession`] and serializes clock ticks, learner commands and
/// shutdown on a single loop, so no two transitions ever interleave.
pub(crate) struct SessionDriver {
    session: ExamSession,
    reporter: Arc<dyn ResultReporter>,
    notifier: Arc<dyn Notifier>,
    views: watch::Sender<SessionView>,
    reports: JoinSet<()>,
}

impl SessionDriver {
    pub(crate) fn new(
        session: ExamSession,
        reporter: Arc<dyn ResultReporter>,
        notifier: Arc<dyn Notifier>,
        views: watch::Sender<SessionView>,
    ) -> Self {
        Self { session, reporter, notifier, views, reports: JoinSet::new() }
    }

    /// Runs until the learner leaves, the command channel closes or shutdown is
    /// signalled. The clock is always stopped on the way out.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ExamSession> {
        let mut ticker = new_ticker();
        self.flush_reports();
        self.publish();

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                command = commands.recv() => match command {
                    Some(SessionCommand::Leave) | None => break,
                    Some(command) => {
                        if self.apply(command) {
                            ticker.reset();
                        }
                    }
                },
                _ = ticker.tick(), if self.session.is_clock_running() => {
                    if self.session.tick() {
                        self.notifier.notify(Notification::TimeExpired);
                    }
                }
            }

            self.flush_reports();
            self.publish();
        }

        self.session.cancel();
        self.publish();

        while let Some(joined) = self.reports.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "Result report task join failed");
            }
        }

        Ok(self.session)
    }

    /// Applies one command. Returns `true` when the clock was restarted.
    fn apply(&mut self, command: SessionCommand) -> bool {
        tracing::debug!(?command, "session command");
        match command {
            SessionCommand::AnswerCurrent(value) => {
                self.session.answer_current(value);
            }
            SessionCommand::Answer { question_id, value } => {
                self.session.answer(&question_id, value);
            }
            SessionCommand::Next => {
                self.session.next();
            }
            SessionCommand::Previous => {
                self.session.previous();
            }
            SessionCommand::JumpTo(index) => {
                self.session.jump_to(index);
            }
            SessionCommand::Submit => {
                self.session.submit(SubmitMode::Manual);
            }
            SessionCommand::Restart => return self.session.restart(),
            SessionCommand::Leave => {}
        }
        false
    }

    fn flush_reports(&mut self) {
        for submission in self.session.take_reports() {
            let reporter = Arc::clone(&self.reporter);
            let notifier = Arc::clone(&self.notifier);
            self.reports.spawn(deliver_report(reporter, notifier, submission));
        }
    }

    fn publish(&self) {
        self.views.send_replace(self.session.view());
    }
}

fn new_ticker() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn deliver_report(
    reporter: Arc<dyn ResultReporter>,
    notifier: Arc<dyn Notifier>,
    submission: ResultSubmission,
) {
    let attempt_id = submission.attempt_id.clone();
    match reporter.submit_result(&submission).await {
        Ok(()) => {
            tracing::info!(
                exam_id = %submission.exam_id,
                attempt_id = %attempt_id,
                "result reported"
            );
            notifier.notify(Notification::ResultSaved { attempt_id });
        }
        Err(err) => {
            tracing::warn!(
                exam_id = %submission.exam_id,
                attempt_id = %attempt_id,
                error = %err,
                "result report failed; score kept locally"
            );
            metrics::counter!("exam_result_reports_failed_total").increment(1);
            notifier.notify(Notification::ResultNotSaved { attempt_id, reason: err.to_string() });
        }
    }
}
