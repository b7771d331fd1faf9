pub(crate) mod core;
pub(crate) mod domain;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};

use crate::core::{config::Settings, telemetry};
use crate::repositories::exams::HttpExamClient;
use crate::services::notifications::{Notification, Notifier};
use crate::services::session::{load_session, SessionView};
use crate::tasks::console::{self, ConsoleNotifier};
use crate::tasks::session_driver::SessionDriver;

const COMMAND_BUFFER: usize = 32;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let exam_id = settings.session().exam_id.clone();
    let client = Arc::new(HttpExamClient::from_settings(&settings)?);
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::default());

    tracing::info!(
        exam_id = %exam_id,
        environment = %settings.runtime().environment.as_str(),
        navigation = ?settings.session().navigation_policy,
        "Exam session engine starting"
    );

    let (view_tx, view_rx) = watch::channel(SessionView::loading(exam_id.clone()));
    let renderer = tokio::spawn(console::render_views(view_rx));

    let session =
        match load_session(client.as_ref(), &exam_id, settings.session().navigation_policy).await {
            Ok(session) => session,
            Err(err) => {
                notifier.notify(Notification::ExamUnavailable {
                    exam_id: exam_id.clone(),
                    reason: err.to_string(),
                });
                return Err(err).with_context(|| format!("Failed to load exam {exam_id}"));
            }
        };

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    console::spawn_input_reader(command_tx).context("Failed to start console input")?;
    println!("{}", console::HELP);

    let driver = SessionDriver::new(session, client, notifier, view_tx);
    let mut handle = tokio::spawn(driver.run(command_rx, shutdown_rx));

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = core::shutdown::shutdown_signal() => {
            if shutdown_tx.send(true).is_err() {
                tracing::warn!("Failed to broadcast shutdown signal to the session driver");
            }
            handle.await
        }
    };

    let session = joined.context("Session driver task join failed")??;
    if let Err(err) = renderer.await {
        tracing::error!(error = %err, "Console renderer join failed");
    }

    tracing::info!(
        exam_id = %exam_id,
        attempt_id = %session.attempt_id(),
        status = session.status().as_str(),
        "Exam session closed"
    );

    Ok(())
}
