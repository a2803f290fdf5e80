//! Background consumer for redirect click events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

use crate::application::services::ClickRecorder;
use crate::domain::click_event::ClickEvent;

fn log_join_error(e: JoinError) {
    if e.is_panic() {
        error!(error = %e, "Click recording task panicked");
    } else {
        error!(error = %e, "Click recording task failed");
    }
}

/// Drains `rx`, recording each event on its own task.
///
/// At most `concurrency` recordings run at once; when the limit is reached the
/// worker waits for one to finish before pulling the next event, so the bounded
/// channel absorbs bursts. A panicking recording is logged at the join boundary
/// and does not stop the worker.
///
/// Returns once every sender is dropped and in-flight recordings have finished.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    recorder: Arc<ClickRecorder>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let mut tasks = JoinSet::new();

    info!(concurrency, "Click worker started");

    while let Some(event) = rx.recv().await {
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                log_join_error(e);
            }
        }

        if tasks.len() >= concurrency
            && let Some(Err(e)) = tasks.join_next().await
        {
            log_join_error(e);
        }

        let recorder = recorder.clone();
        tasks.spawn(async move { recorder.record(event).await });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            log_join_error(e);
        }
    }

    info!("Click worker stopped");
}
