//! Drive a library task while rendering the events it emits.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// How long to keep draining after the task finished. Guards against a
/// sender clone leaked into a detached task keeping the channel open.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `task` to completion, passing every event from `event_rx` to `on_event`.
///
/// Events still buffered when the task finishes are delivered before the
/// task's result is returned.
pub async fn run_with_events<F, E, R>(
    task: F,
    mut event_rx: mpsc::UnboundedReceiver<E>,
    mut on_event: impl FnMut(E),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(task);

    let result = loop {
        tokio::select! {
            r = &mut task => break Some(r),
            event = event_rx.recv() => match event {
                Some(e) => on_event(e),
                None => break None,
            },
        }
    };

    match result {
        Some(r) => {
            let deadline = Instant::now() + DRAIN_TIMEOUT;
            loop {
                match tokio::time::timeout_at(deadline, event_rx.recv()).await {
                    Ok(Some(e)) => on_event(e),
                    Ok(None) => break,
                    Err(_) => {
                        log::warn!(
                            "run_with_events: drain timed out after {}s",
                            DRAIN_TIMEOUT.as_secs()
                        );
                        break;
                    }
                }
            }
            r
        }
        // Every sender is gone but the task is still running.
        None => task.await,
    }
}
