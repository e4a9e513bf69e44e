use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{info, warn};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::source::{StepReading, StepSource};

use super::state::{SessionState, StepSnapshot};

/// Pump for one start/stop cycle: races the one-shot baseline query against
/// the live subscription and applies whichever lands, until cancelled.
pub(crate) async fn session_loop<S: StepSource>(
    source: Arc<S>,
    state: Arc<Mutex<SessionState>>,
    updates: watch::Sender<StepSnapshot>,
    cancel: CancellationToken,
    from: DateTime<Local>,
    started_at: DateTime<Local>,
) {
    // Subscribe before querying so the baseline and the first live readings
    // race; whichever result lands last wins, with no reconciliation.
    let mut readings = source.start_updates(from);
    let mut baseline = source.query_steps(from, started_at);
    let mut baseline_pending = true;
    let mut stream_open = true;

    while baseline_pending || stream_open {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("step session loop shutting down");
                return;
            }
            result = &mut baseline, if baseline_pending => {
                baseline_pending = false;
                match result {
                    Ok(total) => {
                        apply(&state, &updates, &cancel, |s| s.record_steps(total)).await;
                    }
                    Err(err) => {
                        warn!("baseline step query failed: {err}");
                        apply(&state, &updates, &cancel, |s| s.record_error(err.to_string()))
                            .await;
                    }
                }
            }
            reading = readings.recv(), if stream_open => match reading {
                Some(StepReading::Steps(total)) => {
                    apply(&state, &updates, &cancel, |s| s.record_steps(total)).await;
                }
                Some(StepReading::Failed(err)) => {
                    warn!("live step reading failed: {err}");
                    apply(&state, &updates, &cancel, |s| s.record_error(err.to_string())).await;
                }
                None => {
                    warn!("step update stream ended before stop");
                    stream_open = false;
                }
            },
        }
    }
}

async fn apply(
    state: &Mutex<SessionState>,
    updates: &watch::Sender<StepSnapshot>,
    cancel: &CancellationToken,
    mutate: impl FnOnce(&mut SessionState),
) {
    let mut guard = state.lock().await;
    // stop() cancels before joining; a delivery that raced the cancel must
    // not land after stop() has returned.
    if cancel.is_cancelled() {
        return;
    }
    mutate(&mut guard);
    updates.send_replace(guard.snapshot());
}
