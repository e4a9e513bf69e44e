use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use log::{error, info};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::source::StepSource;

use super::state::{SessionState, StepSnapshot};
use super::worker::session_loop;

/// Owns the lifecycle of a live step-counting subscription and keeps the
/// published [`StepSnapshot`] current.
///
/// Exactly one subscription is live at a time: `start` tears down any
/// previous worker before spawning a new one, so repeated mount/unmount
/// cycles cannot leak.
pub struct StepSession<S> {
    source: Arc<S>,
    state: Arc<Mutex<SessionState>>,
    updates: watch::Sender<StepSnapshot>,
    worker: Mutex<Option<SessionWorker>>,
}

struct SessionWorker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl<S: StepSource> StepSession<S> {
    pub fn new(source: S) -> Self {
        let state = SessionState::default();
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(state)),
            updates,
            worker: Mutex::new(None),
        }
    }

    /// Observation point for renderers. The receiver always holds the latest
    /// snapshot; every state change publishes a fresh one.
    pub fn subscribe(&self) -> watch::Receiver<StepSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> StepSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Begin (or restart) counting from local midnight.
    ///
    /// Re-checks device capability every time. When capability is present the
    /// count resets to zero, any prior error clears, and a one-shot baseline
    /// query plus a live subscription are issued for the current day.
    pub async fn start(&self) {
        // The worker slot stays locked for the whole call so concurrent
        // start/stop cannot spawn a second live subscription.
        let mut worker = self.worker.lock().await;
        shutdown(&mut worker).await;

        if !self.source.step_counting_available() {
            let mut state = self.state.lock().await;
            state.mark_unavailable("Step counting not available on this device.");
            self.updates.send_replace(state.snapshot());
            return;
        }

        let started_at = Local::now();
        let from = start_of_day(started_at);

        {
            let mut state = self.state.lock().await;
            state.begin();
            self.updates.send_replace(state.snapshot());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(session_loop(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            self.updates.clone(),
            cancel.clone(),
            from,
            started_at,
        ));

        *worker = Some(SessionWorker { handle, cancel });
        info!("step session started; counting from {from}");
    }

    /// Cancel the live subscription. The count keeps its last known value
    /// until the next `start`. No state changes are observable after this
    /// returns; a no-op when nothing was running.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        shutdown(&mut worker).await;

        let mut state = self.state.lock().await;
        if state.status.is_active() {
            state.halt();
            self.updates.send_replace(state.snapshot());
        }
    }
}

async fn shutdown(worker: &mut Option<SessionWorker>) {
    if let Some(SessionWorker { handle, cancel }) = worker.take() {
        cancel.cancel();
        if let Err(err) = handle.await {
            error!("step session worker failed to join: {err}");
        }
    }
}

/// Local midnight of the day containing `now`. Falls back to `now` itself on
/// the rare day where midnight does not exist in the local zone.
fn start_of_day(now: DateTime<Local>) -> DateTime<Local> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn start_of_day_zeroes_the_clock() {
        let now = Local::now();
        let midnight = start_of_day(now);
        assert_eq!(midnight.date_naive(), now.date_naive());
        assert_eq!(midnight.num_seconds_from_midnight(), 0);
    }
}
