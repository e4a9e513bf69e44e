use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use super::{SourceError, StepReading, StepSource};

const FEED_CAPACITY: usize = 32;

/// In-memory stand-in for a device pedometer.
///
/// Readings are pushed by hand with [`emit`](SimulatedPedometer::emit) and fan
/// out to every live subscription. The baseline query answers with whatever
/// [`set_baseline`](SimulatedPedometer::set_baseline) configured, and stays
/// pending forever when nothing was configured.
#[derive(Clone)]
pub struct SimulatedPedometer {
    inner: Arc<Inner>,
}

struct Inner {
    available: bool,
    baseline: Mutex<Option<Result<u64, SourceError>>>,
    feeds: Mutex<Vec<mpsc::Sender<StepReading>>>,
}

impl SimulatedPedometer {
    pub fn new() -> Self {
        Self::with_availability(true)
    }

    /// A device that cannot count steps at all.
    pub fn unavailable() -> Self {
        Self::with_availability(false)
    }

    fn with_availability(available: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                available,
                baseline: Mutex::new(None),
                feeds: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Configure the answer for subsequent baseline queries.
    pub fn set_baseline(&self, result: Result<u64, SourceError>) {
        *self.inner.baseline.lock().unwrap() = Some(result);
    }

    /// Push one reading to every live subscription.
    pub fn emit(&self, reading: StepReading) {
        let mut feeds = self.inner.feeds.lock().unwrap();
        feeds.retain(|feed| match feed.try_send(reading.clone()) {
            Ok(()) => true,
            // A slow consumer drops this reading but keeps its subscription.
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Number of subscriptions whose receiver is still open.
    pub fn live_subscriptions(&self) -> usize {
        let mut feeds = self.inner.feeds.lock().unwrap();
        feeds.retain(|feed| !feed.is_closed());
        feeds.len()
    }
}

impl Default for SimulatedPedometer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepSource for SimulatedPedometer {
    fn step_counting_available(&self) -> bool {
        self.inner.available
    }

    async fn query_steps(
        &self,
        _from: DateTime<Local>,
        _to: DateTime<Local>,
    ) -> Result<u64, SourceError> {
        let configured = self.inner.baseline.lock().unwrap().clone();
        match configured {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    fn start_updates(&self, _from: DateTime<Local>) -> mpsc::Receiver<StepReading> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        self.inner.feeds.lock().unwrap().push(tx);
        rx
    }
}
