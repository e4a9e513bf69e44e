//! Seam to the platform pedometer.
//!
//! Real devices back this with whatever motion service the OS exposes; tests
//! and the demo binary use [`SimulatedPedometer`].

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::mpsc;

pub mod simulated;

pub use simulated::SimulatedPedometer;

/// Failure reported by a pedometer source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("step counting is not available on this device")]
    NotAvailable,

    #[error("motion data access was denied")]
    AccessDenied,

    #[error("pedometer failure: {0}")]
    Sensor(String),
}

/// One delivery from a live step subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReading {
    /// Total steps counted since the subscription's start instant.
    /// Absolute, not a delta: a later reading replaces an earlier one.
    Steps(u64),

    /// This reading could not be produced. The subscription stays live and
    /// later readings may still arrive.
    Failed(SourceError),
}

#[async_trait]
pub trait StepSource: Send + Sync + 'static {
    /// Whether this device can count steps at all.
    fn step_counting_available(&self) -> bool;

    /// One-shot aggregate of steps taken between `from` and `to`.
    async fn query_steps(
        &self,
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<u64, SourceError>;

    /// Begin streaming readings of the running step total since `from`.
    ///
    /// Dropping the receiver cancels the subscription.
    fn start_updates(&self, from: DateTime<Local>) -> mpsc::Receiver<StepReading>;
}
