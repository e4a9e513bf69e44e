//! Core of a daily step-goal tracker: a live pedometer session plus a
//! persisted, clamped daily goal, both published through watch channels for
//! a renderer to observe.

pub mod goal;
pub mod session;
pub mod source;

pub use goal::{GoalStore, DEFAULT_DAILY_GOAL, MAX_DAILY_GOAL, MIN_DAILY_GOAL};
pub use session::{SessionStatus, StepSession, StepSnapshot};
pub use source::{SimulatedPedometer, SourceError, StepReading, StepSource};
