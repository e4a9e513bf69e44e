pub mod controller;
pub mod state;

mod worker;

pub use controller::StepSession;
pub use state::{SessionStatus, StepSnapshot};
