use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SessionStatus {
    Unstarted,
    Available,
    /// The device cannot count steps. Set by the capability check on start;
    /// a later start re-checks.
    Unavailable { message: String },
    /// The most recent sensor delivery failed. The subscription stays live
    /// and the count keeps updating from later readings.
    Error { message: String },
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Unstarted
    }
}

impl SessionStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            SessionStatus::Unavailable { message } | SessionStatus::Error { message } => {
                Some(message)
            }
            _ => None,
        }
    }

    /// A subscription is (or should be) live in this status.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Available | SessionStatus::Error { .. })
    }
}

/// Observable session state, published on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSnapshot {
    pub status: SessionStatus,
    pub today_steps: u64,
}

impl StepSnapshot {
    /// Fraction of `daily_goal` covered so far, clamped into [0.0, 1.0].
    /// A zero goal yields 0.0 rather than dividing.
    pub fn progress_toward(&self, daily_goal: u32) -> f64 {
        if daily_goal == 0 {
            return 0.0;
        }
        (self.today_steps as f64 / f64::from(daily_goal)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub status: SessionStatus,
    pub today_steps: u64,
}

impl SessionState {
    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            status: self.status.clone(),
            today_steps: self.today_steps,
        }
    }

    /// Enter a fresh running session: count restarts from zero and any prior
    /// error is cleared.
    pub fn begin(&mut self) {
        self.status = SessionStatus::Available;
        self.today_steps = 0;
    }

    pub fn mark_unavailable(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Unavailable {
            message: message.into(),
        };
    }

    /// Apply a reported running total. Absolute: later readings overwrite.
    /// A previously recorded error message stays visible until the next
    /// `begin`.
    pub fn record_steps(&mut self, total: u64) {
        self.today_steps = total;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Error {
            message: message.into(),
        };
    }

    /// Leave the running state, keeping the last known count.
    pub fn halt(&mut self) {
        self.status = SessionStatus::Unstarted;
    }
}
