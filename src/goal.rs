use std::{fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub const DEFAULT_DAILY_GOAL: u32 = 8_000;
pub const MIN_DAILY_GOAL: u32 = 1_000;
pub const MAX_DAILY_GOAL: u32 = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GoalFile {
    daily_goal: u32,
}

impl Default for GoalFile {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

/// Durable store for the daily step goal.
///
/// Holds a single clamped integer, persisted as JSON and published through a
/// watch channel so renderers can observe edits as they land. Out-of-range
/// input is corrected, never rejected.
pub struct GoalStore {
    path: PathBuf,
    data: RwLock<GoalFile>,
    changed: watch::Sender<u32>,
}

impl GoalStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read goal settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            GoalFile::default()
        };

        // A hand-edited file may hold an out-of-range value; the goal must
        // stay within range for every read.
        data.daily_goal = clamp_goal(i64::from(data.daily_goal));

        let (changed, _) = watch::channel(data.daily_goal);
        Ok(Self {
            path,
            data: RwLock::new(data),
            changed,
        })
    }

    pub fn get(&self) -> u32 {
        self.data.read().unwrap().daily_goal
    }

    /// Clamp `requested` into [`MIN_DAILY_GOAL`, `MAX_DAILY_GOAL`], persist
    /// it, and return the value actually applied.
    ///
    /// There is no error path for the caller: a failed write is logged and
    /// the in-memory value still updates, so `get` within the same run
    /// always reflects the last `set`.
    pub fn set(&self, requested: i64) -> u32 {
        let applied = clamp_goal(requested);
        {
            let mut guard = self.data.write().unwrap();
            guard.daily_goal = applied;
            if let Err(err) = self.persist(&guard) {
                warn!("failed to persist daily goal: {err:#}");
            }
        }
        self.changed.send_replace(applied);
        applied
    }

    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.changed.subscribe()
    }

    fn persist(&self, data: &GoalFile) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write goal settings to {}", self.path.display()))
    }
}

fn clamp_goal(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_DAILY_GOAL), i64::from(MAX_DAILY_GOAL)) as u32
}
