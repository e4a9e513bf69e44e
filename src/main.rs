use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use paceline::{GoalStore, SimulatedPedometer, StepReading, StepSession};

const SCRIPTED_READINGS: u64 = 10;
const STEPS_PER_READING: u64 = 450;
const BASELINE_STEPS: u64 = 1_200;

/// Headless demo: runs a scripted session against the simulated pedometer
/// and prints progress against the persisted goal.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let data_dir = dirs::data_dir()
        .context("no data directory available on this platform")?
        .join("paceline");
    std::fs::create_dir_all(&data_dir)?;

    let goals = GoalStore::open(data_dir.join("goal.json"))?;
    info!("daily goal: {} steps", goals.get());

    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(BASELINE_STEPS));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;

    // A scripted morning walk: the pedometer reports a growing running total.
    let walker = tokio::spawn({
        let source = source.clone();
        async move {
            let mut total = BASELINE_STEPS;
            for _ in 0..SCRIPTED_READINGS {
                tokio::time::sleep(Duration::from_millis(300)).await;
                total += STEPS_PER_READING;
                source.emit(StepReading::Steps(total));
            }
        }
    });

    let finish_line = BASELINE_STEPS + SCRIPTED_READINGS * STEPS_PER_READING;
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        let goal = goals.get();
        info!(
            "{} / {} steps ({:.0}%)",
            snapshot.today_steps,
            goal,
            snapshot.progress_toward(goal) * 100.0
        );
        if snapshot.today_steps >= finish_line {
            break;
        }
    }

    walker.await?;
    session.stop().await;
    Ok(())
}
