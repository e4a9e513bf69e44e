use std::time::Duration;

use paceline::{
    SessionStatus, SimulatedPedometer, SourceError, StepReading, StepSession, StepSnapshot,
};
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn wait_for<F>(rx: &mut watch::Receiver<StepSnapshot>, predicate: F) -> StepSnapshot
where
    F: Fn(&StepSnapshot) -> bool,
{
    timeout(WAIT, async {
        loop {
            let current = rx.borrow_and_update().clone();
            if predicate(&current) {
                return current;
            }
            rx.changed().await.expect("session dropped while waiting");
        }
    })
    .await
    .expect("timed out waiting for expected snapshot")
}

#[tokio::test]
async fn unavailable_device_reports_status_and_stop_is_a_noop() {
    let source = SimulatedPedometer::unavailable();
    let session = StepSession::new(source.clone());
    session.start().await;

    let snapshot = session.snapshot().await;
    assert!(matches!(snapshot.status, SessionStatus::Unavailable { .. }));
    assert!(snapshot.status.message().unwrap().contains("not available"));
    assert_eq!(snapshot.today_steps, 0);
    assert_eq!(source.live_subscriptions(), 0);

    session.stop().await;
    assert_eq!(session.snapshot().await, snapshot);
}

#[tokio::test]
async fn count_stays_zero_until_the_first_delivery() {
    // No baseline configured: the one-shot query never answers.
    let source = SimulatedPedometer::new();
    let session = StepSession::new(source.clone());
    session.start().await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Available);
    assert_eq!(snapshot.today_steps, 0);

    session.stop().await;
}

#[tokio::test]
async fn baseline_query_seeds_the_count() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(4_321));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;

    let snapshot = wait_for(&mut updates, |s| s.today_steps == 4_321).await;
    assert_eq!(snapshot.status, SessionStatus::Available);

    session.stop().await;
}

#[tokio::test]
async fn live_readings_overwrite_instead_of_accumulating() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(2));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;
    wait_for(&mut updates, |s| s.today_steps == 2).await;

    source.emit(StepReading::Steps(10));
    wait_for(&mut updates, |s| s.today_steps == 10).await;

    source.emit(StepReading::Steps(7));
    let snapshot = wait_for(&mut updates, |s| s.today_steps == 7).await;
    assert_eq!(snapshot.today_steps, 7);

    session.stop().await;
}

#[tokio::test]
async fn baseline_failure_is_recorded_without_killing_the_stream() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Err(SourceError::AccessDenied));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;

    let failed = wait_for(&mut updates, |s| s.status.message().is_some()).await;
    assert!(matches!(failed.status, SessionStatus::Error { .. }));
    assert_eq!(failed.today_steps, 0);

    // Live readings keep flowing after the failed query.
    source.emit(StepReading::Steps(33));
    wait_for(&mut updates, |s| s.today_steps == 33).await;

    session.stop().await;
}

#[tokio::test]
async fn sensor_error_keeps_count_and_later_readings_still_apply() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(5));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;
    wait_for(&mut updates, |s| s.today_steps == 5).await;

    source.emit(StepReading::Failed(SourceError::Sensor(
        "motion service interrupted".into(),
    )));
    let failed = wait_for(&mut updates, |s| s.status.message().is_some()).await;
    assert_eq!(failed.today_steps, 5);

    source.emit(StepReading::Steps(25));
    let recovered = wait_for(&mut updates, |s| s.today_steps == 25).await;
    // The message stays visible until the next start.
    assert!(recovered.status.message().is_some());

    session.stop().await;
}

#[tokio::test]
async fn stop_cancels_future_deliveries() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(5));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;
    wait_for(&mut updates, |s| s.today_steps == 5).await;

    session.stop().await;
    let stopped = session.snapshot().await;
    assert_eq!(stopped.status, SessionStatus::Unstarted);
    assert_eq!(stopped.today_steps, 5);

    source.emit(StepReading::Steps(50));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.snapshot().await, stopped);
    assert_eq!(source.live_subscriptions(), 0);
}

#[tokio::test]
async fn restart_keeps_exactly_one_live_subscription() {
    let source = SimulatedPedometer::new();
    source.set_baseline(Ok(1));

    let session = StepSession::new(source.clone());
    let mut updates = session.subscribe();
    session.start().await;
    wait_for(&mut updates, |s| s.today_steps == 1).await;

    source.set_baseline(Ok(2));
    session.start().await;
    wait_for(&mut updates, |s| s.today_steps == 2).await;
    assert_eq!(source.live_subscriptions(), 1);

    source.emit(StepReading::Steps(9));
    wait_for(&mut updates, |s| s.today_steps == 9).await;

    session.stop().await;
}
