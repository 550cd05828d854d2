use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::broadcast::error::RecvError;
use voltrade::application::policy::BalanceConfidencePolicy;
use voltrade::application::session::{SessionConfig, TradingSession};
use voltrade::application::uncertainty::UncertaintyModel;
use voltrade::domain::energy::{ObservationRecord, SOURCE_SOLAR, SOURCE_WIND};
use voltrade::domain::storage::EnergyStore;
use voltrade::infrastructure::mock::FailingForecaster;
use voltrade::infrastructure::{HourlyDataset, SeasonalForecaster};

fn hourly_dataset(records: Vec<ObservationRecord>) -> HourlyDataset {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| (start + chrono::Duration::hours(i as i64), r))
        .collect();
    HourlyDataset::from_records(rows)
}

fn session_config(initial: f64, interval: Duration) -> SessionConfig {
    let priority = vec![SOURCE_WIND.to_string(), SOURCE_SOLAR.to_string()];
    SessionConfig {
        store: EnergyStore::new(&priority, initial, 30.0).unwrap(),
        policy: Arc::new(BalanceConfidencePolicy::new(0.5, 0.5, 5.0, 3.0)),
        uncertainty: UncertaintyModel::off(),
        horizon: 6,
        tick_interval: interval,
        min_subscribers: 0,
        channel_capacity: 64,
    }
}

/// Generation exactly covers consumption, so the total stays put across ticks.
fn balanced_observation() -> ObservationRecord {
    ObservationRecord::new(1.0, 1.0, 2.0)
}

#[tokio::test]
async fn test_session_emits_records_and_stops_cleanly() {
    // 1. Start a session over a small dataset
    let handle = TradingSession::start(
        session_config(12.0, Duration::from_millis(10)),
        hourly_dataset(vec![
            ObservationRecord::new(2.0, 1.0, 1.5),
            ObservationRecord::new(0.0, 0.5, 3.0),
            ObservationRecord::new(4.0, 2.0, 1.0),
        ]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();
    let mut rx = handle.subscribe();

    // 2. Collect a few records
    let mut records = Vec::new();
    while records.len() < 3 {
        let record = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within deadline")
            .expect("channel open");
        records.push(record);
    }

    // 3. Every record respects the storage bounds and carries a decision
    for record in &records {
        assert!(record.storage.total >= 0.0);
        assert!(record.storage.total <= record.storage.capacity_max);
        let rec = record
            .recommendation
            .as_ref()
            .expect("healthy forecaster should yield a recommendation");
        assert!((0.0..=1.0).contains(&rec.confidence));
    }

    // 4. Stop and drain; the channel must close
    handle.stop().await;
    loop {
        match rx.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

#[tokio::test]
async fn test_failed_forecast_emits_observed_only_records() {
    let handle = TradingSession::start(
        session_config(10.0, Duration::from_millis(10)),
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(FailingForecaster::new(4)),
    )
    .unwrap();
    let mut rx = handle.subscribe();

    // The loop must survive the failing backend and keep emitting
    for _ in 0..3 {
        let record = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within deadline")
            .expect("channel open");
        assert!(record.predicted_next.is_none());
        assert!(record.recommendation.is_none());
        assert_eq!(record.observed, balanced_observation());
    }
    handle.stop().await;
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    // Long interval: after the immediate first tick both loops idle.
    let interval = Duration::from_secs(3600);
    let a = TradingSession::start(
        session_config(10.0, interval),
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();
    let b = TradingSession::start(
        session_config(20.0, interval),
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();
    assert_ne!(a.id(), b.id());

    // Let both loops run their first tick; balanced input leaves totals alone.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let outcome = a.purchase(4.0).await.unwrap();
    assert!(outcome.succeeded);
    assert!((a.storage().await.total - 6.0).abs() < 1e-9);
    assert!(
        (b.storage().await.total - 20.0).abs() < 1e-9,
        "purchase on one session must not touch the other"
    );

    a.stop().await;
    b.stop().await;
}

#[tokio::test]
async fn test_purchase_rejection_preserves_storage() {
    let handle = TradingSession::start(
        session_config(6.0, Duration::from_secs(3600)),
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 1. Asking for 10 out of 6 is rejected and leaves the store alone
    let rejected = handle.purchase(10.0).await.unwrap();
    assert!(!rejected.succeeded);
    assert!((rejected.storage_after - 6.0).abs() < 1e-9);
    assert!((handle.storage().await.total - 6.0).abs() < 1e-9);

    // 2. A feasible purchase then drains normally
    let fulfilled = handle.purchase(4.0).await.unwrap();
    assert!(fulfilled.succeeded);
    assert!((fulfilled.storage_after - 2.0).abs() < 1e-9);

    handle.stop().await;
}

#[tokio::test]
async fn test_dropped_subscriber_does_not_stop_session() {
    let handle = TradingSession::start(
        session_config(10.0, Duration::from_millis(10)),
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();

    let rx1 = handle.subscribe();
    let mut rx2 = handle.subscribe();
    drop(rx1);

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(2), rx2.recv())
            .await
            .expect("session should keep ticking for the remaining subscriber")
            .expect("channel open");
    }
    handle.stop().await;
}

#[tokio::test]
async fn test_min_subscribers_stops_unobserved_loop() {
    let mut config = session_config(10.0, Duration::from_millis(10));
    config.min_subscribers = 1;
    let handle = TradingSession::start(
        config,
        hourly_dataset(vec![balanced_observation()]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();

    // 1. One live subscriber keeps the loop running
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("tick within deadline")
        .expect("channel open");

    // 2. Dropping it lets the loop wind down on a following tick
    drop(rx);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut late = handle.subscribe();
    let silent = tokio::time::timeout(Duration::from_millis(200), late.recv()).await;
    assert!(
        silent.is_err(),
        "loop should have stopped after losing its subscriber"
    );

    handle.stop().await;
}

#[tokio::test]
async fn test_storage_stays_within_bounds_under_deficit() {
    // Heavy consumption, no generation: the store must clamp at empty.
    let handle = TradingSession::start(
        session_config(4.0, Duration::from_millis(10)),
        hourly_dataset(vec![ObservationRecord::new(0.0, 0.0, 3.0)]),
        Arc::new(SeasonalForecaster::new(4)),
    )
    .unwrap();
    let mut rx = handle.subscribe();

    let mut last_total = f64::MAX;
    for _ in 0..4 {
        let record = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within deadline")
            .expect("channel open");
        assert!(record.storage.total >= 0.0);
        assert!(record.storage.total <= last_total);
        last_total = record.storage.total;
    }
    handle.stop().await;
}
