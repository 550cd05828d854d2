use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::policy::{DecisionContext, DecisionPolicy};
use crate::application::rollout::ForecastRollout;
use crate::application::uncertainty::UncertaintyModel;
use crate::domain::energy::{ForecastPoint, ObservationRecord};
use crate::domain::errors::{InputError, SessionError};
use crate::domain::ports::OneStepForecaster;
use crate::domain::recommendation::Recommendation;
use crate::domain::storage::{EnergyStore, StorageSnapshot};
use crate::infrastructure::dataset::HourlyDataset;

/// One emitted simulation step. `predicted_next` and `recommendation` are
/// absent when the forecast failed for that tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub timestamp: DateTime<Utc>,
    pub observed: ObservationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_next: Option<ForecastPoint>,
    pub storage: StorageSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Result of an out-of-band withdrawal. A rejected purchase is a normal
/// outcome, not an error. The reply carries the post-call total as a bare
/// number, matching the downstream display consumers; the full snapshot
/// stays reachable through [`SessionHandle::storage`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurchaseOutcome {
    #[serde(rename = "success")]
    pub succeeded: bool,
    #[serde(rename = "storage")]
    pub storage_after: f64,
}

/// Everything a session needs beyond the dataset and the forecaster.
pub struct SessionConfig {
    pub store: EnergyStore,
    pub policy: Arc<dyn DecisionPolicy>,
    pub uncertainty: UncertaintyModel,
    pub horizon: usize,
    pub tick_interval: Duration,
    /// Stop the loop when live receivers drop below this; 0 keeps the
    /// loop running unobserved.
    pub min_subscribers: usize,
    pub channel_capacity: usize,
}

pub struct TradingSession;

impl TradingSession {
    /// Validate the config and spawn the tick loop. Fatal conditions are
    /// caught here, before the loop runs; once started, per-tick failures
    /// only skip that tick's recommendation.
    pub fn start(
        config: SessionConfig,
        dataset: HourlyDataset,
        forecaster: Arc<dyn OneStepForecaster>,
    ) -> Result<SessionHandle, SessionError> {
        if dataset.is_empty() {
            return Err(SessionError::EmptyDataset);
        }
        if config.tick_interval.is_zero() {
            return Err(SessionError::ZeroTickInterval {
                millis: config.tick_interval.as_millis() as u64,
            });
        }

        let id = Uuid::new_v4();
        let store = Arc::new(Mutex::new(config.store));
        let (tick_tx, _) = broadcast::channel(config.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session_loop = SessionLoop {
            id,
            dataset,
            forecaster,
            policy: config.policy,
            uncertainty: config.uncertainty,
            rollout: ForecastRollout::new(config.horizon),
            store: Arc::clone(&store),
            tick_tx: tick_tx.clone(),
            shutdown_rx,
            tick_interval: config.tick_interval,
            min_subscribers: config.min_subscribers,
            cursor: 0,
        };
        let task = tokio::spawn(session_loop.run());
        info!(session = %id, "trading session started");

        Ok(SessionHandle {
            id,
            store,
            tick_tx,
            shutdown_tx,
            task,
        })
    }
}

/// Owner-side handle to a running session. Dropping the handle also winds
/// the loop down; `stop` does it deterministically.
pub struct SessionHandle {
    id: Uuid,
    store: Arc<Mutex<EnergyStore>>,
    tick_tx: broadcast::Sender<TickRecord>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TickRecord> {
        self.tick_tx.subscribe()
    }

    pub async fn storage(&self) -> StorageSnapshot {
        self.store.lock().await.snapshot()
    }

    /// Withdraw energy between ticks. The storage lock guarantees the
    /// withdrawal never lands in the middle of a tick.
    pub async fn purchase(&self, amount: f64) -> Result<PurchaseOutcome, InputError> {
        if !amount.is_finite() {
            return Err(InputError::NonFinite {
                field: "amount",
                value: amount,
            });
        }
        if amount < 0.0 {
            return Err(InputError::Negative {
                field: "amount",
                value: amount,
            });
        }

        let mut store = self.store.lock().await;
        let succeeded = store.purchase(amount);
        let outcome = PurchaseOutcome {
            succeeded,
            storage_after: store.total(),
        };
        drop(store);

        if outcome.succeeded {
            info!(
                session = %self.id,
                amount,
                remaining = outcome.storage_after,
                "purchase fulfilled"
            );
        } else {
            info!(
                session = %self.id,
                amount,
                available = outcome.storage_after,
                "purchase rejected, insufficient storage"
            );
        }
        Ok(outcome)
    }

    /// Signal the loop to stop and wait for it to finish its current tick.
    pub async fn stop(self) {
        // The loop may already be gone on its own; both are fine.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(session = %self.id, error = %e, "session task join failed");
        }
    }
}

struct SessionLoop {
    id: Uuid,
    dataset: HourlyDataset,
    forecaster: Arc<dyn OneStepForecaster>,
    policy: Arc<dyn DecisionPolicy>,
    uncertainty: UncertaintyModel,
    rollout: ForecastRollout,
    store: Arc<Mutex<EnergyStore>>,
    tick_tx: broadcast::Sender<TickRecord>,
    shutdown_rx: watch::Receiver<bool>,
    tick_interval: Duration,
    min_subscribers: usize,
    cursor: usize,
}

impl SessionLoop {
    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            session = %self.id,
            records = self.dataset.len(),
            model = self.forecaster.name(),
            policy = self.policy.name(),
            horizon = self.rollout.horizon(),
            "session loop running"
        );

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                    // Checked after the tick so a fresh session gets at
                    // least one tick to pick up its receivers.
                    if self.min_subscribers > 0
                        && self.tick_tx.receiver_count() < self.min_subscribers
                    {
                        info!(session = %self.id, "receivers below minimum, stopping loop");
                        break;
                    }
                }
            }
        }
        info!(session = %self.id, "session loop stopped");
    }

    async fn tick(&mut self) {
        let observed = self.dataset.record(self.cursor);
        let timestamp = self.dataset.timestamp(self.cursor);
        self.cursor = (self.cursor + 1) % self.dataset.len();

        // One lock across the whole tick body: a purchase lands before or
        // after a tick, never inside one.
        let mut store = self.store.lock().await;
        store.update(&observed.generation_pairs(), observed.house_consumption);
        let snapshot = store.snapshot();

        let seed_window = vec![observed; self.forecaster.window_len()];
        let (predicted_next, recommendation) =
            match self.rollout.project(&seed_window, self.forecaster.as_ref()) {
                Ok(forecast) => {
                    let offsets = self.uncertainty.draw(forecast.len());
                    let recommendation = self.policy.decide(&DecisionContext {
                        storage: &snapshot,
                        forecast: &forecast,
                        uncertainty: Some(&offsets),
                    });
                    debug!(
                        session = %self.id,
                        action = %recommendation.action,
                        amount = recommendation.amount,
                        confidence = recommendation.confidence,
                        "tick decided"
                    );
                    (forecast.first().copied(), Some(recommendation))
                }
                Err(e) => {
                    warn!(
                        session = %self.id,
                        error = %e,
                        "prediction failed, emitting observed-only record"
                    );
                    (None, None)
                }
            };
        drop(store);

        let record = TickRecord {
            timestamp,
            observed,
            predicted_next,
            storage: snapshot,
            recommendation,
        };
        // No receivers is fine; the record simply goes unobserved.
        let _ = self.tick_tx.send(record);
    }
}
