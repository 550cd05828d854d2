mod balance;
mod fixed_threshold;
mod traits;

pub use balance::BalanceConfidencePolicy;
pub use fixed_threshold::FixedThresholdPolicy;
pub use traits::{DecisionContext, DecisionPolicy};

use statrs::statistics::{Data, Distribution, Max, Min};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::PolicyEnvConfig;
use crate::domain::energy::ForecastPoint;
use crate::domain::storage::StorageSnapshot;

/// Confidence floor; quiet forecasts never report below this.
pub const MIN_CONFIDENCE: f64 = 0.3;

/// Confidence ceiling; even a fully one-sided forecast stays below 1.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Confidence above which the full trade amount is committed.
pub const FULL_CONFIDENCE_GATE: f64 = 0.8;

/// Confidence above which a reduced, trend-confirmed trade is allowed.
pub const CAUTIOUS_CONFIDENCE_GATE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Balance,
    FixedThreshold,
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "balance" => Ok(PolicyMode::Balance),
            "fixed" | "fixed_threshold" => Ok(PolicyMode::FixedThreshold),
            other => Err(format!("unknown policy mode '{other}'")),
        }
    }
}

pub struct PolicyFactory;

impl PolicyFactory {
    pub fn create(mode: PolicyMode, config: &PolicyEnvConfig) -> Arc<dyn DecisionPolicy> {
        match mode {
            PolicyMode::Balance => Arc::new(BalanceConfidencePolicy::new(
                config.low_threshold_pct,
                config.high_threshold_pct,
                config.trade_amount,
                config.cautious_trade_amount,
            )),
            PolicyMode::FixedThreshold => Arc::new(FixedThresholdPolicy::new(
                config.low_threshold_pct,
                config.high_threshold_pct,
                config.trade_amount,
            )),
        }
    }
}

/// Project the storage level across the forecast, clamped to the store's
/// physical bounds at every step. Index 0 is the current level, so the
/// result has one more entry than the forecast.
pub(crate) fn project_trajectory(
    storage: &StorageSnapshot,
    forecast: &[ForecastPoint],
    uncertainty: Option<&[f64]>,
) -> Vec<f64> {
    let mut trajectory = Vec::with_capacity(forecast.len() + 1);
    let mut level = storage.total;
    trajectory.push(level);
    for (i, point) in forecast.iter().enumerate() {
        let offset = uncertainty
            .and_then(|offsets| offsets.get(i))
            .copied()
            .unwrap_or(0.0);
        level = (level + point.net_delta() + offset).clamp(0.0, storage.capacity_max);
        trajectory.push(level);
    }
    trajectory
}

/// Confidence from the supply/demand imbalance over the whole forecast:
/// `|supply - demand| / (supply + demand)`, clamped into
/// [[`MIN_CONFIDENCE`], [`MAX_CONFIDENCE`]]. A forecast with no volume at
/// all reports the floor.
pub(crate) fn balance_confidence(forecast: &[ForecastPoint]) -> f64 {
    let total_supply: f64 = forecast.iter().map(|p| p.total_generation()).sum();
    let total_demand: f64 = forecast.iter().map(|p| p.house_consumption).sum();
    let volume = total_supply + total_demand;
    if volume <= 0.0 {
        return MIN_CONFIDENCE;
    }
    ((total_supply - total_demand).abs() / volume).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Least-squares slope of the trajectory over hour indices. Positive means
/// the store is filling, negative draining.
pub(crate) fn linear_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = Data::new(values.to_vec()).mean().unwrap_or(0.0);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub(crate) fn trajectory_extremes(trajectory: &[f64]) -> (f64, f64) {
    let data = Data::new(trajectory.to_vec());
    (data.min(), data.max())
}
