use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading action recommended for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Projected storage figures attached to every recommendation.
///
/// `current` is the level the projection started from; the min and max are
/// taken over the clamped trajectory including that starting point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub current: f64,
    pub min_over_horizon: f64,
    pub max_over_horizon: f64,
}

impl StorageStats {
    pub fn flat(level: f64) -> Self {
        Self {
            current: level,
            min_over_horizon: level,
            max_over_horizon: level,
        }
    }
}

/// Immutable decision emitted once per tick.
///
/// `amount` is zero exactly when the action is [`TradeAction::Hold`];
/// `confidence` always lands in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: TradeAction,
    pub amount: f64,
    pub confidence: f64,
    pub reason: String,
    #[serde(rename = "storageStats")]
    pub storage_stats: StorageStats,
}

impl Recommendation {
    pub fn buy(amount: f64, reason: impl Into<String>) -> Self {
        debug_assert!(amount > 0.0, "buy amount must be positive");
        Self {
            action: TradeAction::Buy,
            amount,
            confidence: 0.5,
            reason: reason.into(),
            storage_stats: StorageStats::flat(0.0),
        }
    }

    pub fn sell(amount: f64, reason: impl Into<String>) -> Self {
        debug_assert!(amount > 0.0, "sell amount must be positive");
        Self {
            action: TradeAction::Sell,
            amount,
            confidence: 0.5,
            reason: reason.into(),
            storage_stats: StorageStats::flat(0.0),
        }
    }

    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            amount: 0.0,
            confidence: 0.5,
            reason: reason.into(),
            storage_stats: StorageStats::flat(0.0),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_stats(mut self, stats: StorageStats) -> Self {
        self.storage_stats = stats;
        self
    }
}
