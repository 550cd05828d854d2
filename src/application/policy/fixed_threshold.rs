use crate::application::policy::traits::{DecisionContext, DecisionPolicy};
use crate::application::policy::{balance_confidence, project_trajectory, trajectory_extremes};
use crate::domain::recommendation::{Recommendation, StorageStats};

/// Threshold-crossing policy without confidence gating, kept for
/// side-by-side comparison against [`BalanceConfidencePolicy`]. Trades a
/// fixed amount whenever the projection crosses a threshold; the balance
/// confidence is still reported so downstream consumers see the same
/// fields from every policy.
pub struct FixedThresholdPolicy {
    low_threshold_pct: f64,
    high_threshold_pct: f64,
    trade_amount: f64,
}

impl FixedThresholdPolicy {
    pub fn new(low_threshold_pct: f64, high_threshold_pct: f64, trade_amount: f64) -> Self {
        Self {
            low_threshold_pct,
            high_threshold_pct,
            trade_amount,
        }
    }
}

impl DecisionPolicy for FixedThresholdPolicy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Recommendation {
        let current = ctx.storage.total;
        let capacity = ctx.storage.capacity_max;
        let trajectory = project_trajectory(ctx.storage, ctx.forecast, ctx.uncertainty);
        let (min_level, max_level) = trajectory_extremes(&trajectory);
        let confidence = balance_confidence(ctx.forecast);
        let stats = StorageStats {
            current,
            min_over_horizon: min_level,
            max_over_horizon: max_level,
        };

        let low = self.low_threshold_pct * capacity;
        let high = self.high_threshold_pct * capacity;

        if min_level < low {
            let amount = self.trade_amount.min(capacity - current);
            if amount > 0.0 {
                return Recommendation::buy(
                    amount,
                    format!("projected minimum {min_level:.1} crosses the {low:.1} floor"),
                )
                .with_confidence(confidence)
                .with_stats(stats);
            }
        } else if max_level > high {
            let amount = self.trade_amount.min(current);
            if amount > 0.0 {
                return Recommendation::sell(
                    amount,
                    format!("projected maximum {max_level:.1} crosses the {high:.1} ceiling"),
                )
                .with_confidence(confidence)
                .with_stats(stats);
            }
        }

        Recommendation::hold("projection stays between thresholds")
            .with_confidence(confidence)
            .with_stats(stats)
    }

    fn name(&self) -> &str {
        "fixed_threshold"
    }
}
