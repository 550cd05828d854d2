use tracing::debug;

use crate::application::policy::traits::{DecisionContext, DecisionPolicy};
use crate::application::policy::{
    CAUTIOUS_CONFIDENCE_GATE, FULL_CONFIDENCE_GATE, balance_confidence, linear_trend,
    project_trajectory, trajectory_extremes,
};
use crate::domain::recommendation::{Recommendation, StorageStats};

/// Confidence-weighted storage balancing, the canonical policy.
///
/// Projects the storage level across the forecast and trades when the
/// projection leaves the comfortable band:
/// - Projected minimum under the low threshold: buy, full size above the
///   high-confidence gate, reduced size when confidence is middling and
///   the trajectory is draining.
/// - Projected maximum over the high threshold: the mirror image, selling
///   into a filling trajectory.
/// - Otherwise hold.
///
/// Confidence comes from how one-sided the forecast's supply/demand split
/// is; a balanced forecast sits at the floor and never trades.
pub struct BalanceConfidencePolicy {
    low_threshold_pct: f64,
    high_threshold_pct: f64,
    trade_amount: f64,
    cautious_trade_amount: f64,
}

impl BalanceConfidencePolicy {
    pub fn new(
        low_threshold_pct: f64,
        high_threshold_pct: f64,
        trade_amount: f64,
        cautious_trade_amount: f64,
    ) -> Self {
        Self {
            low_threshold_pct,
            high_threshold_pct,
            trade_amount,
            cautious_trade_amount,
        }
    }
}

// Reasons under the cautious gate carry an explicit low-confidence marker.
fn flag_low_confidence(reason: String, confidence: f64) -> String {
    if confidence < CAUTIOUS_CONFIDENCE_GATE {
        format!("{reason} (low confidence)")
    } else {
        reason
    }
}

impl DecisionPolicy for BalanceConfidencePolicy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Recommendation {
        let current = ctx.storage.total;
        let capacity = ctx.storage.capacity_max;
        let trajectory = project_trajectory(ctx.storage, ctx.forecast, ctx.uncertainty);
        let (min_level, max_level) = trajectory_extremes(&trajectory);
        let confidence = balance_confidence(ctx.forecast);
        let trend = linear_trend(&trajectory);
        let stats = StorageStats {
            current,
            min_over_horizon: min_level,
            max_over_horizon: max_level,
        };

        let low = self.low_threshold_pct * capacity;
        let high = self.high_threshold_pct * capacity;

        debug!(
            current,
            min_level, max_level, confidence, trend, "evaluated storage trajectory"
        );

        if current < low && min_level < low {
            let headroom = capacity - current;
            if confidence > FULL_CONFIDENCE_GATE {
                let amount = self.trade_amount.min(headroom);
                if amount > 0.0 {
                    return Recommendation::buy(
                        amount,
                        format!(
                            "buy {amount:.1}: projected minimum {min_level:.1} under the {low:.1} threshold, confidence {confidence:.2}"
                        ),
                    )
                    .with_confidence(confidence)
                    .with_stats(stats);
                }
            } else if confidence > CAUTIOUS_CONFIDENCE_GATE && trend < 0.0 {
                let amount = self.cautious_trade_amount.min(headroom);
                if amount > 0.0 {
                    return Recommendation::buy(
                        amount,
                        format!(
                            "cautious buy {amount:.1}: storage draining toward {min_level:.1}, confidence {confidence:.2}"
                        ),
                    )
                    .with_confidence(confidence)
                    .with_stats(stats);
                }
            }
            return Recommendation::hold(flag_low_confidence(
                format!("hold: storage low but confidence {confidence:.2} too weak to buy"),
                confidence,
            ))
            .with_confidence(confidence)
            .with_stats(stats);
        }

        if current > high && max_level > high {
            if confidence > FULL_CONFIDENCE_GATE {
                let amount = self.trade_amount.min(current);
                if amount > 0.0 {
                    return Recommendation::sell(
                        amount,
                        format!(
                            "sell {amount:.1}: projected maximum {max_level:.1} over the {high:.1} threshold, confidence {confidence:.2}"
                        ),
                    )
                    .with_confidence(confidence)
                    .with_stats(stats);
                }
            } else if confidence > CAUTIOUS_CONFIDENCE_GATE && trend > 0.0 {
                let amount = self.cautious_trade_amount.min(current);
                if amount > 0.0 {
                    return Recommendation::sell(
                        amount,
                        format!(
                            "cautious sell {amount:.1}: storage filling toward {max_level:.1}, confidence {confidence:.2}"
                        ),
                    )
                    .with_confidence(confidence)
                    .with_stats(stats);
                }
            }
            return Recommendation::hold(flag_low_confidence(
                format!("hold: storage high but confidence {confidence:.2} too weak to sell"),
                confidence,
            ))
            .with_confidence(confidence)
            .with_stats(stats);
        }

        Recommendation::hold(flag_low_confidence(
            format!("hold: storage within comfortable range, confidence {confidence:.2}"),
            confidence,
        ))
        .with_confidence(confidence)
        .with_stats(stats)
    }

    fn name(&self) -> &str {
        "balance_confidence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::energy::ForecastPoint;
    use crate::domain::recommendation::TradeAction;
    use crate::domain::storage::{EnergyStore, StorageSnapshot};

    fn policy() -> BalanceConfidencePolicy {
        BalanceConfidencePolicy::new(0.5, 0.5, 5.0, 3.0)
    }

    fn snapshot(level: f64, capacity: f64) -> StorageSnapshot {
        EnergyStore::with_levels(vec![("wind".to_string(), level)], capacity)
            .unwrap()
            .snapshot()
    }

    fn flat_forecast(wind: f64, solar: f64, consumption: f64, hours: usize) -> Vec<ForecastPoint> {
        vec![ForecastPoint::new(wind, solar, consumption); hours]
    }

    fn decide(
        policy: &BalanceConfidencePolicy,
        storage: &StorageSnapshot,
        forecast: &[ForecastPoint],
    ) -> Recommendation {
        policy.decide(&DecisionContext {
            storage,
            forecast,
            uncertainty: None,
        })
    }

    #[test]
    fn test_sustained_deficit_buys_with_high_confidence() {
        // Low storage plus a heavy-demand forecast: supply 5, demand 100.
        let storage = snapshot(5.0, 30.0);
        let forecast = flat_forecast(0.2, 0.3, 10.0, 10);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Buy);
        assert!(rec.confidence >= 0.8);
        assert!(rec.amount > 0.0);
        assert!(storage.total + rec.amount <= storage.capacity_max);
        assert!(rec.storage_stats.min_over_horizon < 15.0);
    }

    #[test]
    fn test_pure_demand_forecast_caps_confidence_and_buys() {
        // Nothing generated, 3 consumed every hour for 5 hours: the
        // imbalance ratio is 1.0 and the confidence cap kicks in.
        let storage = snapshot(2.0, 30.0);
        let forecast = flat_forecast(0.0, 0.0, 3.0, 5);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Buy);
        assert_eq!(rec.confidence, 0.95);
        assert!(rec.amount > 0.0);
        assert!(rec.amount <= storage.capacity_max - storage.total);
        // The projection drains to empty and never recovers.
        assert_eq!(rec.storage_stats.min_over_horizon, 0.0);
        assert_eq!(rec.storage_stats.max_over_horizon, 2.0);
    }

    #[test]
    fn test_balanced_forecast_holds_at_floor_confidence() {
        let storage = snapshot(15.0, 30.0);
        let forecast = flat_forecast(1.0, 1.0, 2.0, 10);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Hold);
        assert_eq!(rec.amount, 0.0);
        assert!((rec.confidence - 0.3).abs() < 1e-9);
        assert!(rec.reason.contains("low confidence"));
    }

    #[test]
    fn test_idle_forecast_holds_with_flat_projection() {
        // No generation and no consumption anywhere in the horizon: the
        // projection never moves and there is no signal to act on.
        let storage = snapshot(5.0, 30.0);
        let forecast = flat_forecast(0.0, 0.0, 0.0, 3);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Hold);
        assert_eq!(rec.amount, 0.0);
        assert_eq!(rec.confidence, 0.3);
        assert_eq!(rec.storage_stats.current, 5.0);
        assert_eq!(rec.storage_stats.min_over_horizon, 5.0);
        assert_eq!(rec.storage_stats.max_over_horizon, 5.0);
    }

    #[test]
    fn test_buy_amount_clamped_to_headroom() {
        // Capacity 6 leaves only 3.5 of headroom; the full 5.0 would overflow.
        let storage = snapshot(2.5, 6.0);
        let forecast = flat_forecast(0.0, 0.0, 2.0, 5);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Buy);
        assert!((rec.amount - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_middling_confidence_with_draining_trend_buys_cautiously() {
        // supply 1.5, demand 8.5 puts confidence at exactly 0.7.
        let storage = snapshot(5.0, 30.0);
        let forecast = flat_forecast(0.1, 0.2, 1.7, 5);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Buy);
        assert!((rec.amount - 3.0).abs() < 1e-9);
        assert!(rec.confidence > 0.6 && rec.confidence <= 0.8);
        assert!(rec.reason.contains("cautious"));
    }

    #[test]
    fn test_surplus_with_high_storage_sells() {
        let storage = snapshot(25.0, 30.0);
        let forecast = flat_forecast(1.5, 0.5, 0.1, 10);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Sell);
        assert!(rec.confidence >= 0.8);
        assert!(rec.amount <= storage.total);
    }

    #[test]
    fn test_low_storage_weak_confidence_holds() {
        // supply 4, demand 6: confidence 0.2 clamps to the 0.3 floor, under
        // every gate, so the low-storage branch falls through to hold.
        let storage = snapshot(5.0, 30.0);
        let forecast = flat_forecast(0.4, 0.4, 1.2, 5);

        let rec = decide(&policy(), &storage, &forecast);

        assert_eq!(rec.action, TradeAction::Hold);
        assert!(rec.reason.contains("too weak"));
        assert!(rec.reason.contains("low confidence"));
    }

    #[test]
    fn test_empty_forecast_holds() {
        let storage = snapshot(5.0, 30.0);

        let rec = decide(&policy(), &storage, &[]);

        assert_eq!(rec.action, TradeAction::Hold);
        assert_eq!(rec.amount, 0.0);
        assert_eq!(rec.storage_stats.min_over_horizon, 5.0);
        assert_eq!(rec.storage_stats.max_over_horizon, 5.0);
    }

    #[test]
    fn test_amount_zero_exactly_when_holding() {
        let contexts = [
            (5.0, flat_forecast(0.2, 0.3, 10.0, 10)),
            (15.0, flat_forecast(1.0, 1.0, 2.0, 10)),
            (25.0, flat_forecast(1.5, 0.5, 0.1, 10)),
            (5.0, flat_forecast(0.4, 0.4, 1.2, 5)),
            (29.0, flat_forecast(0.0, 0.0, 0.0, 10)),
        ];
        for (level, forecast) in contexts {
            let storage = snapshot(level, 30.0);
            let rec = decide(&policy(), &storage, &forecast);
            assert_eq!(
                rec.amount == 0.0,
                rec.action == TradeAction::Hold,
                "level {level}: {:?} with amount {}",
                rec.action,
                rec.amount
            );
            assert!(rec.confidence >= 0.3 && rec.confidence <= 0.95);
        }
    }

    #[test]
    fn test_uncertainty_offsets_shift_the_projection() {
        // A balanced forecast, but pessimistic offsets dragging every hour
        // down. The projection dips even though confidence stays floored.
        let storage = snapshot(5.0, 30.0);
        let forecast = flat_forecast(1.0, 1.0, 2.0, 5);
        let offsets = vec![-2.0; 5];

        let rec = policy().decide(&DecisionContext {
            storage: &storage,
            forecast: &forecast,
            uncertainty: Some(&offsets),
        });

        assert_eq!(rec.storage_stats.min_over_horizon, 0.0);
        // Confidence is about the forecast itself, so the floor holds.
        assert_eq!(rec.action, TradeAction::Hold);
    }
}
