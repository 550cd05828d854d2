use crate::domain::energy::ForecastPoint;
use crate::domain::recommendation::Recommendation;
use crate::domain::storage::StorageSnapshot;

/// Everything a policy may inspect when deciding one tick.
pub struct DecisionContext<'a> {
    /// Storage as of this tick.
    pub storage: &'a StorageSnapshot,
    /// Forecast for the coming hours; index 0 is one hour ahead.
    pub forecast: &'a [ForecastPoint],
    /// Per-hour perturbation offsets, same length as `forecast`. `None`
    /// means no uncertainty was drawn this tick.
    pub uncertainty: Option<&'a [f64]>,
}

/// A pure decision rule mapping one tick's context to a recommendation.
///
/// Implementations must be total: every context yields a recommendation,
/// with `Hold` covering quiet or ambiguous markets. Randomness stays
/// outside; the same context always produces the same answer.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Recommendation;

    /// Policy name for logs.
    fn name(&self) -> &str;
}
