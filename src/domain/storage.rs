use serde::Serialize;

use crate::domain::errors::SessionError;

/// A single tagged sub-reservoir inside the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservoir {
    pub source: String,
    pub level: f64,
}

/// Read-only copy of the store handed to observers and decision code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSnapshot {
    pub reservoirs: Vec<Reservoir>,
    pub total: f64,
    pub capacity_max: f64,
}

impl StorageSnapshot {
    pub fn level(&self, source: &str) -> Option<f64> {
        self.reservoirs
            .iter()
            .find(|r| r.source == source)
            .map(|r| r.level)
    }
}

/// Bounded energy store backing one trading session.
///
/// Reservoir order is drain priority: consumption and outgoing sales empty
/// the first entry before touching the next. Every mutation keeps each
/// level in `[0, capacity_max]` and the combined total at or below
/// `capacity_max`; generation that would overflow the store is curtailed.
#[derive(Debug, Clone)]
pub struct EnergyStore {
    reservoirs: Vec<Reservoir>,
    capacity_max: f64,
}

impl EnergyStore {
    /// Build a store with `initial` energy split evenly across the tags in
    /// `priority` (first tag drains first).
    pub fn new(priority: &[String], initial: f64, capacity_max: f64) -> Result<Self, SessionError> {
        if priority.is_empty() {
            return Err(SessionError::InvalidConfig {
                reason: "reservoir priority list is empty".to_string(),
            });
        }
        let share = initial / priority.len() as f64;
        let levels: Vec<(String, f64)> = priority.iter().map(|tag| (tag.clone(), share)).collect();
        Self::with_levels(levels, capacity_max)
    }

    /// Build a store with explicit per-reservoir levels, in drain order.
    pub fn with_levels(
        levels: Vec<(String, f64)>,
        capacity_max: f64,
    ) -> Result<Self, SessionError> {
        if levels.is_empty() {
            return Err(SessionError::InvalidConfig {
                reason: "reservoir priority list is empty".to_string(),
            });
        }
        if !capacity_max.is_finite() || capacity_max <= 0.0 {
            return Err(SessionError::InvalidConfig {
                reason: format!("capacity_max must be positive and finite, got {capacity_max}"),
            });
        }

        let mut reservoirs = Vec::with_capacity(levels.len());
        let mut total = 0.0;
        for (source, level) in levels {
            if !level.is_finite() || level < 0.0 {
                return Err(SessionError::InvalidConfig {
                    reason: format!("initial level for '{source}' must be non-negative, got {level}"),
                });
            }
            if reservoirs.iter().any(|r: &Reservoir| r.source == source) {
                return Err(SessionError::InvalidConfig {
                    reason: format!("duplicate reservoir tag '{source}'"),
                });
            }
            total += level;
            reservoirs.push(Reservoir { source, level });
        }
        if total > capacity_max {
            return Err(SessionError::InvalidConfig {
                reason: format!("initial storage {total} exceeds capacity {capacity_max}"),
            });
        }

        Ok(Self {
            reservoirs,
            capacity_max,
        })
    }

    pub fn total(&self) -> f64 {
        self.reservoirs.iter().map(|r| r.level).sum()
    }

    pub fn capacity_max(&self) -> f64 {
        self.capacity_max
    }

    fn headroom(&self) -> f64 {
        (self.capacity_max - self.total()).max(0.0)
    }

    /// Apply one hour of observed generation and consumption.
    ///
    /// Generation is credited per matching tag; energy from a tag with no
    /// reservoir goes to the highest-priority entry, which is what a
    /// single-reservoir store relies on. Credits stop at capacity (surplus
    /// is curtailed) and consumption drains reservoirs in priority order,
    /// clamping at empty when demand outruns the store.
    pub fn update(&mut self, generation: &[(&str, f64)], consumption: f64) {
        let unmatched: f64 = generation
            .iter()
            .filter(|(source, _)| !self.reservoirs.iter().any(|r| r.source == *source))
            .map(|(_, amount)| amount.max(0.0))
            .sum();

        for idx in 0..self.reservoirs.len() {
            let mut credit: f64 = generation
                .iter()
                .filter(|(source, _)| *source == self.reservoirs[idx].source)
                .map(|(_, amount)| amount.max(0.0))
                .sum();
            if idx == 0 {
                credit += unmatched;
            }
            let credit = credit.min(self.headroom());
            self.reservoirs[idx].level += credit;
        }

        let mut remaining = consumption.max(0.0);
        for reservoir in &mut self.reservoirs {
            if remaining <= 0.0 {
                break;
            }
            let drained = reservoir.level.min(remaining);
            reservoir.level -= drained;
            remaining -= drained;
        }
    }

    /// Withdraw `amount` for an external purchase, draining reservoirs in
    /// priority order. Returns `false` and leaves the store untouched when
    /// the total on hand is insufficient.
    pub fn purchase(&mut self, amount: f64) -> bool {
        if !(amount >= 0.0) || amount > self.total() {
            return false;
        }
        let mut remaining = amount;
        for reservoir in &mut self.reservoirs {
            if remaining <= 0.0 {
                break;
            }
            let drained = reservoir.level.min(remaining);
            reservoir.level -= drained;
            remaining -= drained;
        }
        true
    }

    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            reservoirs: self.reservoirs.clone(),
            total: self.total(),
            capacity_max: self.capacity_max,
        }
    }
}
