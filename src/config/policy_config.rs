//! Decision policy configuration parsing from environment variables.

use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

use crate::application::policy::PolicyMode;

/// Decision policy environment configuration
#[derive(Debug, Clone)]
pub struct PolicyEnvConfig {
    pub policy_mode: PolicyMode,
    /// Low/high watermarks as fractions of capacity.
    pub low_threshold_pct: f64,
    pub high_threshold_pct: f64,
    pub trade_amount: f64,
    pub cautious_trade_amount: f64,
    /// Sigma of the Gaussian perturbation; 0 disables uncertainty.
    pub uncertainty_sigma: f64,
    /// Fixed seed for replayable uncertainty; absent means a random seed.
    pub uncertainty_seed: Option<u64>,
}

impl Default for PolicyEnvConfig {
    fn default() -> Self {
        Self {
            policy_mode: PolicyMode::Balance,
            low_threshold_pct: 0.5,
            high_threshold_pct: 0.5,
            trade_amount: 5.0,
            cautious_trade_amount: 3.0,
            uncertainty_sigma: 0.01,
            uncertainty_seed: None,
        }
    }
}

impl PolicyEnvConfig {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("POLICY_MODE").unwrap_or_else(|_| "balance".to_string());
        let policy_mode = PolicyMode::from_str(&mode_str).map_err(|e| anyhow::anyhow!(e))?;

        let config = Self {
            policy_mode,
            low_threshold_pct: Self::parse_f64("LOW_THRESHOLD_PCT", 0.5)?,
            high_threshold_pct: Self::parse_f64("HIGH_THRESHOLD_PCT", 0.5)?,
            trade_amount: Self::parse_f64("TRADE_AMOUNT", 5.0)?,
            cautious_trade_amount: Self::parse_f64("CAUTIOUS_TRADE_AMOUNT", 3.0)?,
            uncertainty_sigma: Self::parse_f64("UNCERTAINTY_SIGMA", 0.01)?,
            uncertainty_seed: env::var("UNCERTAINTY_SEED")
                .ok()
                .and_then(|s| s.parse::<u64>().ok()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.trade_amount <= 0.0 {
            bail!("TRADE_AMOUNT must be positive, got {}", self.trade_amount);
        }
        if self.cautious_trade_amount <= 0.0 {
            bail!(
                "CAUTIOUS_TRADE_AMOUNT must be positive, got {}",
                self.cautious_trade_amount
            );
        }
        if !(0.0..=1.0).contains(&self.low_threshold_pct) {
            bail!(
                "LOW_THRESHOLD_PCT must be in [0, 1], got {}",
                self.low_threshold_pct
            );
        }
        if !(0.0..=1.0).contains(&self.high_threshold_pct) {
            bail!(
                "HIGH_THRESHOLD_PCT must be in [0, 1], got {}",
                self.high_threshold_pct
            );
        }
        if self.uncertainty_sigma < 0.0 {
            bail!(
                "UNCERTAINTY_SIGMA must be non-negative, got {}",
                self.uncertainty_sigma
            );
        }
        Ok(())
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
