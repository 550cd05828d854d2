//! Configuration module for voltrade.
//!
//! This module provides structured configuration loading from environment
//! variables, organized by concern: Storage, Forecast, Policy, and Session.

mod forecast_config;
mod policy_config;
mod session_config;
mod storage_config;

pub use forecast_config::ForecastEnvConfig;
pub use policy_config::PolicyEnvConfig;
pub use session_config::SessionEnvConfig;
pub use storage_config::StorageEnvConfig;

use crate::application::policy::PolicyMode;
use crate::application::uncertainty::UncertaintyModel;
use crate::domain::storage::EnergyStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default broadcast capacity for tick records.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Forecasting backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecasterMode {
    Seasonal,
    Onnx,
}

impl FromStr for ForecasterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seasonal" => Ok(ForecasterMode::Seasonal),
            "onnx" => Ok(ForecasterMode::Onnx),
            _ => anyhow::bail!("Invalid FORECASTER: {}. Must be 'seasonal' or 'onnx'", s),
        }
    }
}

/// Main application configuration.
///
/// This struct aggregates all configuration from sub-modules and provides
/// flat field access for the rest of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage (from StorageEnvConfig)
    pub initial_storage: f64,
    pub capacity_max: f64,
    pub reservoir_priority: Vec<String>,

    // Forecast (from ForecastEnvConfig)
    pub forecaster: ForecasterMode,
    pub model_path: PathBuf,
    pub data_path: Option<PathBuf>,
    pub seed_window_length: usize,
    pub forecast_horizon: usize,

    // Policy (from PolicyEnvConfig)
    pub policy_mode: PolicyMode,
    pub low_threshold_pct: f64,
    pub high_threshold_pct: f64,
    pub trade_amount: f64,
    pub cautious_trade_amount: f64,
    pub uncertainty_sigma: f64,
    pub uncertainty_seed: Option<u64>,

    // Session (from SessionEnvConfig)
    pub tick_interval_ms: u64,
    pub min_subscribers: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This orchestrates loading from all sub-config modules and composes
    /// them into a unified Config struct.
    pub fn from_env() -> Result<Self> {
        let storage = StorageEnvConfig::from_env().context("Failed to load storage config")?;
        let forecast = ForecastEnvConfig::from_env().context("Failed to load forecast config")?;
        let policy = PolicyEnvConfig::from_env().context("Failed to load policy config")?;
        let session = SessionEnvConfig::from_env().context("Failed to load session config")?;

        Ok(Self {
            // Storage
            initial_storage: storage.initial_storage,
            capacity_max: storage.capacity_max,
            reservoir_priority: storage.reservoir_priority,

            // Forecast
            forecaster: forecast.forecaster,
            model_path: forecast.model_path,
            data_path: forecast.data_path,
            seed_window_length: forecast.seed_window_length,
            forecast_horizon: forecast.forecast_horizon,

            // Policy
            policy_mode: policy.policy_mode,
            low_threshold_pct: policy.low_threshold_pct,
            high_threshold_pct: policy.high_threshold_pct,
            trade_amount: policy.trade_amount,
            cautious_trade_amount: policy.cautious_trade_amount,
            uncertainty_sigma: policy.uncertainty_sigma,
            uncertainty_seed: policy.uncertainty_seed,

            // Session
            tick_interval_ms: session.tick_interval_ms,
            min_subscribers: session.min_subscribers,
        })
    }

    /// Recompose the policy sub-config for the policy factory.
    pub fn to_policy_config(&self) -> PolicyEnvConfig {
        PolicyEnvConfig {
            policy_mode: self.policy_mode,
            low_threshold_pct: self.low_threshold_pct,
            high_threshold_pct: self.high_threshold_pct,
            trade_amount: self.trade_amount,
            cautious_trade_amount: self.cautious_trade_amount,
            uncertainty_sigma: self.uncertainty_sigma,
            uncertainty_seed: self.uncertainty_seed,
        }
    }

    /// Build the energy store this config describes.
    pub fn build_store(&self) -> Result<EnergyStore> {
        EnergyStore::new(
            &self.reservoir_priority,
            self.initial_storage,
            self.capacity_max,
        )
        .map_err(|e| anyhow::anyhow!("Invalid storage config: {}", e))
    }

    /// Build the uncertainty model; a zero sigma turns it off entirely.
    pub fn build_uncertainty(&self) -> Result<UncertaintyModel> {
        if self.uncertainty_sigma == 0.0 {
            return Ok(UncertaintyModel::off());
        }
        let seed = self.uncertainty_seed.unwrap_or_else(rand::random);
        UncertaintyModel::gaussian(self.uncertainty_sigma, seed)
            .map_err(|e| anyhow::anyhow!("Invalid uncertainty config: {}", e))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
