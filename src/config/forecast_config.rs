//! Forecasting backend configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::ForecasterMode;

/// Forecaster environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    pub forecaster: ForecasterMode,
    pub model_path: PathBuf,
    pub data_path: Option<PathBuf>,
    /// Observations the model conditions on per prediction.
    pub seed_window_length: usize,
    /// Hours projected per tick.
    pub forecast_horizon: usize,
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let forecaster_str = env::var("FORECASTER").unwrap_or_else(|_| "seasonal".to_string());
        let forecaster = ForecasterMode::from_str(&forecaster_str)?;

        Ok(Self {
            forecaster,
            model_path: PathBuf::from(
                env::var("MODEL_PATH").unwrap_or_else(|_| "models/house_lstm.onnx".to_string()),
            ),
            data_path: env::var("DATA_PATH").ok().map(PathBuf::from),
            seed_window_length: Self::parse_usize("SEED_WINDOW_LENGTH", 24)?,
            forecast_horizon: Self::parse_usize("FORECAST_HORIZON", 10)?,
        })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }
}
