//! Energy store configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Storage reservoir environment configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub initial_storage: f64,
    pub capacity_max: f64,
    /// Reservoir tags in drain order; a single tag yields a scalar store.
    pub reservoir_priority: Vec<String>,
}

impl StorageEnvConfig {
    pub fn from_env() -> Result<Self> {
        let priority_str =
            env::var("RESERVOIR_PRIORITY").unwrap_or_else(|_| "wind,solar".to_string());
        let reservoir_priority: Vec<String> = priority_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            initial_storage: Self::parse_f64("INITIAL_STORAGE", 15.0)?,
            capacity_max: Self::parse_f64("CAPACITY_MAX", 30.0)?,
            reservoir_priority,
        })
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
