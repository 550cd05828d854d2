//! Session loop configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Session loop environment configuration
#[derive(Debug, Clone)]
pub struct SessionEnvConfig {
    /// One tick equals one simulated hour; default 1s wall clock.
    pub tick_interval_ms: u64,
    /// Stop the loop when receivers drop below this; 0 keeps it running.
    pub min_subscribers: usize,
}

impl SessionEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tick_interval_ms: Self::parse_u64("TICK_INTERVAL_MS", 1000)?,
            min_subscribers: Self::parse_usize("MIN_SUBSCRIBERS", 0)?,
        })
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }
}
