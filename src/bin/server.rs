//! Voltrade Server - Headless energy trading engine
//!
//! Runs a single trading session against an hourly generation/consumption
//! dataset and streams every tick record as a JSON line to stdout.
//!
//! # Usage
//! ```sh
//! TICK_INTERVAL_MS=500 cargo run --bin server -- --ticks 24
//! ```
//!
//! # Environment Variables
//! - `FORECASTER` - Forecast backend, 'seasonal' or 'onnx' (default: seasonal)
//! - `DATA_PATH` - Hourly CSV to replay; synthetic data is generated when unset

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;
use voltrade::application::policy::PolicyFactory;
use voltrade::application::session::{SessionConfig, TradingSession};
use voltrade::config::{Config, DEFAULT_CHANNEL_CAPACITY, ForecasterMode};
use voltrade::domain::ports::OneStepForecaster;
use voltrade::infrastructure::{HourlyDataset, OnnxForecaster, SeasonalForecaster};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hourly generation/consumption CSV (overrides DATA_PATH)
    #[arg(long)]
    data: Option<PathBuf>,

    /// ONNX model file (overrides MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Stop after this many tick records. 0 = run until Ctrl+C.
    #[arg(long, default_value_t = 0)]
    ticks: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Setup logging (stdout only)
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();

    info!("Voltrade Server {} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration, CLI flags winning over the environment
    let mut config = Config::from_env()?;
    if let Some(data) = args.data {
        config.data_path = Some(data);
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }
    info!(
        "Configuration loaded: Policy={:?}, Forecaster={:?}, Horizon={}",
        config.policy_mode, config.forecaster, config.forecast_horizon
    );

    let dataset = match &config.data_path {
        Some(path) => HourlyDataset::from_csv_path(path)
            .with_context(|| format!("Failed to load dataset from {}", path.display()))?,
        None => {
            info!("No DATA_PATH set, generating synthetic hourly data");
            HourlyDataset::synthetic(24 * 7)
        }
    };
    info!("Dataset ready: {} hourly records", dataset.len());

    let forecaster: Arc<dyn OneStepForecaster> = match config.forecaster {
        ForecasterMode::Seasonal => Arc::new(SeasonalForecaster::new(config.seed_window_length)),
        ForecasterMode::Onnx => Arc::new(
            OnnxForecaster::load(&config.model_path, config.seed_window_length)
                .context("Failed to load ONNX forecaster")?,
        ),
    };
    info!("Forecaster ready: {}", forecaster.name());

    let policy = PolicyFactory::create(config.policy_mode, &config.to_policy_config());
    let session_config = SessionConfig {
        store: config.build_store()?,
        policy,
        uncertainty: config.build_uncertainty()?,
        horizon: config.forecast_horizon,
        tick_interval: config.tick_interval(),
        min_subscribers: config.min_subscribers,
        channel_capacity: DEFAULT_CHANNEL_CAPACITY,
    };

    let handle = TradingSession::start(session_config, dataset, forecaster)?;
    info!(session = %handle.id(), "Trading session running. Press Ctrl+C to stop.");

    let mut ticks_rx = handle.subscribe();
    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting...");
                break;
            }
            record = ticks_rx.recv() => {
                match record {
                    Ok(record) => {
                        match serde_json::to_string(&record) {
                            Ok(line) => println!("{}", line),
                            Err(e) => warn!("Failed to serialize tick record: {}", e),
                        }
                        seen += 1;
                        if args.ticks > 0 && seen >= args.ticks {
                            info!("Reached {} tick records. Exiting...", args.ticks);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Subscriber lagged, skipped {} tick records", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    handle.stop().await;
    info!("Session stopped cleanly.");

    Ok(())
}
