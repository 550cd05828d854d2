use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use ort::session::Session;
use tracing::info;

use crate::domain::energy::{ForecastPoint, ObservationRecord};
use crate::domain::errors::ForecastError;
use crate::domain::ports::OneStepForecaster;

// Input features per hour: wind, solar, consumption.
const FEATURES_PER_HOUR: usize = 3;

/// Forecaster backed by the exported LSTM.
///
/// The model takes a `[1, window_len, 3]` f32 tensor of raw hourly values
/// and returns the next hour's three values; input scaling is folded into
/// the exported graph.
pub struct OnnxForecaster {
    session: Mutex<Session>,
    window_len: usize,
}

impl OnnxForecaster {
    pub fn load(path: &Path, window_len: usize) -> Result<Self> {
        if !path.exists() {
            bail!("ONNX model file not found at {}", path.display());
        }
        let session = Session::builder()
            .context("failed to create ONNX session builder")?
            .commit_from_file(path)
            .with_context(|| format!("failed to load ONNX model from {}", path.display()))?;
        info!(model = %path.display(), window_len, "loaded ONNX forecaster");
        Ok(Self {
            session: Mutex::new(session),
            window_len,
        })
    }
}

// Negative output clamps to zero; non-finite values pass through so the
// rollout rejects the step instead of feeding zeros back into the window.
fn non_negative(value: f32) -> f64 {
    let value = value as f64;
    if value < 0.0 { 0.0 } else { value }
}

impl OneStepForecaster for OnnxForecaster {
    fn window_len(&self) -> usize {
        self.window_len
    }

    fn predict_next(&self, window: &[ObservationRecord]) -> Result<ForecastPoint, ForecastError> {
        if window.len() != self.window_len {
            return Err(ForecastError::WindowMismatch {
                expected: self.window_len,
                actual: window.len(),
            });
        }

        let flat: Vec<f32> = window
            .iter()
            .flat_map(|r| {
                [
                    r.p_wind as f32,
                    r.p_solar as f32,
                    r.house_consumption as f32,
                ]
            })
            .collect();
        let shape = vec![1, self.window_len, FEATURES_PER_HOUR];
        let input =
            ort::value::Value::from_array((shape.as_slice(), flat)).map_err(|e| {
                ForecastError::Backend {
                    reason: format!("input tensor: {e}"),
                }
            })?;

        let mut session = self.session.lock().map_err(|_| ForecastError::Backend {
            reason: "model session lock poisoned".to_string(),
        })?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ForecastError::Backend {
                reason: e.to_string(),
            })?;
        let output = outputs
            .iter()
            .next()
            .map(|(_, value)| value)
            .ok_or_else(|| ForecastError::Backend {
                reason: "model returned no outputs".to_string(),
            })?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ForecastError::Backend {
                reason: e.to_string(),
            })?;
        if data.len() < FEATURES_PER_HOUR {
            return Err(ForecastError::Backend {
                reason: format!(
                    "model output has {} values, expected {FEATURES_PER_HOUR}",
                    data.len()
                ),
            });
        }

        Ok(ForecastPoint::new(
            non_negative(data[0]),
            non_negative(data[1]),
            non_negative(data[2]),
        ))
    }

    fn name(&self) -> &str {
        "onnx-lstm"
    }
}
