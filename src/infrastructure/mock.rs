use crate::domain::energy::{ForecastPoint, ObservationRecord};
use crate::domain::errors::ForecastError;
use crate::domain::ports::OneStepForecaster;

/// Deterministic stand-in for the exported LSTM, used by tests and as the
/// demo default when no model file is configured.
///
/// Each field is predicted as an exponentially weighted average of the
/// window, so a constant window predicts itself and trends damp toward
/// the recent mean instead of extrapolating forever.
pub struct SeasonalForecaster {
    window_len: usize,
    alpha: f64,
}

impl SeasonalForecaster {
    pub fn new(window_len: usize) -> Self {
        Self {
            window_len,
            alpha: 0.3,
        }
    }

    fn ema<I: Iterator<Item = f64>>(&self, values: I) -> f64 {
        let mut acc: Option<f64> = None;
        for value in values {
            acc = Some(match acc {
                Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
                None => value,
            });
        }
        acc.unwrap_or(0.0)
    }
}

impl OneStepForecaster for SeasonalForecaster {
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
        Ok(ForecastPoint::new(
            self.ema(window.iter().map(|r| r.p_wind)),
            self.ema(window.iter().map(|r| r.p_solar)),
            self.ema(window.iter().map(|r| r.house_consumption)),
        ))
    }

    fn name(&self) -> &str {
        "seasonal-ema"
    }
}

/// Forecaster that always fails, for exercising prediction-failure paths.
pub struct FailingForecaster {
    window_len: usize,
}

impl FailingForecaster {
    pub fn new(window_len: usize) -> Self {
        Self { window_len }
    }
}

impl OneStepForecaster for FailingForecaster {
    fn window_len(&self) -> usize {
        self.window_len
    }

    fn predict_next(&self, _window: &[ObservationRecord]) -> Result<ForecastPoint, ForecastError> {
        Err(ForecastError::Backend {
            reason: "backend offline".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}
