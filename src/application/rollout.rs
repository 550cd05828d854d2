use crate::domain::energy::{ForecastPoint, ObservationRecord};
use crate::domain::errors::ForecastError;
use crate::domain::ports::OneStepForecaster;

/// Rolls a one-step forecaster forward over multiple hours.
///
/// Each step conditions on the window as it stands, so predictions feed
/// the following predictions. The seed window must match the model's
/// window length exactly; padding or truncating would hand the model a
/// window it was never trained on.
pub struct ForecastRollout {
    horizon: usize,
}

impl ForecastRollout {
    pub fn new(horizon: usize) -> Self {
        Self { horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Produce `horizon` forecast points, one per future hour.
    ///
    /// A zero horizon yields an empty forecast. Non-finite model output
    /// aborts the whole rollout rather than polluting later steps.
    pub fn project(
        &self,
        seed_window: &[ObservationRecord],
        forecaster: &dyn OneStepForecaster,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let expected = forecaster.window_len();
        if seed_window.len() != expected {
            return Err(ForecastError::WindowMismatch {
                expected,
                actual: seed_window.len(),
            });
        }

        let mut window = seed_window.to_vec();
        let mut forecast = Vec::with_capacity(self.horizon);
        for step in 0..self.horizon {
            let point = forecaster.predict_next(&window)?;
            if !point.is_finite() {
                return Err(ForecastError::NonFinitePrediction { step });
            }
            if !window.is_empty() {
                window.remove(0);
                window.push(point.as_observation());
            }
            forecast.push(point);
        }
        Ok(forecast)
    }
}
