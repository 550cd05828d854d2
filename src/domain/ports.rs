use crate::domain::energy::{ForecastPoint, ObservationRecord};
use crate::domain::errors::ForecastError;

/// One-step-ahead prediction supplied by an external model.
///
/// Implementations receive a fixed-length window of past observations and
/// return the predicted next hour. Callers must pass exactly
/// [`window_len`](OneStepForecaster::window_len) records; anything else is a
/// [`ForecastError::WindowMismatch`].
pub trait OneStepForecaster: Send + Sync {
    /// Number of observations the model conditions on.
    fn window_len(&self) -> usize;

    /// Predict the hour immediately after the window.
    fn predict_next(&self, window: &[ObservationRecord]) -> Result<ForecastPoint, ForecastError>;

    /// Model name for logs.
    fn name(&self) -> &str;
}
