use thiserror::Error;

/// Rejections raised when boundary inputs fail validation.
///
/// Invalid values are never coerced into range; the caller gets the field
/// name and offending value back.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Errors raised while producing a multi-hour forecast.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("seed window holds {actual} observations, model expects {expected}")]
    WindowMismatch { expected: usize, actual: usize },

    #[error("model produced a non-finite value at rollout step {step}")]
    NonFinitePrediction { step: usize },

    #[error("prediction backend failed: {reason}")]
    Backend { reason: String },
}

/// Conditions that abort a trading session before its loop starts.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("dataset is empty, nothing to replay")]
    EmptyDataset,

    #[error("tick interval must be positive, got {millis}ms")]
    ZeroTickInterval { millis: u64 },

    #[error("invalid session config: {reason}")]
    InvalidConfig { reason: String },
}
