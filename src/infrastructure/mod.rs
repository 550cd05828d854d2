pub mod dataset;
pub mod mock;
pub mod onnx;

pub use dataset::HourlyDataset;
pub use mock::SeasonalForecaster;
pub use onnx::OnnxForecaster;
