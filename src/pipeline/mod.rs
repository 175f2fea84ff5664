pub mod controller;
pub mod records;
pub mod sink;

pub use controller::{GreenViewPipeline, PipelineConfig, RunSummary};
pub use sink::ResultSink;

/// Sentinel green view value marking "could not be measured", distinct from
/// a valid 0% measurement.
pub const MEASUREMENT_FAILED: f64 = -1000.0;
