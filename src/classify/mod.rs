pub mod sample;
pub mod segment;
pub mod threshold;
pub mod vegetation;

pub use sample::ImageSample;
pub use segment::{MeanShiftParams, MeanShiftSmoother, NoSegmentation, Segmenter};
pub use threshold::otsu_threshold;
pub use vegetation::vegetation_percent;
