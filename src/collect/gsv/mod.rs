pub mod image_source;
pub mod keys;
pub mod metadata;

pub use image_source::{AcquisitionError, GsvImageSource, ImageProvider};
pub use keys::KeyPool;
pub use metadata::{read_points_csv, CbkMetadataSource, MetadataCollector, MetadataSource};
