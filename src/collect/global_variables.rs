use std::time::Duration;

/// Crop size requested from the street-level imagery service.
pub const IMAGE_WIDTH: u32 = 400;
pub const IMAGE_HEIGHT: u32 = 400;

/// Horizontal field of view of one crop, in degrees.
pub const FIELD_OF_VIEW: u32 = 60;

/// Camera pitch of one crop, in degrees.
pub const PITCH: i32 = 0;

/// The six horizontal viewing directions sampled per panorama.
pub const HEADINGS: [u32; 6] = [0, 60, 120, 180, 240, 300];

/// Street-level imagery endpoint.
pub const GSV_IMAGE_URL: &str = "https://maps.googleapis.com/maps/api/streetview";

/// Panorama metadata endpoint (XML).
pub const GSV_METADATA_URL: &str = "http://maps.google.com/cbk";

/// Minimum pause before each external request, to stay inside service
/// rate allowances.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
