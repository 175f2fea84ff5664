use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::classify::sample::ImageSample;
use crate::collect::global_variables::{
    FIELD_OF_VIEW, GSV_IMAGE_URL, IMAGE_HEIGHT, IMAGE_WIDTH, PITCH,
};

/// Failure acquiring or decoding one directional crop. Any variant maps to
/// the record-level measurement-failed sentinel in the pipeline.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("invalid image request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("image request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image service returned status {0}")]
    Status(StatusCode),
    #[error("failed to decode image payload: {0}")]
    Decode(#[from] image::ImageError),
}

/// External image source boundary: one crop per (panorama, heading,
/// credential) triple.
pub trait ImageProvider {
    fn fetch(&self, pano_id: &str, heading: u32, key: &str)
        -> Result<ImageSample, AcquisitionError>;
}

/// Blocking HTTP image source against the street-level imagery service.
pub struct GsvImageSource {
    client: Client,
    base_url: String,
    width: u32,
    height: u32,
    fov: u32,
    pitch: i32,
}

impl GsvImageSource {
    pub fn new() -> Self {
        Self::with_base_url(GSV_IMAGE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        GsvImageSource {
            client: Client::new(),
            base_url,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            fov: FIELD_OF_VIEW,
            pitch: PITCH,
        }
    }

    fn request_url(&self, pano_id: &str, heading: u32, key: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("size", format!("{}x{}", self.width, self.height)),
                ("pano", pano_id.to_string()),
                ("fov", self.fov.to_string()),
                ("heading", heading.to_string()),
                ("pitch", self.pitch.to_string()),
                ("key", key.to_string()),
            ],
        )
    }
}

impl Default for GsvImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProvider for GsvImageSource {
    fn fetch(
        &self,
        pano_id: &str,
        heading: u32,
        key: &str,
    ) -> Result<ImageSample, AcquisitionError> {
        let url = self.request_url(pano_id, heading, key)?;
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(AcquisitionError::Status(response.status()));
        }
        let payload = response.bytes()?;
        let decoded = image::load_from_memory(&payload)?;
        Ok(ImageSample::from_rgb(&decoded.to_rgb8()))
    }
}
