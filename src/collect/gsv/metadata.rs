use anyhow::{bail, Context, Result};
use geo::Point;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::collect::global_variables::{DEFAULT_REQUEST_DELAY, GSV_METADATA_URL};
use crate::pipeline::records::SampleRecord;

/// Panorama lookup boundary: the nearest panorama's record for a sample
/// point, or `None` when the service has no coverage there.
pub trait MetadataSource {
    fn lookup(&self, point: &Point<f64>) -> Result<Option<SampleRecord>>;
}

/// XML metadata endpoint client.
pub struct CbkMetadataSource {
    client: Client,
    base_url: String,
}

impl CbkMetadataSource {
    pub fn new() -> Self {
        Self::with_base_url(GSV_METADATA_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        CbkMetadataSource {
            client: Client::new(),
            base_url,
        }
    }
}

impl Default for CbkMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for CbkMetadataSource {
    fn lookup(&self, point: &Point<f64>) -> Result<Option<SampleRecord>> {
        let ll = format!("{},{}", point.y(), point.x());
        let url = Url::parse_with_params(
            &self.base_url,
            &[("output", "xml".to_string()), ("ll", ll)],
        )
        .context("Failed to build metadata request url")?;

        let response = self
            .client
            .get(url)
            .send()
            .context("Failed to send metadata request")?;
        if !response.status().is_success() {
            bail!("Metadata service returned status {}", response.status());
        }
        let body = response
            .text()
            .context("Failed to read metadata response body")?;
        parse_panorama_xml(&body)
    }
}

/// Panorama document returned by the XML endpoint. Sites without coverage
/// come back as an empty `<panorama/>` element.
#[derive(Debug, Deserialize)]
struct PanoramaDoc {
    data_properties: Option<DataProperties>,
}

#[derive(Debug, Deserialize)]
struct DataProperties {
    #[serde(rename = "@image_date")]
    image_date: Option<String>,
    #[serde(rename = "@pano_id")]
    pano_id: Option<String>,
    #[serde(rename = "@lat")]
    lat: Option<String>,
    #[serde(rename = "@lng")]
    lng: Option<String>,
}

fn parse_panorama_xml(xml: &str) -> Result<Option<SampleRecord>> {
    let doc: PanoramaDoc =
        quick_xml::de::from_str(xml).context("Failed to parse panorama metadata XML")?;
    let props = match doc.data_properties {
        Some(props) => props,
        None => return Ok(None),
    };
    match (props.pano_id, props.image_date, props.lng, props.lat) {
        (Some(pano_id), Some(pano_date), Some(longitude), Some(latitude)) => {
            Ok(Some(SampleRecord {
                pano_id,
                pano_date,
                longitude,
                latitude,
            }))
        }
        _ => Ok(None),
    }
}

/// Per-run counters for a metadata collection pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub batches_written: usize,
    pub batches_skipped: usize,
    pub panoramas_found: usize,
    pub sites_skipped: usize,
}

/// Walks sample points in fixed-size batches and writes one record file per
/// batch. A batch file that already exists is left untouched, so interrupted
/// collections resume at batch granularity and disjoint point sets can be
/// collected by independent processes.
pub struct MetadataCollector<M: MetadataSource> {
    source: M,
    batch_size: usize,
    request_delay: Duration,
}

impl<M: MetadataSource> MetadataCollector<M> {
    pub fn new(source: M, batch_size: usize) -> Self {
        MetadataCollector {
            source,
            batch_size: batch_size.max(1),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    pub fn collect(&self, points: &[Point<f64>], out_dir: &Path) -> Result<CollectSummary> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

        let mut summary = CollectSummary::default();
        for (batch_index, batch) in points.chunks(self.batch_size).enumerate() {
            let start = batch_index * self.batch_size;
            let end = start + batch.len();
            let path = out_dir.join(format!("Pnt_start{}_end{}.txt", start, end));
            if path.exists() {
                debug!(path = %path.display(), "batch file exists, skipping");
                summary.batches_skipped += 1;
                continue;
            }

            let mut file = tempfile::NamedTempFile::new_in(out_dir)
                .context("Failed to create temporary batch file")?;
            for point in batch {
                std::thread::sleep(self.request_delay);
                match self.source.lookup(point) {
                    Ok(Some(record)) => {
                        writeln!(file, "{}", record.to_metadata_line())?;
                        summary.panoramas_found += 1;
                    }
                    Ok(None) => {
                        debug!(lon = point.x(), lat = point.y(), "no panorama at site");
                        summary.sites_skipped += 1;
                    }
                    Err(err) => {
                        warn!(lon = point.x(), lat = point.y(), error = %err, "metadata lookup failed");
                        summary.sites_skipped += 1;
                    }
                }
            }
            file.persist(&path)
                .with_context(|| format!("Failed to persist batch file: {:?}", path))?;
            info!(path = %path.display(), "wrote metadata batch");
            summary.batches_written += 1;
        }
        Ok(summary)
    }
}

/// Sample points arrive as a CSV with `lon`/`lat` columns; the geometric
/// sampling that produces them stays outside this crate.
pub fn read_points_csv(path: &Path) -> Result<Vec<Point<f64>>> {
    #[derive(Debug, Deserialize)]
    struct PointRow {
        #[serde(alias = "longitude")]
        lon: f64,
        #[serde(alias = "latitude")]
        lat: f64,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open points file: {:?}", path))?;
    let mut points = Vec::new();
    for row in reader.deserialize() {
        let row: PointRow = row.context("Failed to parse point row")?;
        points.push(Point::new(row.lon, row.lat));
    }
    Ok(points)
}
