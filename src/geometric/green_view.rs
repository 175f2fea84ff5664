use anyhow::{Context, Result};
use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::pipeline::records::SampleRecord;

/// One scored panorama ready for vector export.
#[derive(Debug, Clone, PartialEq)]
pub struct GreenViewPoint {
    pub pano_id: String,
    pub pano_date: String,
    pub location: Point<f64>,
    pub green_view: f64,
}

/// Point layer assembled from batch artifacts.
///
/// Sentinel and otherwise negative scores are dropped (they mark failed
/// measurements, not low greenery), as are duplicate pano ids; the first
/// occurrence wins.
#[derive(Debug, Default)]
pub struct GreenViewLayer {
    pub points: Vec<GreenViewPoint>,
}

impl GreenViewLayer {
    /// Reads a single artifact file or every `.txt` artifact in a directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut layer = GreenViewLayer::default();
        let mut seen = HashSet::new();
        if path.is_dir() {
            let mut files: Vec<_> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {:?}", path))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
                .collect();
            files.sort();
            for file in files {
                layer.read_artifact(&file, &mut seen)?;
            }
        } else {
            layer.read_artifact(path, &mut seen)?;
        }
        Ok(layer)
    }

    fn read_artifact(&mut self, path: &Path, seen: &mut HashSet<String>) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact: {:?}", path))?;
        for line in content.lines() {
            let (record, green_view) = match parse_result_line(line) {
                Some(parsed) => parsed,
                None => continue,
            };
            if green_view < 0.0 {
                debug!(pano = record.pano_id.as_str(), "skipping failed measurement");
                continue;
            }
            let (lon, lat) = match (
                record.longitude.parse::<f64>(),
                record.latitude.parse::<f64>(),
            ) {
                (Ok(lon), Ok(lat)) => (lon, lat),
                _ => continue,
            };
            if !seen.insert(record.pano_id.clone()) {
                continue;
            }
            self.points.push(GreenViewPoint {
                pano_id: record.pano_id,
                pano_date: record.pano_date,
                location: Point::new(lon, lat),
                green_view,
            });
        }
        Ok(())
    }

    /// Serializes the layer as a GeoJSON FeatureCollection of points with
    /// `panoID`, `panoDate`, and `greenView` properties.
    pub fn to_geojson(&self, path: &Path) -> Result<()> {
        let features = self
            .points
            .iter()
            .map(|point| {
                let mut properties = serde_json::Map::new();
                properties.insert(
                    "panoID".to_string(),
                    serde_json::Value::String(point.pano_id.clone()),
                );
                properties.insert(
                    "panoDate".to_string(),
                    serde_json::Value::String(point.pano_date.clone()),
                );
                properties.insert("greenView".to_string(), serde_json::json!(point.green_view));
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![
                        point.location.x(),
                        point.location.y(),
                    ]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        let geojson = GeoJson::from(collection);
        std::fs::write(path, geojson.to_string())
            .with_context(|| format!("Failed to write GeoJSON file: {:?}", path))
    }
}

/// Splits an output record line back into its record and green view value.
/// Lines missing the expected markers yield `None`.
fn parse_result_line(line: &str) -> Option<(SampleRecord, f64)> {
    if !line.contains("panoDate") || !line.contains("greenview") {
        return None;
    }
    let (record_part, value_part) = line.rsplit_once(", greenview:")?;
    let record = SampleRecord::parse(record_part)?;
    let green_view = value_part.trim().parse::<f64>().ok()?;
    Some((record, green_view))
}
