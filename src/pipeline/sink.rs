use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::pipeline::records::SampleRecord;

/// Prefix turning a batch file name into its artifact name.
const ARTIFACT_PREFIX: &str = "GV_";

/// Writer for one batch artifact.
///
/// Output accumulates in a temporary file inside the output directory and
/// only lands at the artifact path on `finish`, so an interrupted batch
/// leaves no artifact and reruns wholesale. The artifact's existence is the
/// batch's completion marker.
pub struct ResultSink {
    file: NamedTempFile,
    path: PathBuf,
}

impl ResultSink {
    /// Deterministic artifact path for a batch file name.
    pub fn artifact_path(output_dir: &Path, batch_name: &str) -> PathBuf {
        output_dir.join(format!("{}{}", ARTIFACT_PREFIX, batch_name))
    }

    pub fn create(output_dir: &Path, batch_name: &str) -> Result<Self> {
        let file = NamedTempFile::new_in(output_dir)
            .context("Failed to create temporary artifact file")?;
        Ok(ResultSink {
            file,
            path: Self::artifact_path(output_dir, batch_name),
        })
    }

    /// Appends one output record line:
    /// `panoID: <id> panoDate: <date> longitude: <lon> latitude: <lat>, greenview: <value>`.
    pub fn append(&mut self, record: &SampleRecord, green_view: f64) -> Result<()> {
        writeln!(
            self.file,
            "panoID: {} panoDate: {} longitude: {} latitude: {}, greenview: {}",
            record.pano_id, record.pano_date, record.longitude, record.latitude, green_view
        )
        .context("Failed to append to artifact")
    }

    /// Renames the temporary file to the artifact path, completing the batch.
    pub fn finish(self) -> Result<PathBuf> {
        let path = self.path;
        self.file
            .persist(&path)
            .with_context(|| format!("Failed to persist artifact: {:?}", path))?;
        Ok(path)
    }
}
