use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::classify::segment::Segmenter;
use crate::classify::vegetation::vegetation_percent;
use crate::collect::global_variables::{DEFAULT_REQUEST_DELAY, HEADINGS};
use crate::collect::gsv::image_source::ImageProvider;
use crate::collect::gsv::keys::KeyPool;
use crate::pipeline::records::{read_batch, SampleRecord};
use crate::pipeline::sink::ResultSink;
use crate::pipeline::MEASUREMENT_FAILED;

/// Explicit pipeline configuration; nothing here lives in process-wide
/// globals so concurrent and test-isolated runs stay independent.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory of metadata batch files (one `.txt` file per batch).
    pub metadata_dir: PathBuf,
    /// Directory receiving batch artifacts.
    pub output_dir: PathBuf,
    /// Two-character month codes considered in season.
    pub season_months: HashSet<String>,
    /// Minimum pause before each image request.
    pub request_delay: Duration,
}

impl PipelineConfig {
    pub fn new(metadata_dir: PathBuf, output_dir: PathBuf, season_months: HashSet<String>) -> Self {
        PipelineConfig {
            metadata_dir,
            output_dir,
            season_months,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

/// Outcome counters for one pipeline run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches_skipped: usize,
    pub batches_completed: usize,
    pub batches_failed: usize,
    pub records_scored: usize,
}

/// Drives greenness classification over batches of panorama records.
///
/// Per batch: skip when the artifact already exists, filter records, then
/// score each survivor across the six fixed headings with one credential
/// selected by record index. Failures stay local to their record; the
/// batch artifact only appears once the whole batch is done.
pub struct GreenViewPipeline<P, S> {
    config: PipelineConfig,
    keys: KeyPool,
    provider: P,
    segmenter: S,
}

impl<P: ImageProvider, S: Segmenter> GreenViewPipeline<P, S> {
    pub fn new(config: PipelineConfig, keys: KeyPool, provider: P, segmenter: S) -> Self {
        GreenViewPipeline {
            config,
            keys,
            provider,
            segmenter,
        }
    }

    /// Processes every batch in the metadata directory. Never returns an
    /// error: per-batch failures are logged and counted, and outcomes are
    /// communicated through the artifacts and the summary. Safe to re-invoke
    /// after any interruption.
    pub fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Err(err) = std::fs::create_dir_all(&self.config.output_dir) {
            error!(
                dir = %self.config.output_dir.display(),
                error = %err,
                "cannot create output directory"
            );
            return summary;
        }

        let batches = match self.list_batches() {
            Ok(batches) => batches,
            Err(err) => {
                error!(
                    dir = %self.config.metadata_dir.display(),
                    error = %err,
                    "cannot list metadata batches"
                );
                return summary;
            }
        };

        for batch in &batches {
            let batch_name = match batch.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let artifact = ResultSink::artifact_path(&self.config.output_dir, batch_name);
            if artifact.exists() {
                debug!(artifact = %artifact.display(), "batch already complete, skipping");
                summary.batches_skipped += 1;
                continue;
            }
            match self.process_batch(batch, batch_name) {
                Ok(scored) => {
                    info!(batch = batch_name, records = scored, "batch complete");
                    summary.batches_completed += 1;
                    summary.records_scored += scored;
                }
                Err(err) => {
                    warn!(batch = batch_name, error = %err, "batch failed");
                    summary.batches_failed += 1;
                }
            }
        }
        summary
    }

    fn list_batches(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.config.metadata_dir)
            .with_context(|| format!("Failed to read directory: {:?}", self.config.metadata_dir))?;
        let mut batches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        batches.sort();
        Ok(batches)
    }

    fn process_batch(&self, batch: &Path, batch_name: &str) -> Result<usize> {
        let records = read_batch(batch, &self.config.season_months)?;
        let mut sink = ResultSink::create(&self.config.output_dir, batch_name)?;

        let progress = ProgressBar::new(records.len() as u64);
        for (index, record) in records.iter().enumerate() {
            let key = self.keys.key_for(index);
            let green_view = self.score_record(record, key);
            sink.append(record, green_view)?;
            progress.inc(1);
        }
        progress.finish_and_clear();

        sink.finish()?;
        Ok(records.len())
    }

    /// Average vegetation percentage across the six headings, or the
    /// measurement-failed sentinel as soon as any heading cannot be
    /// acquired. The sentinel overrides any partial sum.
    fn score_record(&self, record: &SampleRecord, key: &str) -> f64 {
        let mut sum = 0.0;
        for &heading in HEADINGS.iter() {
            std::thread::sleep(self.config.request_delay);
            match self.provider.fetch(&record.pano_id, heading, key) {
                Ok(sample) => {
                    let smoothed = self.segmenter.segment(&sample);
                    sum += vegetation_percent(&smoothed);
                }
                Err(err) => {
                    warn!(
                        pano = record.pano_id.as_str(),
                        heading,
                        error = %err,
                        "image acquisition failed, recording sentinel"
                    );
                    return MEASUREMENT_FAILED;
                }
            }
        }
        sum / HEADINGS.len() as f64
    }
}
