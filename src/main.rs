use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rsgvi::classify::segment::{MeanShiftParams, MeanShiftSmoother};
use rsgvi::collect::gsv::image_source::GsvImageSource;
use rsgvi::collect::gsv::keys::KeyPool;
use rsgvi::collect::gsv::metadata::{read_points_csv, CbkMetadataSource, MetadataCollector};
use rsgvi::geometric::green_view::GreenViewLayer;
use rsgvi::pipeline::controller::{GreenViewPipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "rsgvi", about = "Street-level green view index toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect panorama metadata for sample points into batch files
    Metadata {
        /// CSV of sample points with lon/lat columns
        #[arg(long)]
        points: PathBuf,
        /// Directory receiving metadata batch files
        #[arg(long)]
        out: PathBuf,
        /// Sample points per batch file
        #[arg(long, default_value_t = 1000)]
        batch_size: usize,
    },
    /// Score metadata batches and write green view artifacts
    Run {
        /// Directory of metadata batch files
        #[arg(long)]
        metadata: PathBuf,
        /// Directory receiving batch artifacts
        #[arg(long)]
        out: PathBuf,
        /// Key file, one access key per line
        #[arg(long)]
        keys: PathBuf,
        /// Two-digit month codes treated as in season
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "01,02,03,04,05,06,07,08,09,10,11,12"
        )]
        months: Vec<String>,
        /// Minimum pause before each image request, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
    /// Convert green view artifacts into a GeoJSON point layer
    Export {
        /// Artifact file or directory of artifacts
        #[arg(long)]
        results: PathBuf,
        /// Output GeoJSON path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Metadata {
            points,
            out,
            batch_size,
        } => {
            let points = read_points_csv(&points)?;
            info!(count = points.len(), "collecting panorama metadata");
            let collector = MetadataCollector::new(CbkMetadataSource::new(), batch_size);
            let summary = collector.collect(&points, &out)?;
            info!(
                batches_written = summary.batches_written,
                batches_skipped = summary.batches_skipped,
                panoramas_found = summary.panoramas_found,
                sites_skipped = summary.sites_skipped,
                "metadata collection finished"
            );
        }
        Command::Run {
            metadata,
            out,
            keys,
            months,
            delay_ms,
        } => {
            let keys = KeyPool::from_file(&keys)?;
            let season_months: HashSet<String> = months.into_iter().collect();
            let mut config = PipelineConfig::new(metadata, out, season_months);
            config.request_delay = Duration::from_millis(delay_ms);
            let pipeline = GreenViewPipeline::new(
                config,
                keys,
                GsvImageSource::new(),
                MeanShiftSmoother::new(MeanShiftParams::default()),
            );
            let summary = pipeline.run();
            info!(
                batches_completed = summary.batches_completed,
                batches_skipped = summary.batches_skipped,
                batches_failed = summary.batches_failed,
                records_scored = summary.records_scored,
                "green view run finished"
            );
        }
        Command::Export { results, out } => {
            let layer = GreenViewLayer::from_path(&results)?;
            layer.to_geojson(&out)?;
            info!(points = layer.points.len(), out = %out.display(), "wrote GeoJSON layer");
        }
    }
    Ok(())
}
