use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bhmerge::config::{PipelineConfig, flares_regions};
use bhmerge::layout::DatasetLayout;
use bhmerge::pipeline::Pipeline;
use bhmerge::store::NpyStore;

mod runtime;

/// Extract black-hole mergers from FLARES logs and gather the merging holes
/// from the subfind particle catalogs.
#[derive(Debug, Parser)]
#[command(name = "bhmerge", version)]
struct Cli {
    /// Dataset root holding the `flares_<region>` directories.
    #[arg(long, env = "BHMERGE_DATA_ROOT")]
    data_root: PathBuf,

    /// Directory for the saved event and catalog arrays.
    #[arg(long, env = "BHMERGE_OUT")]
    out: PathBuf,

    /// Comma-separated region list (default: 00..39).
    #[arg(long, env = "BHMERGE_REGIONS", value_delimiter = ',')]
    regions: Vec<String>,

    /// Parse the blackhole_details logs instead of reusing saved events.
    #[arg(long)]
    read_logs: bool,

    /// Aggregate the particle catalogs of every snapshot with mergers.
    #[arg(long)]
    read_catalogs: bool,

    /// Keep output that already exists instead of recomputing it.
    #[arg(long)]
    skip_existing: bool,

    /// Process regions concurrently.
    #[arg(long)]
    parallel_regions: bool,

    /// Worker threads for --parallel-regions (default: scheduler hints, then all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Particle class key inside the catalog shards.
    #[arg(long, default_value = bhmerge::catalog::DEFAULT_PARTICLE_CLASS)]
    particle_class: String,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(DatasetLayout::new(&self.data_root));
        config.regions = if self.regions.is_empty() {
            flares_regions()
        } else {
            self.regions.clone()
        };
        config.read_logs = self.read_logs;
        config.read_catalogs = self.read_catalogs;
        config.skip_existing = self.skip_existing;
        config.parallel_regions = self.parallel_regions;
        config.particle_class = self.particle_class.clone();
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    if !config.read_logs && !config.read_catalogs {
        warn!("neither --read-logs nor --read-catalogs given; only reporting saved events");
    }
    if config.parallel_regions {
        runtime::configure_thread_pool(cli.threads);
    }

    let store = NpyStore::open(&cli.out)
        .with_context(|| format!("open output dir {}", cli.out.display()))?;
    info!(
        "[run] data={} out={} regions={}",
        config.layout.root().display(),
        store.dir().display(),
        config.regions.len()
    );

    let summary = Pipeline::new(config, &store).run();
    let failed: Vec<&str> = summary.failed().map(|r| r.region.as_str()).collect();
    if !failed.is_empty() {
        bail!("{} region(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
