use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::persist::{load_events, save_catalog, save_events};
use super::report::{RegionReport, RunSummary, TagCount};
use crate::bucketing::bucket;
use crate::catalog::aggregate;
use crate::config::PipelineConfig;
use crate::logs::{LogShard, MergerEvent, parse, to_events};
use crate::store::{ArrayStore, StoreError};

/// Runs parse -> bucket -> aggregate for every configured region.
pub struct Pipeline<'s, S: ArrayStore + ?Sized> {
    config: PipelineConfig,
    store: &'s S,
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} regions {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Shard name and text of every readable log file; unreadable ones are reported.
fn read_log_texts(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match fs::read(path) {
                Ok(bytes) => Some((name, String::from_utf8_lossy(&bytes).into_owned())),
                Err(err) => {
                    warn!("[logs] skipping {}: {err}", path.display());
                    None
                }
            }
        })
        .collect()
}

impl<'s, S: ArrayStore + ?Sized> Pipeline<'s, S> {
    pub fn new(config: PipelineConfig, store: &'s S) -> Self {
        Self { config, store }
    }

    pub fn run(&self) -> RunSummary {
        let t0 = Instant::now();
        let grid = &self.config.grid;
        info!(
            "[run] {} snapshots z={}..{}, low-z cutoff {}",
            grid.specs().len(),
            grid.specs()[0].redshift,
            grid.specs()[grid.specs().len() - 1].redshift,
            grid.low_z_cutoff()
        );
        let pb = progress_bar(self.config.regions.len());

        let one = |region: &String| {
            pb.set_message(format!("region={region}"));
            let report = self.run_region(region);
            pb.inc(1);
            report
        };
        let regions: Vec<RegionReport> = if self.config.parallel_regions {
            self.config.regions.par_iter().map(&one).collect()
        } else {
            self.config.regions.iter().map(&one).collect()
        };
        pb.finish_and_clear();

        let summary = RunSummary { regions };
        info!(
            "[run] regions={} events={} retained={} particles={} failed={} wall={:.3}s",
            summary.regions.len(),
            summary.total_events(),
            summary.total_retained(),
            summary.total_particles(),
            summary.failed().count(),
            t0.elapsed().as_secs_f64()
        );
        summary
    }

    /// Never fails: errors end up in the report so the batch keeps going.
    pub fn run_region(&self, region: &str) -> RegionReport {
        let t0 = Instant::now();
        let mut report = RegionReport::new(region);
        if let Err(err) = self.process_region(region, &mut report) {
            warn!("[region {region}] failed: {err:#}");
            report.error = Some(format!("{err:#}"));
        }
        debug!("[region {region}] done in {:.3}s", t0.elapsed().as_secs_f64());
        report
    }

    fn process_region(&self, region: &str, report: &mut RegionReport) -> Result<()> {
        let Some(events) = self.region_events(region, report)? else {
            report.skipped = true;
            return Ok(());
        };
        report.events = events.len();

        let grid = &self.config.grid;
        let assignment = bucket(&events, grid);
        report.retained = assignment.len();
        if assignment.is_empty() {
            info!("[region {region}] no mergers on the snapshot grid ({} events)", events.len());
            return Ok(());
        }

        for (spec, mergers) in assignment.counts(grid) {
            info!(
                "[region {region}] found {mergers} black hole mergers at redshift {} ({})",
                spec.redshift, spec.tag
            );
            let mut entry = TagCount {
                tag: spec.tag.clone(),
                redshift: spec.redshift,
                mergers,
                particles: None,
            };
            if self.config.read_catalogs {
                entry.particles = self.catalog_for(region, spec.redshift, &spec.tag)?;
            }
            report.tags.push(entry);
        }
        Ok(())
    }

    /// Events of `region`, parsed from its logs or reloaded from the store.
    /// `None` when the region has neither.
    fn region_events(
        &self,
        region: &str,
        report: &mut RegionReport,
    ) -> Result<Option<Vec<MergerEvent>>> {
        let saved = self.config.skip_existing && self.store.exists_for(region, None);
        if !self.config.read_logs || saved {
            if saved {
                info!("[region {region}] events already saved, reusing them");
            }
            return match load_events(self.store, region) {
                Ok(events) => Ok(Some(events)),
                Err(StoreError::NotFound { key }) => {
                    info!("[region {region}] no saved events ({key}), skipping");
                    Ok(None)
                }
                Err(err) => Err(err).with_context(|| format!("load events for region {region}")),
            };
        }

        let paths = self.config.layout.log_shards(region)?;
        if paths.is_empty() {
            warn!(
                "[region {region}] no log shards under {}, skipping",
                self.config.layout.log_dir(region).display()
            );
            return Ok(None);
        }
        info!("[region {region}] parsing {} log shards", paths.len());

        let texts = read_log_texts(&paths);
        let tokens = parse(texts.iter().map(|(name, contents)| LogShard { name, contents }));
        report.lines = tokens.len();
        let events = to_events(&tokens);

        save_events(self.store, region, &events)
            .with_context(|| format!("save events for region {region}"))?;
        Ok(Some(events))
    }

    /// Aggregates and saves the catalog of one snapshot; returns the particle
    /// count, or `None` when nothing was (re)computed.
    fn catalog_for(&self, region: &str, redshift: f64, tag: &str) -> Result<Option<usize>> {
        if self.config.skip_existing && self.store.exists_for(region, Some(redshift)) {
            info!("[region {region}] z={redshift} already aggregated, keeping it");
            return Ok(None);
        }

        let shards = self.config.layout.catalog_shards(region, tag)?;
        if shards.is_empty() {
            warn!(
                "[region {region}] no catalog shards under {}",
                self.config.layout.catalog_dir(region, tag).display()
            );
            return Ok(None);
        }

        let catalog = aggregate(region, tag, &shards, &self.config.particle_class);
        save_catalog(self.store, region, redshift, &catalog)
            .with_context(|| format!("save catalog for region {region} z={redshift}"))?;
        Ok(Some(catalog.len()))
    }
}
