//! Where a region's log and catalog shards live under the dataset root.
//!
//! ```text
//! <root>/flares_<region>/data/blackhole_details/blackhole_details_<n>.txt
//! <root>/flares_<region>/data/particledata_<tag>/eagle_subfind_particles_<tag>.<n>.npz
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "blackhole_details_";
const CATALOG_PREFIX: &str = "eagle_subfind_particles_";

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn region_dir(&self, region: &str) -> PathBuf {
        self.root.join(format!("flares_{region}")).join("data")
    }

    pub fn log_dir(&self, region: &str) -> PathBuf {
        self.region_dir(region).join("blackhole_details")
    }

    pub fn catalog_dir(&self, region: &str, tag: &str) -> PathBuf {
        self.region_dir(region).join(format!("particledata_{tag}"))
    }

    pub fn log_shards(&self, region: &str) -> Result<Vec<PathBuf>> {
        list_shards(&self.log_dir(region), LOG_PREFIX, None)
    }

    pub fn catalog_shards(&self, region: &str, tag: &str) -> Result<Vec<PathBuf>> {
        let prefix = format!("{CATALOG_PREFIX}{tag}.");
        list_shards(&self.catalog_dir(region, tag), &prefix, Some("npz"))
    }
}

/// Regular files in `dir` named `prefix*[.ext]`, sorted by name.
/// A missing directory lists as empty.
fn list_shards(dir: &Path, prefix: &str, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("list {}", dir.display())),
    };

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        if let Some(ext) = ext {
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
        }
        out.push(path);
    }
    out.sort();
    Ok(out)
}
