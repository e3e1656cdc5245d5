use std::path::PathBuf;
use tracing::{debug, warn};

use super::io::{read_shard, shard_label};
use super::types::ParticleCatalog;

/// Scans `shards` in order and concatenates the `class` particles of each.
///
/// Shards without the class are skipped silently; shards that cannot be read
/// are reported and skipped. No qualifying shard yields an empty catalog.
pub fn aggregate(region: &str, tag: &str, shards: &[PathBuf], class: &str) -> ParticleCatalog {
    let mut catalog = ParticleCatalog::default();
    let mut used = 0usize;
    for path in shards {
        match read_shard(path, class) {
            Ok(Some(cols)) => {
                used += 1;
                catalog.push_shard(&shard_label(path), cols);
            }
            Ok(None) => debug!("[catalog] {}: no {class}", path.display()),
            Err(err) => warn!("[catalog] region {region} {tag}: skipping shard: {err:#}"),
        }
    }
    debug!(
        "[catalog] region {region} {tag}: {} {class} particles from {used}/{} shards",
        catalog.len(),
        shards.len()
    );
    catalog
}
