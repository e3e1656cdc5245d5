use crate::bucketing::SnapshotGrid;
use crate::catalog::DEFAULT_PARTICLE_CLASS;
use crate::layout::DatasetLayout;

/// Regions `00` .. `39`.
pub fn flares_regions() -> Vec<String> {
    (0..40).map(|r| format!("{r:02}")).collect()
}

/// Everything the pipeline needs, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub layout: DatasetLayout,
    pub grid: SnapshotGrid,
    pub regions: Vec<String>,
    /// Parse log shards; otherwise reuse events already in the store.
    pub read_logs: bool,
    /// Aggregate catalog shards for every snapshot with mergers.
    pub read_catalogs: bool,
    /// Leave output that already exists in the store untouched.
    pub skip_existing: bool,
    pub parallel_regions: bool,
    pub particle_class: String,
}

impl PipelineConfig {
    pub fn new(layout: DatasetLayout) -> Self {
        Self {
            layout,
            grid: SnapshotGrid::flares(),
            regions: flares_regions(),
            read_logs: false,
            read_catalogs: false,
            skip_existing: false,
            parallel_regions: false,
            particle_class: DEFAULT_PARTICLE_CLASS.to_string(),
        }
    }
}
