#[derive(Debug, Clone, PartialEq)]
pub struct TagCount {
    pub tag: String,
    pub redshift: f64,
    pub mergers: usize,
    /// Particles aggregated for this tag; `None` when aggregation did not run.
    pub particles: Option<usize>,
}

/// What happened to one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionReport {
    pub region: String,
    /// Qualifying log lines (0 when events came from the store).
    pub lines: usize,
    pub events: usize,
    /// Events left after the ghost filter and bucketing.
    pub retained: usize,
    pub tags: Vec<TagCount>,
    /// No log shards or saved events were found.
    pub skipped: bool,
    pub error: Option<String>,
}

impl RegionReport {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            ..Self::default()
        }
    }

    pub fn particles(&self) -> usize {
        self.tags.iter().filter_map(|t| t.particles).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub regions: Vec<RegionReport>,
}

impl RunSummary {
    pub fn failed(&self) -> impl Iterator<Item = &RegionReport> {
        self.regions.iter().filter(|r| r.error.is_some())
    }

    pub fn region(&self, region: &str) -> Option<&RegionReport> {
        self.regions.iter().find(|r| r.region == region)
    }

    pub fn total_events(&self) -> usize {
        self.regions.iter().map(|r| r.events).sum()
    }

    pub fn total_retained(&self) -> usize {
        self.regions.iter().map(|r| r.retained).sum()
    }

    pub fn total_particles(&self) -> usize {
        self.regions.iter().map(RegionReport::particles).sum()
    }
}
