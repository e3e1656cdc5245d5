//! Assignment of merger events to the snapshot grid.

use ahash::AHashMap;
use anyhow::{Result, bail};

use crate::logs::MergerEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSpec {
    pub redshift: f64,
    pub tag: String,
}

/// Ordered snapshot grid. Spacing is whole redshifts except for the first
/// gap, so everything at or below `low_z_cutoff` belongs to the first entry.
#[derive(Debug, Clone)]
pub struct SnapshotGrid {
    specs: Vec<SnapshotSpec>,
    low_z_cutoff: f64,
}

const FLARES_SNAPSHOTS: [(f64, &str); 12] = [
    (4.77, "011_z004p770"),
    (5.00, "010_z005p000"),
    (6.00, "009_z006p000"),
    (7.00, "008_z007p000"),
    (8.00, "007_z008p000"),
    (9.00, "006_z009p000"),
    (10.00, "005_z010p000"),
    (11.00, "004_z011p000"),
    (12.00, "003_z012p000"),
    (13.00, "002_z013p000"),
    (14.00, "001_z014p000"),
    (15.00, "000_z015p000"),
];

// 4.77 + (5.00 - 4.77) / 2
pub const FLARES_LOW_Z_CUTOFF: f64 = 4.885;

impl SnapshotGrid {
    pub fn new(specs: Vec<SnapshotSpec>, low_z_cutoff: f64) -> Result<Self> {
        if specs.is_empty() {
            bail!("snapshot grid is empty");
        }
        if let Some(w) = specs.windows(2).find(|w| w[0].redshift >= w[1].redshift) {
            bail!(
                "snapshot grid not strictly increasing at z={} ({}) -> z={} ({})",
                w[0].redshift,
                w[0].tag,
                w[1].redshift,
                w[1].tag
            );
        }
        Ok(Self { specs, low_z_cutoff })
    }

    /// The twelve FLARES-1 outputs, z = 4.77 .. 15.
    pub fn flares() -> Self {
        let specs = FLARES_SNAPSHOTS
            .iter()
            .map(|&(redshift, tag)| SnapshotSpec {
                redshift,
                tag: tag.to_string(),
            })
            .collect();
        Self {
            specs,
            low_z_cutoff: FLARES_LOW_Z_CUTOFF,
        }
    }

    pub fn specs(&self) -> &[SnapshotSpec] {
        &self.specs
    }

    pub fn low_z_cutoff(&self) -> f64 {
        self.low_z_cutoff
    }

    /// Nearest whole redshift, or the grid's first redshift at or below the cutoff.
    /// Ties round to even.
    pub fn snap(&self, z: f64) -> f64 {
        if z <= self.low_z_cutoff {
            self.specs[0].redshift
        } else {
            z.round_ties_even()
        }
    }

    pub fn lookup(&self, snapped: f64) -> Option<&SnapshotSpec> {
        self.specs.iter().find(|s| s.redshift == snapped)
    }

    pub fn assign(&self, z: f64) -> Option<&SnapshotSpec> {
        self.lookup(self.snap(z))
    }
}

/// Events that survived bucketing, each paired with its snapshot.
#[derive(Debug)]
pub struct Assignment<'g> {
    pub events: Vec<MergerEvent>,
    pub snapshots: Vec<&'g SnapshotSpec>,
}

impl<'g> Assignment<'g> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.snapshots.iter().map(|s| s.tag.as_str())
    }

    /// Event count per snapshot, in grid order, snapshots without events omitted.
    pub fn counts(&self, grid: &'g SnapshotGrid) -> Vec<(&'g SnapshotSpec, usize)> {
        let mut by_tag: AHashMap<&str, usize> = AHashMap::new();
        for tag in self.tags() {
            *by_tag.entry(tag).or_insert(0) += 1;
        }
        grid.specs()
            .iter()
            .filter_map(|s| by_tag.get(s.tag.as_str()).map(|&n| (s, n)))
            .collect()
    }
}

/// Drops ghost mergers (non-positive mass on either side).
pub fn retain_physical(events: &[MergerEvent]) -> Vec<MergerEvent> {
    events.iter().copied().filter(MergerEvent::is_physical).collect()
}

pub fn bucket<'g>(events: &[MergerEvent], grid: &'g SnapshotGrid) -> Assignment<'g> {
    let mut out = Assignment {
        events: Vec::with_capacity(events.len()),
        snapshots: Vec::with_capacity(events.len()),
    };
    for ev in retain_physical(events) {
        if let Some(spec) = grid.assign(ev.redshift()) {
            out.events.push(ev);
            out.snapshots.push(spec);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(z: f64, m1: f64, m2: f64) -> MergerEvent {
        MergerEvent {
            time: 1.0 / (1.0 + z),
            primary_id: 1,
            secondary_id: 2,
            primary_mass: m1,
            secondary_mass: m2,
        }
    }

    fn grid_without_z5() -> SnapshotGrid {
        let specs = SnapshotGrid::flares()
            .specs()
            .iter()
            .filter(|s| s.redshift != 5.0)
            .cloned()
            .collect();
        SnapshotGrid::new(specs, FLARES_LOW_Z_CUTOFF).unwrap()
    }

    #[test]
    fn cutoff_is_inclusive_on_the_low_side() {
        let grid = SnapshotGrid::flares();
        assert_eq!(grid.low_z_cutoff(), FLARES_LOW_Z_CUTOFF);
        assert_eq!(grid.assign(4.885).unwrap().tag, "011_z004p770");
        assert_eq!(grid.assign(4.886).unwrap().tag, "010_z005p000");
        assert!(grid_without_z5().assign(4.886).is_none());
    }

    #[test]
    fn everything_below_the_cutoff_goes_to_the_first_snapshot() {
        let grid = SnapshotGrid::flares();
        for z in [0.0, 2.3, 4.56, 4.77, 4.8] {
            assert_eq!(grid.snap(z), 4.77, "z={z}");
        }
    }

    #[test]
    fn rounds_to_nearest_whole_redshift() {
        let grid = SnapshotGrid::flares();
        assert_eq!(grid.assign(6.49).unwrap().tag, "009_z006p000");
        assert_eq!(grid.assign(6.51).unwrap().tag, "008_z007p000");
        // ties to even
        assert_eq!(grid.snap(6.5), 6.0);
        assert_eq!(grid.snap(7.5), 8.0);
        assert_eq!(grid.assign(14.9).unwrap().tag, "000_z015p000");
    }

    #[test]
    fn redshifts_beyond_the_grid_are_dropped() {
        let grid = SnapshotGrid::flares();
        let out = bucket(&[event(15.6, 1.0, 1.0), event(22.0, 1.0, 1.0)], &grid);
        assert!(out.is_empty());
        assert!(grid.assign(f64::INFINITY).is_none());
        assert!(grid.assign(f64::NAN).is_none());
    }

    #[test]
    fn ghosts_are_filtered_and_filter_is_idempotent() {
        let evs = vec![
            event(6.0, 1.0, 1.0),
            event(6.0, 1.0, 0.0),
            event(7.0, 0.0, 1.0),
            event(7.0, -1.0, 1.0),
            event(8.0, 2.0, 3.0),
        ];
        let once = retain_physical(&evs);
        assert_eq!(once.len(), 2);
        assert_eq!(retain_physical(&once), once);

        let grid = SnapshotGrid::flares();
        let out = bucket(&evs, &grid);
        assert_eq!(out.tags().collect::<Vec<_>>(), vec!["009_z006p000", "007_z008p000"]);
    }

    #[test]
    fn empty_input_gives_empty_assignment() {
        let grid = SnapshotGrid::flares();
        let out = bucket(&[], &grid);
        assert!(out.is_empty());
        assert!(out.counts(&grid).is_empty());
    }

    #[test]
    fn bucketing_is_deterministic() {
        let grid = SnapshotGrid::flares();
        let evs: Vec<MergerEvent> = (0..200).map(|i| event(i as f64 * 0.09, 1.0, 1.0)).collect();
        let a: Vec<String> = bucket(&evs, &grid).tags().map(str::to_string).collect();
        let b: Vec<String> = bucket(&evs, &grid).tags().map(str::to_string).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), bucket(&evs, &grid).events.len());
    }

    #[test]
    fn counts_follow_grid_order() {
        let grid = SnapshotGrid::flares();
        let evs = vec![event(9.1, 1.0, 1.0), event(4.5, 1.0, 1.0), event(8.8, 1.0, 1.0)];
        let out = bucket(&evs, &grid);
        let counts: Vec<(&str, usize)> = out
            .counts(&grid)
            .into_iter()
            .map(|(s, n)| (s.tag.as_str(), n))
            .collect();
        assert_eq!(counts, vec![("011_z004p770", 1), ("006_z009p000", 2)]);
    }

    #[test]
    fn grid_must_be_strictly_increasing() {
        let specs = vec![
            SnapshotSpec { redshift: 6.0, tag: "a".into() },
            SnapshotSpec { redshift: 5.0, tag: "b".into() },
        ];
        assert!(SnapshotGrid::new(specs, 5.5).is_err());
        assert!(SnapshotGrid::new(Vec::new(), 0.0).is_err());
    }
}
