use itertools::izip;

use crate::store::Column;

/// One particle of the target class as found in one catalog shard.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRecord {
    pub id: i64,
    pub mass: f64,
    pub group_number: i64,
    pub subgroup_number: i64,
    pub source_shard: String,
}

/// The four aligned arrays read from one shard.
#[derive(Debug, Clone, Default)]
pub struct ShardColumns {
    pub ids: Vec<i64>,
    pub masses: Vec<f64>,
    pub group_numbers: Vec<i64>,
    pub subgroup_numbers: Vec<i64>,
}

impl ShardColumns {
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Records of every shard of one (region, tag), concatenated in scan order.
/// All five columns always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleCatalog {
    ids: Vec<i64>,
    masses: Vec<f64>,
    group_numbers: Vec<i64>,
    subgroup_numbers: Vec<i64>,
    source_shards: Vec<String>,
}

pub const CATALOG_FIELDS: [&str; 5] = [
    "ids",
    "masses",
    "group_numbers",
    "subgroup_numbers",
    "files",
];

impl ParticleCatalog {
    pub fn push_shard(&mut self, label: &str, cols: ShardColumns) {
        let n = cols.len();
        self.ids.extend(cols.ids);
        self.masses.extend(cols.masses);
        self.group_numbers.extend(cols.group_numbers);
        self.subgroup_numbers.extend(cols.subgroup_numbers);
        self.source_shards.extend(std::iter::repeat_n(label.to_string(), n));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }
    pub fn group_numbers(&self) -> &[i64] {
        &self.group_numbers
    }
    pub fn subgroup_numbers(&self) -> &[i64] {
        &self.subgroup_numbers
    }
    pub fn source_shards(&self) -> &[String] {
        &self.source_shards
    }

    pub fn records(&self) -> impl Iterator<Item = ParticleRecord> + '_ {
        izip!(
            &self.ids,
            &self.masses,
            &self.group_numbers,
            &self.subgroup_numbers,
            &self.source_shards
        )
        .map(|(&id, &mass, &group_number, &subgroup_number, shard)| ParticleRecord {
            id,
            mass,
            group_number,
            subgroup_number,
            source_shard: shard.clone(),
        })
    }

    /// Field name -> column, in `CATALOG_FIELDS` order.
    pub fn columns(&self) -> [(&'static str, Column); 5] {
        [
            (CATALOG_FIELDS[0], Column::Int(self.ids.clone())),
            (CATALOG_FIELDS[1], Column::Float(self.masses.clone())),
            (CATALOG_FIELDS[2], Column::Int(self.group_numbers.clone())),
            (CATALOG_FIELDS[3], Column::Int(self.subgroup_numbers.clone())),
            (CATALOG_FIELDS[4], Column::Text(self.source_shards.clone())),
        ]
    }
}
