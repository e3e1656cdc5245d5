use anyhow::{Context, Result, bail};
use ndarray::Array1;
use ndarray_npy::NpzReader;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use super::types::ShardColumns;

pub const DEFAULT_PARTICLE_CLASS: &str = "PartType5";

const IDS: &str = "ParticleIDs";
const MASS: &str = "Mass";
const GROUP: &str = "GroupNumber";
const SUBGROUP: &str = "SubGroupNumber";

/// Archive entry holding `class/field`, written with or without `.npy`.
fn entry_name(names: &[String], class: &str, field: &str) -> Option<String> {
    let bare = format!("{class}/{field}");
    let npy = format!("{bare}.npy");
    names.iter().find(|n| **n == npy || **n == bare).cloned()
}

fn require(names: &[String], class: &str, field: &str) -> Result<String> {
    entry_name(names, class, field).with_context(|| format!("missing {class}/{field}"))
}

// ints are widened to i64; ids may come as u64
fn read_ints<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<Vec<i64>> {
    let wide: Result<Array1<i64>, _> = npz.by_name(name);
    if let Ok(arr) = wide {
        return Ok(arr.to_vec());
    }
    let narrow: Result<Array1<i32>, _> = npz.by_name(name);
    if let Ok(arr) = narrow {
        return Ok(arr.iter().map(|&v| i64::from(v)).collect());
    }
    let unsigned: Array1<u64> = npz.by_name(name).with_context(|| format!("read {}", name))?;
    unsigned
        .iter()
        .map(|&v| i64::try_from(v).with_context(|| format!("{} value {} overflows i64", name, v)))
        .collect()
}

fn read_floats<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Result<Vec<f64>> {
    let wide: Result<Array1<f64>, _> = npz.by_name(name);
    if let Ok(arr) = wide {
        return Ok(arr.to_vec());
    }
    let narrow: Array1<f32> = npz.by_name(name).with_context(|| format!("read {}", name))?;
    Ok(narrow.iter().map(|&v| f64::from(v)).collect())
}

/// Reads the four `class` arrays of one catalog shard.
///
/// `Ok(None)` when the shard holds no particles of `class` at all; `Err` when
/// it cannot be opened or decoded, or its arrays disagree in length. The file
/// is closed before returning in every case.
pub fn read_shard(path: &Path, class: &str) -> Result<Option<ShardColumns>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut npz = NpzReader::new(f).with_context(|| format!("read npz {}", path.display()))?;
    let names = npz.names().with_context(|| format!("list {}", path.display()))?;

    let Some(ids_name) = entry_name(&names, class, IDS) else {
        return Ok(None);
    };
    let mass_name = require(&names, class, MASS)?;
    let group_name = require(&names, class, GROUP)?;
    let subgroup_name = require(&names, class, SUBGROUP)?;

    let cols = ShardColumns {
        ids: read_ints(&mut npz, &ids_name)?,
        masses: read_floats(&mut npz, &mass_name)?,
        group_numbers: read_ints(&mut npz, &group_name)?,
        subgroup_numbers: read_ints(&mut npz, &subgroup_name)?,
    };
    let n = cols.ids.len();
    if cols.masses.len() != n || cols.group_numbers.len() != n || cols.subgroup_numbers.len() != n {
        bail!(
            "{}: {} arrays disagree in length (ids={}, mass={}, group={}, subgroup={})",
            path.display(),
            class,
            n,
            cols.masses.len(),
            cols.group_numbers.len(),
            cols.subgroup_numbers.len()
        );
    }
    Ok(Some(cols))
}

/// Provenance label of a shard: last dot-separated piece of the file stem,
/// i.e. the shard number of `eagle_subfind_particles_<tag>.<n>.npz`.
pub fn shard_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    stem.rsplit('.').next().unwrap_or_default().to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use ndarray::Array1;
    use ndarray_npy::NpzWriter;
    use std::fs::File;
    use std::path::Path;

    /// Writes a shard with one block of `class` particles (or none when `ids` is `None`).
    pub fn write_shard(path: &Path, class: &str, ids: Option<&[i64]>) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        // gas particles are always present
        npz.add_array("PartType0/ParticleIDs.npy", &Array1::from_vec(vec![9i64, 8]))
            .unwrap();
        if let Some(ids) = ids {
            let n = ids.len();
            npz.add_array(format!("{class}/ParticleIDs.npy"), &Array1::from_vec(ids.to_vec()))
                .unwrap();
            npz.add_array(
                format!("{class}/Mass.npy"),
                &Array1::from_vec((0..n).map(|i| 1.0 + i as f64).collect::<Vec<f64>>()),
            )
            .unwrap();
            npz.add_array(
                format!("{class}/GroupNumber.npy"),
                &Array1::from_vec((0..n as i64).map(|i| 10 + i).collect::<Vec<i64>>()),
            )
            .unwrap();
            npz.add_array(
                format!("{class}/SubGroupNumber.npy"),
                &Array1::from_vec(vec![0i64; n]),
            )
            .unwrap();
        }
        npz.finish().unwrap();
    }
}
