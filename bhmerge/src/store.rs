//! Key -> array persistence for parsed events and aggregated catalogs.

use ndarray::{Array1, ArrayView1};
use ndarray_npy::{ReadNpyError, WriteNpyError, read_npy, write_npy};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Text(_) => "text",
        }
    }

    pub fn into_floats(self, key: &str) -> Result<Vec<f64>, StoreError> {
        match self {
            Column::Float(v) => Ok(v),
            other => Err(StoreError::Kind {
                key: key.to_string(),
                expected: "float",
                found: other.kind(),
            }),
        }
    }

    pub fn into_ints(self, key: &str) -> Result<Vec<i64>, StoreError> {
        match self {
            Column::Int(v) => Ok(v),
            other => Err(StoreError::Kind {
                key: key.to_string(),
                expected: "int",
                found: other.kind(),
            }),
        }
    }

    pub fn into_text(self, key: &str) -> Result<Vec<String>, StoreError> {
        match self {
            Column::Text(v) => Ok(v),
            other => Err(StoreError::Kind {
                key: key.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{key}: not found")]
    NotFound { key: String },
    #[error("{key}: expected {expected} column, found {found}")]
    Kind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{key}: {detail}")]
    Shape { key: String, detail: String },
    #[error("{key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("{key}: {source}")]
    Read {
        key: String,
        #[source]
        source: ReadNpyError,
    },
    #[error("{key}: {source}")]
    Write {
        key: String,
        #[source]
        source: WriteNpyError,
    },
}

/// Redshift as it appears in keys: `4.77`, `5.0`, `15.0`.
pub fn redshift_key(z: f64) -> String {
    format!("{z:?}")
}

/// Key of the first event column of a region; its presence marks the
/// region's event stage as done.
pub fn events_key(region: &str) -> String {
    format!("times_{region}")
}

/// Key of the id column of a (region, redshift) catalog; its presence marks
/// that catalog as done.
pub fn catalog_key(region: &str, z: f64) -> String {
    format!("ids_{region}_{}", redshift_key(z))
}

pub trait ArrayStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Column, StoreError>;
    fn save(&self, key: &str, column: &Column) -> Result<(), StoreError>;

    /// Whether output exists for `region` (event stage) or for
    /// `(region, redshift)` (catalog stage).
    fn exists_for(&self, region: &str, redshift: Option<f64>) -> bool;
}

/// One `.npy` file per numeric column, one `.txt` file per text column.
#[derive(Debug, Clone)]
pub struct NpyStore {
    dir: PathBuf,
}

impl NpyStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn npy_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.npy"))
    }

    fn text_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.txt"))
    }

    fn has(&self, key: &str) -> bool {
        self.npy_path(key).is_file() || self.text_path(key).is_file()
    }
}

impl ArrayStore for NpyStore {
    fn load(&self, key: &str) -> Result<Column, StoreError> {
        let npy = self.npy_path(key);
        if npy.is_file() {
            let floats: Result<Array1<f64>, _> = read_npy(&npy);
            return match floats {
                Ok(arr) => Ok(Column::Float(arr.to_vec())),
                Err(first) => {
                    let ints: Result<Array1<i64>, _> = read_npy(&npy);
                    ints.map(|arr| Column::Int(arr.to_vec()))
                        .map_err(|_| StoreError::Read {
                            key: key.to_string(),
                            source: first,
                        })
                }
            };
        }

        let txt = self.text_path(key);
        if txt.is_file() {
            let body = fs::read_to_string(&txt).map_err(|source| StoreError::Io {
                key: key.to_string(),
                source,
            })?;
            return Ok(Column::Text(body.lines().map(str::to_string).collect()));
        }

        Err(StoreError::NotFound {
            key: key.to_string(),
        })
    }

    fn save(&self, key: &str, column: &Column) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            key: key.to_string(),
            source,
        };
        match column {
            Column::Float(v) => {
                write_npy(self.npy_path(key), &ArrayView1::from(v.as_slice())).map_err(write_err)
            }
            Column::Int(v) => {
                write_npy(self.npy_path(key), &ArrayView1::from(v.as_slice())).map_err(write_err)
            }
            Column::Text(v) => {
                if let Some(bad) = v.iter().find(|s| s.contains('\n')) {
                    return Err(StoreError::Shape {
                        key: key.to_string(),
                        detail: format!("text entry {bad:?} spans lines"),
                    });
                }
                let mut body = v.join("\n");
                if !body.is_empty() {
                    body.push('\n');
                }
                fs::write(self.text_path(key), body).map_err(|source| StoreError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    fn exists_for(&self, region: &str, redshift: Option<f64>) -> bool {
        match redshift {
            None => self.has(&events_key(region)),
            Some(z) => self.has(&catalog_key(region, z)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, NpyStore) {
        let tmp = TempDir::new().unwrap();
        let store = NpyStore::open(tmp.path().join("out")).unwrap();
        (tmp, store)
    }

    #[test]
    fn columns_round_trip() {
        let (_tmp, store) = store();
        let cols = [
            ("masses_00_4.77", Column::Float(vec![5.0, 3.25e-7, f64::MIN_POSITIVE])),
            ("ids_00_4.77", Column::Int(vec![100, i64::MAX, 0])),
            ("files_00_4.77", Column::Text(vec!["0".into(), "12".into(), "12".into()])),
            ("files_00_5.0", Column::Text(Vec::new())),
            ("ids_00_5.0", Column::Int(Vec::new())),
        ];
        for (key, col) in &cols {
            store.save(key, col).unwrap();
        }
        for (key, col) in &cols {
            assert_eq!(&store.load(key).unwrap(), col, "{key}");
        }
    }

    #[test]
    fn save_replaces_existing_output() {
        let (_tmp, store) = store();
        store.save("times_03", &Column::Float(vec![0.1, 0.2, 0.3])).unwrap();
        store.save("times_03", &Column::Float(vec![0.5])).unwrap();
        assert_eq!(store.load("times_03").unwrap(), Column::Float(vec![0.5]));
    }

    #[test]
    fn missing_key_is_not_found() {
        let (_tmp, store) = store();
        assert!(matches!(store.load("times_99"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn exists_for_tracks_both_stages() {
        let (_tmp, store) = store();
        assert!(!store.exists_for("07", None));
        assert!(!store.exists_for("07", Some(6.0)));

        store.save("times_07", &Column::Float(vec![0.2])).unwrap();
        store.save("ids_07_6.0", &Column::Int(vec![1])).unwrap();
        assert!(store.exists_for("07", None));
        assert!(store.exists_for("07", Some(6.0)));
        assert!(!store.exists_for("07", Some(4.77)));
        assert!(!store.exists_for("08", None));
    }

    #[test]
    fn keys_render_redshift_like_the_grid() {
        assert_eq!(catalog_key("00", 4.77), "ids_00_4.77");
        assert_eq!(catalog_key("12", 10.0), "ids_12_10.0");
        assert_eq!(events_key("39"), "times_39");
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let err = Column::Int(vec![1]).into_floats("times_00").unwrap_err();
        assert!(matches!(err, StoreError::Kind { expected: "float", found: "int", .. }));
    }
}
