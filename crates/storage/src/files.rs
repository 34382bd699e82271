//! Flat-File Persistence of Processed Data

use crate::StorageError;
use data_validator::NormalizedRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name suffix of a processed plant file
pub const CLEAN_SUFFIX: &str = "_clean.csv";

/// File name suffix of a plant's manually entered records
pub const MANUAL_SUFFIX: &str = "_manual.csv";

/// Directory of `<plant>_clean.csv` files, plus `<plant>_manual.csv` files
/// holding entries that did not come from an export
#[derive(Debug, Clone)]
pub struct ProcessedFiles {
    dir: PathBuf,
}

impl ProcessedFiles {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Path of a plant's processed file
    pub fn plant_path(&self, plant_id: &str) -> PathBuf {
        self.dir.join(format!("{plant_id}{CLEAN_SUFFIX}"))
    }

    /// Path of a plant's manual entries
    pub fn manual_path(&self, plant_id: &str) -> PathBuf {
        self.dir.join(format!("{plant_id}{MANUAL_SUFFIX}"))
    }

    /// Write a plant's records, replacing any previous file
    pub fn write_plant(
        &self,
        plant_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<PathBuf, StorageError> {
        let path = self.plant_path(plant_id);
        write_file(&path, records)?;
        info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Manual entries recorded for a plant, empty if there are none
    pub fn read_manual(&self, plant_id: &str) -> Result<Vec<NormalizedRecord>, StorageError> {
        let path = self.manual_path(plant_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_file(&path)
    }

    /// Add manual entries to a plant's manual file
    pub fn append_manual(
        &self,
        plant_id: &str,
        records: &[NormalizedRecord],
    ) -> Result<PathBuf, StorageError> {
        let mut all = self.read_manual(plant_id)?;
        all.extend_from_slice(records);

        let path = self.manual_path(plant_id);
        write_file(&path, &all)?;
        debug!("{} manual entries kept for {}", all.len(), plant_id);
        Ok(path)
    }

    /// Read every processed file in the directory, keyed by plant id
    pub fn load_all(&self) -> Result<BTreeMap<String, Vec<NormalizedRecord>>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut plants = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StorageError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            let Some(plant_id) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(CLEAN_SUFFIX))
                .map(str::to_string)
            else {
                continue;
            };

            match read_file(&path) {
                Ok(records) => {
                    plants.insert(plant_id, records);
                }
                Err(e) => warn!("Skipping unreadable processed file: {}", e),
            }
        }

        info!("Loaded processed data for {} plants from {}", plants.len(), self.dir.display());
        Ok(plants)
    }
}

/// Write records to a temporary file first so readers never see a partial file
fn write_file(path: &Path, records: &[NormalizedRecord]) -> Result<(), StorageError> {
    let tmp = path.with_extension("csv.tmp");

    let csv_err = |source| StorageError::Csv {
        path: tmp.clone(),
        source,
    };
    let mut writer = csv::Writer::from_path(&tmp).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_file(path: &Path) -> Result<Vec<NormalizedRecord>, StorageError> {
    let csv_err = |source| StorageError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<NormalizedRecord>, _>>()
        .map_err(csv_err)
}
