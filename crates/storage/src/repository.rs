//! Repository Implementation

use crate::StorageError;
use data_validator::{NormalizedRecord, PlantRecord};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// In-memory store of normalized records, keyed by plant
pub struct Repository {
    plants: Mutex<BTreeMap<String, Vec<NormalizedRecord>>>,
}

impl Repository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            plants: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<NormalizedRecord>>>, StorageError>
    {
        self.plants
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Replace everything stored for a plant; returns the new record count
    pub fn replace_plant(
        &self,
        plant_id: &str,
        mut records: Vec<NormalizedRecord>,
    ) -> Result<usize, StorageError> {
        records.sort_by_key(|r| (r.date, r.shift));
        let count = records.len();
        self.lock()?.insert(plant_id.to_string(), records);
        info!("Stored {} records for {}", count, plant_id);
        Ok(count)
    }

    /// Add one record to a plant, keeping date order
    pub fn append_record(
        &self,
        plant_id: &str,
        record: NormalizedRecord,
    ) -> Result<(), StorageError> {
        let mut plants = self.lock()?;
        let records = plants.entry(plant_id.to_string()).or_default();
        let position = records.partition_point(|r| (r.date, r.shift) <= (record.date, record.shift));
        records.insert(position, record);
        debug!("Appended record for {} ({} total)", plant_id, records.len());
        Ok(())
    }

    /// Records for one plant
    pub fn plant_records(&self, plant_id: &str) -> Result<Vec<NormalizedRecord>, StorageError> {
        Ok(self.lock()?.get(plant_id).cloned().unwrap_or_default())
    }

    /// All records, tagged with their plant, ordered by plant then date
    pub fn records(&self) -> Result<Vec<PlantRecord>, StorageError> {
        let plants = self.lock()?;
        Ok(plants
            .iter()
            .flat_map(|(plant_id, records)| {
                records
                    .iter()
                    .map(move |r| PlantRecord::new(plant_id.clone(), r.clone()))
            })
            .collect())
    }

    /// Plants with at least one stored record
    pub fn plants(&self) -> Vec<String> {
        self.lock()
            .map(|p| {
                p.iter()
                    .filter(|(_, records)| !records.is_empty())
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total stored records
    pub fn record_count(&self) -> usize {
        self.lock()
            .map(|p| p.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Clear all data
    pub fn clear(&self) {
        if let Ok(mut plants) = self.plants.lock() {
            plants.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
