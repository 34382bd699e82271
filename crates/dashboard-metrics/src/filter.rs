//! Dashboard Record Filter

use chrono::NaiveDate;
use data_validator::{PlantRecord, Shift};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Plant, shift and date-range selection applied before aggregating.
///
/// `None` means no restriction on that dimension. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub plants: Option<BTreeSet<String>>,
    pub shifts: Option<BTreeSet<Shift>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DashboardFilter {
    pub fn matches(&self, record: &PlantRecord) -> bool {
        let r = &record.record;
        self.plants
            .as_ref()
            .map_or(true, |p| p.contains(&record.plant_id))
            && self.shifts.as_ref().map_or(true, |s| s.contains(&r.shift))
            && self.from.map_or(true, |from| r.date >= from)
            && self.to.map_or(true, |to| r.date <= to)
    }

    /// Records passing the filter, in input order
    pub fn apply(&self, records: &[PlantRecord]) -> Vec<PlantRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
