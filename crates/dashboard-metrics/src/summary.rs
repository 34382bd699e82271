//! Headline KPIs

use crate::statistics::mean;
use data_validator::PlantRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// Figures shown in the dashboard's summary cards
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Distinct plants contributing records
    pub plants: usize,
    pub records: usize,
    pub total_bottles: u64,
    pub total_defects: u64,
    /// Percentage of produced bottles rejected
    pub defect_rate: f64,
    /// Mean downtime per record, minutes
    pub avg_downtime: f64,
}

impl Summary {
    pub fn compute(records: &[PlantRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let plants: BTreeSet<&str> = records.iter().map(|r| r.plant_id.as_str()).collect();
        let total_bottles = saturating_total(records.iter().map(|r| r.record.bottles_produced));
        let total_defects = saturating_total(records.iter().map(|r| r.record.defect_count));
        let downtime: Vec<f64> = records.iter().map(|r| r.record.downtime).collect();

        Self {
            plants: plants.len(),
            records: records.len(),
            total_bottles,
            total_defects,
            defect_rate: percentage(total_defects, total_bottles),
            avg_downtime: mean(&downtime),
        }
    }
}

/// Sum of counts, pinned at `u64::MAX` instead of overflowing
pub(crate) fn saturating_total(counts: impl Iterator<Item = u64>) -> u64 {
    counts.fold(0, u64::saturating_add)
}

/// `part / whole * 100`, zero when `whole` is zero
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
