//! Shift, Plant and Weekday Breakdowns

use crate::summary::percentage;
use data_validator::{DayOfWeek, PlantRecord, Shift};
use serde::Serialize;
use std::collections::BTreeMap;

/// Production and defects for one shift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftBreakdown {
    pub shift: Shift,
    pub bottles_produced: u64,
    pub defect_count: u64,
    /// Percent
    pub defect_rate: f64,
}

/// Total production for one plant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantTotal {
    pub plant_id: String,
    pub bottles_produced: u64,
}

/// Mean production on one weekday
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayAverage {
    pub day_of_week: DayOfWeek,
    pub avg_bottles_produced: f64,
    pub records: usize,
}

/// One point of the defects-versus-production scatter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub bottles_produced: u64,
    pub defect_count: u64,
}

/// Shifts present in the data, in A, B, C order
pub fn shift_breakdown(records: &[PlantRecord]) -> Vec<ShiftBreakdown> {
    let mut shifts: BTreeMap<Shift, (u64, u64)> = BTreeMap::new();
    for r in records {
        let totals = shifts.entry(r.record.shift).or_default();
        totals.0 = totals.0.saturating_add(r.record.bottles_produced);
        totals.1 = totals.1.saturating_add(r.record.defect_count);
    }
    shifts
        .into_iter()
        .map(|(shift, (bottles, defects))| ShiftBreakdown {
            shift,
            bottles_produced: bottles,
            defect_count: defects,
            defect_rate: percentage(defects, bottles),
        })
        .collect()
}

/// Plants present in the data, sorted by id
pub fn plant_comparison(records: &[PlantRecord]) -> Vec<PlantTotal> {
    let mut plants: BTreeMap<&str, u64> = BTreeMap::new();
    for r in records {
        let total = plants.entry(r.plant_id.as_str()).or_default();
        *total = total.saturating_add(r.record.bottles_produced);
    }
    plants
        .into_iter()
        .map(|(plant_id, bottles_produced)| PlantTotal {
            plant_id: plant_id.to_string(),
            bottles_produced,
        })
        .collect()
}

/// Weekdays present in the data, Monday first
pub fn weekday_profile(records: &[PlantRecord]) -> Vec<WeekdayAverage> {
    let mut days: BTreeMap<DayOfWeek, (u64, usize)> = BTreeMap::new();
    for r in records {
        let entry = days.entry(r.record.day_of_week).or_default();
        entry.0 = entry.0.saturating_add(r.record.bottles_produced);
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(day_of_week, (bottles, n))| WeekdayAverage {
            day_of_week,
            avg_bottles_produced: bottles as f64 / n as f64,
            records: n,
        })
        .collect()
}

pub fn defect_scatter(records: &[PlantRecord]) -> Vec<ScatterPoint> {
    records
        .iter()
        .map(|r| ScatterPoint {
            bottles_produced: r.record.bottles_produced,
            defect_count: r.record.defect_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use data_validator::NormalizedRecord;

    fn record(plant: &str, day: u32, shift: Shift, bottles: u64, defects: u64) -> PlantRecord {
        PlantRecord::new(
            plant,
            NormalizedRecord::new(NaiveDate::from_ymd_opt(2025, 3, day).unwrap(), shift, bottles, defects, 0.0),
        )
    }

    #[test]
    fn test_shift_breakdown_ordered() {
        let records = vec![
            record("plant_1", 3, Shift::C, 100, 5),
            record("plant_1", 3, Shift::A, 200, 2),
            record("plant_2", 4, Shift::A, 200, 6),
        ];
        let breakdown = shift_breakdown(&records);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].shift, Shift::A);
        assert_eq!(breakdown[0].bottles_produced, 400);
        assert!((breakdown[0].defect_rate - 2.0).abs() < 1e-9);
        assert_eq!(breakdown[1].shift, Shift::C);
    }

    #[test]
    fn test_breakdowns_saturate_on_huge_totals() {
        let records = vec![
            record("plant_1", 3, Shift::A, u64::MAX - 1, u64::MAX - 1),
            record("plant_1", 3, Shift::A, u64::MAX - 1, 1),
        ];
        let shifts = shift_breakdown(&records);
        assert_eq!(shifts[0].bottles_produced, u64::MAX);
        assert_eq!(shifts[0].defect_count, u64::MAX);
        assert_eq!(plant_comparison(&records)[0].bottles_produced, u64::MAX);
        assert_eq!(weekday_profile(&records)[0].records, 2);
    }

    #[test]
    fn test_plant_comparison_sorted() {
        let records = vec![
            record("plant_2", 3, Shift::A, 10, 0),
            record("plant_1", 3, Shift::A, 20, 0),
            record("plant_2", 4, Shift::B, 5, 0),
        ];
        let totals = plant_comparison(&records);
        assert_eq!(
            totals,
            vec![
                PlantTotal { plant_id: "plant_1".to_string(), bottles_produced: 20 },
                PlantTotal { plant_id: "plant_2".to_string(), bottles_produced: 15 },
            ]
        );
    }

    #[test]
    fn test_weekday_profile_monday_first() {
        // 2025-03-09 is a Sunday, 2025-03-03 a Monday
        let records = vec![
            record("plant_1", 9, Shift::A, 50, 0),
            record("plant_1", 3, Shift::A, 100, 0),
            record("plant_1", 10, Shift::A, 300, 0),
        ];
        let profile = weekday_profile(&records);
        assert_eq!(profile[0].day_of_week, DayOfWeek::Monday);
        assert_eq!(profile[0].avg_bottles_produced, 200.0);
        assert_eq!(profile[0].records, 2);
        assert_eq!(profile[1].day_of_week, DayOfWeek::Sunday);
    }

    #[test]
    fn test_scatter_points() {
        let points = defect_scatter(&[record("plant_1", 3, Shift::A, 100, 7)]);
        assert_eq!(points, vec![ScatterPoint { bottles_produced: 100, defect_count: 7 }]);
    }
}
