//! Per-Date Trend Series

use crate::statistics::{rolling_mean, ROLLING_WINDOW};
use crate::summary::percentage;
use chrono::NaiveDate;
use data_validator::PlantRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Quantity plotted by a trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    BottlesProduced,
    /// Percent
    DefectRate,
    /// Minutes
    Downtime,
}

/// One date on a trend line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Trailing rolling average, when smoothing was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed: Option<f64>,
}

/// Values of one metric, one point per date, sorted by date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
}

#[derive(Default)]
struct DayTotals {
    bottles: u64,
    defects: u64,
    downtime: f64,
}

fn daily_totals(records: &[PlantRecord]) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for r in records {
        let totals = days.entry(r.record.date).or_default();
        totals.bottles = totals.bottles.saturating_add(r.record.bottles_produced);
        totals.defects = totals.defects.saturating_add(r.record.defect_count);
        totals.downtime += r.record.downtime;
    }
    days
}

fn series(
    metric: TrendMetric,
    records: &[PlantRecord],
    smoothing: bool,
    value: impl Fn(&DayTotals) -> f64,
) -> TrendSeries {
    let days = daily_totals(records);
    let values: Vec<f64> = days.values().map(&value).collect();
    let smoothed = smoothing.then(|| rolling_mean(&values, ROLLING_WINDOW));

    let points = days
        .keys()
        .zip(&values)
        .enumerate()
        .map(|(i, (date, v))| TrendPoint {
            date: *date,
            value: *v,
            smoothed: smoothed.as_ref().map(|s| s[i]),
        })
        .collect();

    TrendSeries { metric, points }
}

/// Total bottles produced per date
pub fn production_trend(records: &[PlantRecord], smoothing: bool) -> TrendSeries {
    series(TrendMetric::BottlesProduced, records, smoothing, |d| d.bottles as f64)
}

/// Defects as a percentage of that date's production
pub fn defect_rate_trend(records: &[PlantRecord], smoothing: bool) -> TrendSeries {
    series(TrendMetric::DefectRate, records, smoothing, |d| {
        percentage(d.defects, d.bottles)
    })
}

/// Total downtime minutes per date
pub fn downtime_trend(records: &[PlantRecord], smoothing: bool) -> TrendSeries {
    series(TrendMetric::Downtime, records, smoothing, |d| d.downtime)
}
