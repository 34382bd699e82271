//! Dashboard Aggregations
//!
//! Groups normalized plant records into the figures the dashboard charts:
//! headline KPIs, per-date trends, and shift, plant and weekday breakdowns.

mod breakdown;
mod filter;
mod statistics;
mod summary;
mod trends;

pub use breakdown::{
    defect_scatter, plant_comparison, shift_breakdown, weekday_profile, PlantTotal, ScatterPoint,
    ShiftBreakdown, WeekdayAverage,
};
pub use filter::DashboardFilter;
pub use statistics::{mean, remove_outliers, rolling_mean, sample_std_dev, ROLLING_WINDOW};
pub use summary::Summary;
pub use trends::{
    defect_rate_trend, downtime_trend, production_trend, TrendMetric, TrendPoint, TrendSeries,
};
