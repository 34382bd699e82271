//! Dashboard Routes

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use dashboard_metrics::{
    defect_rate_trend, defect_scatter, downtime_trend, plant_comparison, production_trend,
    remove_outliers, shift_breakdown, weekday_profile, DashboardFilter, PlantTotal, ScatterPoint,
    ShiftBreakdown, Summary, TrendSeries, WeekdayAverage,
};
use data_validator::{coerce_shift, PlantRecord, RawValue, Shift};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters shared by the dashboard endpoints
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Comma-separated plant ids
    pub plants: Option<String>,
    /// Comma-separated shift codes (letters or numbers)
    pub shifts: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default = "default_smoothing")]
    pub smoothing: bool,
    #[serde(default)]
    pub remove_outliers: bool,
}

fn default_smoothing() -> bool {
    true
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl DashboardQuery {
    /// Build the record filter, rejecting unknown shift codes
    pub fn filter(&self) -> Result<DashboardFilter, ApiError> {
        let plants = self
            .plants
            .as_deref()
            .map(|list| split_list(list).map(str::to_string).collect::<BTreeSet<_>>());

        let shifts = match self.shifts.as_deref() {
            Some(list) => Some(
                split_list(list)
                    .map(|code| {
                        coerce_shift(&RawValue::from(code))
                            .map_err(|_| ApiError::BadRequest(format!("Unknown shift '{code}'")))
                    })
                    .collect::<Result<BTreeSet<Shift>, _>>()?,
            ),
            None => None,
        };

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::BadRequest(format!(
                    "Date range start {from} is after end {to}"
                )));
            }
        }

        Ok(DashboardFilter {
            plants,
            shifts,
            from: self.from,
            to: self.to,
        })
    }
}

async fn selected_records(
    state: &Arc<RwLock<AppState>>,
    query: &DashboardQuery,
) -> Result<Vec<PlantRecord>, ApiError> {
    let filter = query.filter()?;
    let records = state.read().await.repository.records()?;
    let selected = filter.apply(&records);
    Ok(if query.remove_outliers {
        remove_outliers(&selected)
    } else {
        selected
    })
}

/// Headline KPIs
pub async fn get_summary(
    State(state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Summary>, ApiError> {
    let records = selected_records(&state, &query).await?;
    Ok(Json(Summary::compute(&records)))
}

/// Response for the trends endpoint
#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub production: TrendSeries,
    pub defect_rate: TrendSeries,
    pub downtime: TrendSeries,
}

/// Per-date production, defect-rate and downtime series
pub async fn get_trends(
    State(state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let records = selected_records(&state, &query).await?;
    Ok(Json(TrendsResponse {
        production: production_trend(&records, query.smoothing),
        defect_rate: defect_rate_trend(&records, query.smoothing),
        downtime: downtime_trend(&records, query.smoothing),
    }))
}

/// Response for the breakdown endpoint
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub shifts: Vec<ShiftBreakdown>,
    pub plants: Vec<PlantTotal>,
    pub weekdays: Vec<WeekdayAverage>,
    pub scatter: Vec<ScatterPoint>,
}

/// Shift, plant and weekday breakdowns plus the defect scatter
pub async fn get_breakdown(
    State(state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<BreakdownResponse>, ApiError> {
    let records = selected_records(&state, &query).await?;
    Ok(Json(BreakdownResponse {
        shifts: shift_breakdown(&records),
        plants: plant_comparison(&records),
        weekdays: weekday_profile(&records),
        scatter: defect_scatter(&records),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_parses_lists() {
        let query = DashboardQuery {
            plants: Some("plant_1, plant_2,".to_string()),
            shifts: Some("a,2".to_string()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.plants.unwrap().len(), 2);
        assert_eq!(filter.shifts.unwrap(), [Shift::A, Shift::B].into());
    }

    #[test]
    fn test_query_filter_rejects_bad_input() {
        let query = DashboardQuery {
            shifts: Some("Z".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(ApiError::BadRequest(_))));

        let query = DashboardQuery {
            from: NaiveDate::from_ymd_opt(2025, 3, 5),
            to: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(ApiError::BadRequest(_))));
    }
}
