//! HTTP Route Handlers

pub mod dashboard;
pub mod plants;
pub mod uploads;
