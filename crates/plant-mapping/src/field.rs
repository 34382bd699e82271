//! Canonical Output Fields

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the standardized columns every plant export is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    Shift,
    BottlesProduced,
    DefectCount,
    Downtime,
}

impl CanonicalField {
    /// All required fields, in output column order
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Date,
        CanonicalField::Shift,
        CanonicalField::BottlesProduced,
        CanonicalField::DefectCount,
        CanonicalField::Downtime,
    ];

    /// Column name used in configuration files and normalized output
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Shift => "shift",
            CanonicalField::BottlesProduced => "bottles_produced",
            CanonicalField::DefectCount => "defect_count",
            CanonicalField::Downtime => "downtime",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no canonical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a canonical field", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for CanonicalField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
