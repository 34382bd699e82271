//! Raw and Normalized Record Types

use chrono::{Datelike, NaiveDate, Weekday};
use plant_mapping::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell as handed over by the upload or manual-entry side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Empty,
}

impl RawValue {
    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RawValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

/// One row keyed by source column name
pub type RawRow = BTreeMap<String, RawValue>;

/// An uploaded table before any renaming or coercion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBatch {
    /// Header, in file order
    #[serde(default)]
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Zero-based position of each row in the source table when skipped
    /// lines make it differ from the position in `rows`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_rows: Vec<usize>,
}

impl RawBatch {
    /// Create a batch with an explicit header
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows,
            source_rows: Vec::new(),
        }
    }

    /// Record where each row sat in the source table
    pub fn with_source_rows(mut self, source_rows: Vec<usize>) -> Self {
        self.source_rows = source_rows;
        self
    }

    /// Position of the `index`-th row in the source table
    pub fn source_row(&self, index: usize) -> usize {
        self.source_rows.get(index).copied().unwrap_or(index)
    }

    /// Create a batch whose header is every key seen, in first-seen order
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self::new(columns, rows)
    }

    /// Fill in the header from the rows when the producer left it out
    pub fn with_inferred_columns(self) -> Self {
        if self.columns.is_empty() {
            Self::from_rows(self.rows).with_source_rows(self.source_rows)
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Work period code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
    C,
}

impl Shift {
    pub const ALL: [Shift; 3] = [Shift::A, Shift::B, Shift::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::A => "A",
            Shift::B => "B",
            Shift::C => "C",
        }
    }

    /// Numeric code used by plants that number their shifts
    pub fn from_number(code: u8) -> Option<Self> {
        match code {
            1 => Some(Shift::A),
            2 => Some(Shift::B),
            3 => Some(Shift::C),
            _ => None,
        }
    }

    /// Letter code, case-insensitive
    pub fn from_letter(code: &str) -> Option<Self> {
        Shift::ALL
            .into_iter()
            .find(|shift| shift.as_str().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week, ordered Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated production row in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub date: NaiveDate,
    pub shift: Shift,
    pub bottles_produced: u64,
    pub defect_count: u64,
    /// Minutes
    pub downtime: f64,
    pub day_of_week: DayOfWeek,
}

impl NormalizedRecord {
    /// Create a record, deriving the day of week from the date
    pub fn new(
        date: NaiveDate,
        shift: Shift,
        bottles_produced: u64,
        defect_count: u64,
        downtime: f64,
    ) -> Self {
        Self {
            date,
            shift,
            bottles_produced,
            defect_count,
            downtime,
            day_of_week: DayOfWeek::of(date),
        }
    }

    /// Defects as a percentage of production, zero when nothing was produced
    pub fn defect_rate(&self) -> f64 {
        if self.bottles_produced == 0 {
            0.0
        } else {
            self.defect_count as f64 / self.bottles_produced as f64 * 100.0
        }
    }

    /// Render back into a raw row keyed by canonical column names
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new();
        row.insert(CanonicalField::Date.as_str().to_string(), RawValue::Date(self.date));
        row.insert(
            CanonicalField::Shift.as_str().to_string(),
            RawValue::Text(self.shift.as_str().to_string()),
        );
        row.insert(
            CanonicalField::BottlesProduced.as_str().to_string(),
            RawValue::Number(self.bottles_produced as f64),
        );
        row.insert(
            CanonicalField::DefectCount.as_str().to_string(),
            RawValue::Number(self.defect_count as f64),
        );
        row.insert(
            CanonicalField::Downtime.as_str().to_string(),
            RawValue::Number(self.downtime),
        );
        row.insert(
            "day_of_week".to_string(),
            RawValue::Text(self.day_of_week.as_str().to_string()),
        );
        row
    }
}

/// A normalized record tagged with the plant it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub plant_id: String,
    #[serde(flatten)]
    pub record: NormalizedRecord,
}

impl PlantRecord {
    pub fn new(plant_id: impl Into<String>, record: NormalizedRecord) -> Self {
        Self {
            plant_id: plant_id.into(),
            record,
        }
    }
}
