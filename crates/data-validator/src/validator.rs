//! Field Coercion and Row Validation

use crate::error::{ValidationError, ValueProblem};
use crate::records::{NormalizedRecord, RawRow, RawValue, Shift};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use plant_mapping::{CanonicalField, DowntimeUnit};
use std::collections::BTreeMap;

/// Day zero of the spreadsheet serial date system
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial a spreadsheet can hold (9999-12-31)
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

static EMPTY: RawValue = RawValue::Empty;

/// Largest count that survives the round trip through `f64` unchanged (2^53)
pub const MAX_COUNT: u64 = 1 << 53;

/// Longest downtime accepted for one row, in minutes
pub const MAX_DOWNTIME_MINUTES: f64 = 1.0e12;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Standardize a shift code to A/B/C.
///
/// Accepts letters in any case and the numbers 1, 2, 3 as numbers or text.
pub fn coerce_shift(value: &RawValue) -> Result<Shift, ValueProblem> {
    match value {
        RawValue::Empty => Err(ValueProblem::MissingValue),
        RawValue::Number(n) => shift_from_number(*n).ok_or(ValueProblem::UnknownShift),
        RawValue::Text(text) => {
            let code = text.trim();
            if code.is_empty() {
                return Err(ValueProblem::MissingValue);
            }
            Shift::from_letter(code)
                .or_else(|| code.parse::<f64>().ok().and_then(shift_from_number))
                .ok_or(ValueProblem::UnknownShift)
        }
        RawValue::Bool(_) | RawValue::Date(_) => Err(ValueProblem::UnknownShift),
    }
}

fn shift_from_number(n: f64) -> Option<Shift> {
    if n.fract() != 0.0 || !(1.0..=3.0).contains(&n) {
        return None;
    }
    Shift::from_number(n as u8)
}

/// Coerce a cell into a calendar date.
///
/// Numbers are spreadsheet serial dates; any time-of-day part is discarded.
pub fn coerce_date(value: &RawValue) -> Result<NaiveDate, ValueProblem> {
    match value {
        RawValue::Empty => Err(ValueProblem::MissingValue),
        RawValue::Date(date) => Ok(*date),
        RawValue::Number(serial) => date_from_serial(*serial).ok_or(ValueProblem::UnparsableDate),
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValueProblem::MissingValue);
            }
            parse_date_text(text).ok_or(ValueProblem::UnparsableDate)
        }
        RawValue::Bool(_) => Err(ValueProblem::UnparsableDate),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Coerce a cell into a finite, non-negative number
pub fn coerce_non_negative(value: &RawValue) -> Result<f64, ValueProblem> {
    let number = match value {
        RawValue::Empty => return Err(ValueProblem::MissingValue),
        RawValue::Number(n) => *n,
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValueProblem::MissingValue);
            }
            text.parse::<f64>().map_err(|_| ValueProblem::NotANumber)?
        }
        RawValue::Bool(_) | RawValue::Date(_) => return Err(ValueProblem::NotANumber),
    };

    if !number.is_finite() {
        Err(ValueProblem::NotANumber)
    } else if number < 0.0 {
        Err(ValueProblem::Negative)
    } else {
        Ok(number)
    }
}

/// Coerce a cell into a non-negative whole count no larger than [`MAX_COUNT`]
pub fn coerce_count(value: &RawValue) -> Result<u64, ValueProblem> {
    let number = coerce_non_negative(value)?;
    if number.fract() != 0.0 {
        return Err(ValueProblem::NotWholeNumber);
    }
    if number > MAX_COUNT as f64 {
        return Err(ValueProblem::TooLarge {
            limit: MAX_COUNT as f64,
        });
    }
    Ok(number as u64)
}

/// Coerce a downtime cell reported in `unit` into minutes.
///
/// The bound applies after conversion, so an hours plant cannot overflow to infinity.
pub fn coerce_downtime(value: &RawValue, unit: DowntimeUnit) -> Result<f64, ValueProblem> {
    let minutes = unit.to_minutes(coerce_non_negative(value)?);
    if !minutes.is_finite() || minutes > MAX_DOWNTIME_MINUTES {
        return Err(ValueProblem::TooLarge {
            limit: MAX_DOWNTIME_MINUTES,
        });
    }
    Ok(minutes)
}

/// Validates rows of one batch whose columns have already been located
pub struct RowValidator<'a> {
    plant_id: &'a str,
    downtime_unit: DowntimeUnit,
    columns: BTreeMap<CanonicalField, &'a str>,
}

impl<'a> RowValidator<'a> {
    /// Create a validator reading each canonical field from the given header column
    pub fn new(
        plant_id: &'a str,
        downtime_unit: DowntimeUnit,
        columns: BTreeMap<CanonicalField, &'a str>,
    ) -> Self {
        Self {
            plant_id,
            downtime_unit,
            columns,
        }
    }

    /// Validate one row, returning every problem found in it
    pub fn validate(
        &self,
        row_index: usize,
        row: &RawRow,
    ) -> Result<NormalizedRecord, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let date = self.field(row_index, row, CanonicalField::Date, coerce_date, &mut errors);
        let shift = self.field(row_index, row, CanonicalField::Shift, coerce_shift, &mut errors);
        let bottles_produced = self.field(
            row_index,
            row,
            CanonicalField::BottlesProduced,
            coerce_count,
            &mut errors,
        );
        let defect_count =
            self.field(row_index, row, CanonicalField::DefectCount, coerce_count, &mut errors);
        let downtime = self.field(
            row_index,
            row,
            CanonicalField::Downtime,
            |value| coerce_downtime(value, self.downtime_unit),
            &mut errors,
        );

        if let (Some(defects), Some(produced)) = (defect_count, bottles_produced) {
            if defects > produced {
                errors.push(ValidationError::InvalidValue {
                    plant_id: self.plant_id.to_string(),
                    row: row_index,
                    field: CanonicalField::DefectCount,
                    column: self.column(CanonicalField::DefectCount).to_string(),
                    value: defects.to_string(),
                    problem: ValueProblem::DefectsExceedProduction {
                        defect_count: defects,
                        bottles_produced: produced,
                    },
                });
            }
        }

        match (date, shift, bottles_produced, defect_count, downtime) {
            (Some(date), Some(shift), Some(produced), Some(defects), Some(downtime))
                if errors.is_empty() =>
            {
                Ok(NormalizedRecord::new(date, shift, produced, defects, downtime))
            }
            _ => Err(errors),
        }
    }

    fn column(&self, field: CanonicalField) -> &'a str {
        self.columns.get(&field).copied().unwrap_or(field.as_str())
    }

    fn field<T>(
        &self,
        row_index: usize,
        row: &RawRow,
        field: CanonicalField,
        coerce: impl Fn(&RawValue) -> Result<T, ValueProblem>,
        errors: &mut Vec<ValidationError>,
    ) -> Option<T> {
        let column = self.column(field);
        let value = row.get(column).unwrap_or(&EMPTY);
        match coerce(value) {
            Ok(v) => Some(v),
            Err(problem) => {
                errors.push(ValidationError::InvalidValue {
                    plant_id: self.plant_id.to_string(),
                    row: row_index,
                    field,
                    column: column.to_string(),
                    value: value.to_string(),
                    problem,
                });
                None
            }
        }
    }
}
