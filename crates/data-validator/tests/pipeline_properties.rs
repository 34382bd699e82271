use chrono::NaiveDate;
use data_validator::{
    normalize, process_batch, DayOfWeek, NormalizedRecord, RawBatch, RawRow, RawValue, Shift,
    ValidationError, ValueProblem, MAX_COUNT,
};
use plant_mapping::{CanonicalField, MappingTable, PlantMapping};
use proptest::prelude::*;

const PLANT_3: &str = r#"{
    "plant_3": {"Fecha": "date", "Turno": "shift", "Unidades": "bottles_produced",
                "Rechazos": "defect_count", "ParoMin": "downtime"}
}"#;

fn table() -> MappingTable {
    MappingTable::from_json_str(PLANT_3).unwrap()
}

fn plant_3_row(fecha: &str, turno: &str, unidades: f64, rechazos: f64, paro: f64) -> RawRow {
    let mut row = RawRow::new();
    row.insert("Fecha".to_string(), RawValue::from(fecha));
    row.insert("Turno".to_string(), RawValue::from(turno));
    row.insert("Unidades".to_string(), RawValue::Number(unidades));
    row.insert("Rechazos".to_string(), RawValue::Number(rechazos));
    row.insert("ParoMin".to_string(), RawValue::Number(paro));
    row
}

#[test]
fn test_plant_3_row_normalizes() {
    let table = table();
    let batch = RawBatch::from_rows(vec![plant_3_row("2025-03-04", "2", 500.0, 10.0, 15.0)]);
    let outcome = process_batch(&table, "plant_3", &batch);

    assert!(outcome.errors.is_empty());
    assert_eq!(
        outcome.records,
        vec![NormalizedRecord {
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            shift: Shift::B,
            bottles_produced: 500,
            defect_count: 10,
            downtime: 15.0,
            day_of_week: DayOfWeek::Tuesday,
        }]
    );
}

#[test]
fn test_plant_3_unknown_shift_rejected() {
    let table = table();
    let batch = RawBatch::from_rows(vec![plant_3_row("2025-03-05", "9", 100.0, 5.0, 0.0)]);
    let outcome = process_batch(&table, "plant_3", &batch);

    assert!(outcome.records.is_empty());
    assert_eq!(
        outcome.errors,
        vec![ValidationError::InvalidValue {
            plant_id: "plant_3".to_string(),
            row: 0,
            field: CanonicalField::Shift,
            column: "Turno".to_string(),
            value: "9".to_string(),
            problem: ValueProblem::UnknownShift,
        }]
    );
}

#[test]
fn test_missing_downtime_column() {
    let table = table();
    let mut row = plant_3_row("2025-03-04", "A", 500.0, 10.0, 15.0);
    row.remove("ParoMin");
    let outcome = process_batch(&table, "plant_3", &RawBatch::from_rows(vec![row]));

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        &outcome.errors[0],
        ValidationError::MissingColumn { field: CanonicalField::Downtime, expected_column: Some(c), .. }
            if c == "ParoMin"
    ));
}

#[test]
fn test_mapping_without_downtime_rejects_batch() {
    let mapping = PlantMapping::new(
        "plant_7",
        [
            ("Fecha", CanonicalField::Date),
            ("Turno", CanonicalField::Shift),
            ("Unidades", CanonicalField::BottlesProduced),
            ("Rechazos", CanonicalField::DefectCount),
        ],
        Default::default(),
    )
    .unwrap();
    let batch = RawBatch::from_rows(vec![plant_3_row("2025-03-04", "A", 500.0, 10.0, 15.0)]);
    let outcome = normalize(&batch, &mapping);

    assert!(outcome.records.is_empty());
    assert!(matches!(
        outcome.errors.as_slice(),
        [ValidationError::MissingColumn { field: CanonicalField::Downtime, expected_column: None, .. }]
    ));
}

#[test]
fn test_unknown_plant_produces_no_rows() {
    let table = table();
    let batch = RawBatch::from_rows(vec![plant_3_row("2025-03-04", "A", 500.0, 10.0, 15.0)]);
    let outcome = process_batch(&table, "plant_8", &batch);

    assert!(outcome.records.is_empty());
    assert!(matches!(outcome.errors.as_slice(), [ValidationError::UnknownPlant(_)]));
}

#[test]
fn test_huge_counts_rejected_not_clamped() {
    let table = table();
    let batch = RawBatch::from_rows(vec![
        plant_3_row("2025-03-04", "A", 1e30, 0.0, 0.0),
        plant_3_row("2025-03-04", "B", 1.8e19, 1.8e19, 0.0),
    ]);
    let outcome = process_batch(&table, "plant_3", &batch);

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.errors.len(), 3);
    assert!(outcome.errors.iter().all(|e| matches!(
        e,
        ValidationError::InvalidValue { problem: ValueProblem::TooLarge { .. }, .. }
    )));
}

#[test]
fn test_hours_plant_rejects_downtime_overflowing_minutes() {
    let table = MappingTable::from_json_str(
        r#"{"plant_5": {"columns": {"Day": "date", "Crew": "shift", "Output": "bottles_produced",
                                    "Scrap": "defect_count", "StopHours": "downtime"},
                        "downtime_unit": "hours"}}"#,
    )
    .unwrap();

    let mut row = RawRow::new();
    row.insert("Day".to_string(), RawValue::from("2025-03-03"));
    row.insert("Crew".to_string(), RawValue::from("C"));
    row.insert("Output".to_string(), RawValue::Number(1000.0));
    row.insert("Scrap".to_string(), RawValue::Number(0.0));
    row.insert("StopHours".to_string(), RawValue::Number(1e308));
    let outcome = process_batch(&table, "plant_5", &RawBatch::from_rows(vec![row]));

    assert!(outcome.records.is_empty());
    assert!(matches!(
        outcome.errors.as_slice(),
        [ValidationError::InvalidValue {
            field: CanonicalField::Downtime,
            problem: ValueProblem::TooLarge { .. },
            ..
        }]
    ));
}

#[test]
fn test_non_finite_text_rejected_in_each_numeric_column() {
    for column in ["Unidades", "Rechazos", "ParoMin"] {
        for text in ["inf", "1e400"] {
            let mut row = plant_3_row("2025-03-04", "A", 500.0, 10.0, 15.0);
            row.insert(column.to_string(), RawValue::from(text));
            let outcome = process_batch(&table(), "plant_3", &RawBatch::from_rows(vec![row]));

            assert!(outcome.records.is_empty(), "{column}={text}");
            assert!(
                outcome.errors.iter().any(|e| matches!(
                    e,
                    ValidationError::InvalidValue { column: c, problem: ValueProblem::NotANumber, .. }
                        if c == column
                )),
                "{column}={text}"
            );
        }
    }
}

fn shift_input() -> impl Strategy<Value = (RawValue, Shift)> {
    prop_oneof![
        Just((RawValue::Number(1.0), Shift::A)),
        Just((RawValue::Number(2.0), Shift::B)),
        Just((RawValue::Number(3.0), Shift::C)),
        Just((RawValue::from("1"), Shift::A)),
        Just((RawValue::from("a"), Shift::A)),
        Just((RawValue::from("B"), Shift::B)),
        Just((RawValue::from("c"), Shift::C)),
    ]
}

fn valid_record() -> impl Strategy<Value = NormalizedRecord> {
    (
        0i64..20_000,
        prop_oneof![Just(Shift::A), Just(Shift::B), Just(Shift::C)],
        0u64..1_000_000,
        0u64..1_000_000,
        0u32..100_000,
    )
        .prop_map(|(offset, shift, a, b, downtime_tenths)| {
            let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(offset);
            let (defects, produced) = if a <= b { (a, b) } else { (b, a) };
            NormalizedRecord::new(date, shift, produced, defects, downtime_tenths as f64 / 10.0)
        })
}

proptest! {
    #[test]
    fn prop_shift_forms_agree((value, expected) in shift_input()) {
        let mut row = plant_3_row("2025-03-04", "A", 10.0, 0.0, 0.0);
        row.insert("Turno".to_string(), value);
        let outcome = process_batch(&table(), "plant_3", &RawBatch::from_rows(vec![row]));
        prop_assert!(outcome.errors.is_empty());
        prop_assert_eq!(outcome.records[0].shift, expected);
    }

    #[test]
    fn prop_normalize_is_idempotent(records in prop::collection::vec(valid_record(), 0..20)) {
        let identity = PlantMapping::identity("plant_1");
        let batch = RawBatch::new(
            CanonicalField::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            records.iter().map(NormalizedRecord::to_raw_row).collect(),
        );
        let once = normalize(&batch, &identity);
        prop_assert!(once.errors.is_empty());
        prop_assert_eq!(&once.records, &records);

        let again = RawBatch::from_rows(once.records.iter().map(NormalizedRecord::to_raw_row).collect());
        let twice = normalize(&again.with_inferred_columns(), &identity);
        prop_assert_eq!(twice.records, once.records);
    }

    #[test]
    fn prop_accepted_counts_stay_within_bound(produced in 0f64..1e22) {
        let produced = produced.floor();
        let row = plant_3_row("2025-03-04", "A", produced, 0.0, 0.0);
        let outcome = process_batch(&table(), "plant_3", &RawBatch::from_rows(vec![row]));
        for record in &outcome.records {
            prop_assert!(record.bottles_produced <= MAX_COUNT);
            prop_assert_eq!(record.bottles_produced as f64, produced);
        }
        prop_assert_eq!(outcome.records.is_empty(), produced > MAX_COUNT as f64);
    }

    #[test]
    fn prop_defects_above_production_excluded(produced in 0u64..10_000, excess in 1u64..1_000) {
        let row = plant_3_row("2025-03-04", "B", produced as f64, (produced + excess) as f64, 0.0);
        let outcome = process_batch(&table(), "plant_3", &RawBatch::from_rows(vec![row]));
        prop_assert!(outcome.records.is_empty());
        let has_defect_rule = outcome.errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidValue { problem: ValueProblem::DefectsExceedProduction { .. }, .. }
        ));
        prop_assert!(has_defect_rule);
    }
}
