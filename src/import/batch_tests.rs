#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::import::{ImportError, RowErrorKind, RowWarning};
use crate::models::{Timeframe, TxnType};

const HEADER: &str = "date,type,category,subcategory,amount,currency,notes\n";

fn dry(csv_text: &str) -> ImportBatch {
    dry_run(csv_text, &MappingConfig::default(), &EngineConfig::default()).unwrap()
}

// ── Partition and ordering ────────────────────────────────────

#[test]
fn test_every_row_lands_in_exactly_one_set() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,January salary\n",
        "bad-date,expense,Groceries,,45.30,EUR,\n",
        "2025-01-15,expense,Groceries,,45.30,EUR,Weekly shop\n",
        "2025-01-16,expense,Groceries,,0,EUR,\n",
        "2025-01-17,expense,Eating Out,Coffee,3.20,EUR,\n",
    );
    let batch = dry(csv);
    assert_eq!(batch.accepted_count(), 3);
    assert_eq!(batch.rejected_count(), 2);
    assert_eq!(batch.accepted_count() + batch.rejected_count(), 5);

    // File order and original row numbers survive in both sequences.
    let accepted_rows: Vec<usize> = batch.accepted.iter().map(|r| r.row_number).collect();
    let error_rows: Vec<usize> = batch.errors.iter().map(|e| e.row_number).collect();
    assert_eq!(accepted_rows, vec![2, 4, 6]);
    assert_eq!(error_rows, vec![3, 5]);
}

#[test]
fn test_german_header_sample_rows() {
    let csv = concat!(
        "Datum,Betrag,Währung,Kategorie\n",
        "2024-01-05,-42.50,EUR,Groceries\n",
        "2024-01-06,0,EUR,Groceries\n",
    );
    let batch = dry(csv);
    assert!(batch.columns.derives_type());

    assert_eq!(batch.accepted_count(), 1);
    let draft = &batch.accepted[0].draft;
    assert_eq!(draft.kind, TxnType::Expense);
    assert_eq!(draft.amount, dec!(42.50));
    assert_eq!(draft.currency, "EUR");

    assert_eq!(batch.rejected_count(), 1);
    let err = &batch.errors[0];
    assert_eq!(err.kind, RowErrorKind::ZeroAmount);
    assert_eq!(err.row_number, 3);
    assert_eq!(err.raw_values, vec!["2024-01-06", "0", "EUR", "Groceries"]);
}

#[test]
fn test_dry_run_is_idempotent() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,\n",
        "oops,expense,Groceries,,45.30,EUR,\n",
    );
    let a = dry(csv);
    let b = dry(csv);
    assert_eq!(a.accepted, b.accepted);
    assert_eq!(a.errors, b.errors);
}

#[test]
fn test_short_and_long_rows() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR\n",
        "2025-01-02,expense,Groceries,,12.00,EUR,shop,EXTRA,CELLS\n",
    );
    let batch = dry(csv);
    assert_eq!(batch.accepted_count(), 2);
    assert_eq!(batch.rejected_count(), 0);
    assert_eq!(batch.accepted[1].draft.notes, "shop");
}

#[test]
fn test_warnings_carry_row_numbers() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,\n",
        "2025-01-02,expense,Travel,,99,XXY,\n",
    );
    let batch = dry(csv);
    let warnings: Vec<(usize, &RowWarning)> = batch.warnings().collect();
    assert_eq!(warnings, vec![(3, &RowWarning::UnknownCurrency("XXY".into()))]);
}

// ── Batch-fatal failures ──────────────────────────────────────

#[test]
fn test_empty_file() {
    let err = dry_run("", &MappingConfig::default(), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, ImportError::EmptyFile));
}

#[test]
fn test_header_only_file_is_an_empty_batch() {
    let batch = dry(HEADER);
    assert_eq!(batch.accepted_count(), 0);
    assert_eq!(batch.rejected_count(), 0);
}

#[test]
fn test_unmappable_header_aborts() {
    let err = dry_run(
        "foo,bar\n1,2\n",
        &MappingConfig::default(),
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::UnmappableHeader { .. }));
}

#[test]
fn test_import_too_large_fails_fast() {
    let cfg = EngineConfig {
        max_import_rows: 2,
        ..EngineConfig::default()
    };
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,\n",
        "2025-01-02,expense,Groceries,,10,EUR,\n",
        "2025-01-03,expense,Groceries,,11,EUR,\n",
    );
    let err = dry_run(csv, &MappingConfig::default(), &cfg).unwrap_err();
    assert!(matches!(err, ImportError::ImportTooLarge { limit: 2 }));
}

// ── Commit ────────────────────────────────────────────────────

#[test]
fn test_commit_persists_accepted_rows_only() {
    let mut db = Database::open_in_memory().unwrap();
    let user_id = db.ensure_user("default").unwrap();
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,January salary\n",
        "bad-date,expense,Groceries,,45.30,EUR,\n",
        "2025-01-15,expense,Groceries,,45.30,EUR,Weekly shop\n",
    );
    let report = commit(&mut db, user_id, csv, &MappingConfig::default(), &EngineConfig::default()).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.errors[0].row_number, 3);

    let tf = Timeframe::month(2025, 1).unwrap();
    let stored = db.load_transactions(user_id, &tf).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].category, "Salary");
    assert_eq!(stored[1].amount, dec!(45.30));
}

#[test]
fn test_commit_matches_dry_run_partition() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,\n",
        "2025-01-02,expense,Groceries,,0,EUR,\n",
        "2025-01-03,expense,Groceries,,9.99,EUR,\n",
    );
    let batch = dry(csv);

    let mut db = Database::open_in_memory().unwrap();
    let user_id = db.ensure_user("default").unwrap();
    let report = commit(&mut db, user_id, csv, &MappingConfig::default(), &EngineConfig::default()).unwrap();

    assert_eq!(report.imported, batch.accepted_count());
    assert_eq!(report.rejected, batch.rejected_count());
    assert_eq!(report.errors, batch.errors);
}

#[test]
fn test_commit_of_oversized_file_persists_nothing() {
    let cfg = EngineConfig {
        max_import_rows: 1,
        ..EngineConfig::default()
    };
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-01,income,Salary,,1000,EUR,\n",
        "2025-01-02,expense,Groceries,,10,EUR,\n",
    );
    let mut db = Database::open_in_memory().unwrap();
    let user_id = db.ensure_user("default").unwrap();
    assert!(commit(&mut db, user_id, csv, &MappingConfig::default(), &cfg).is_err());

    let tf = Timeframe::month(2025, 1).unwrap();
    assert!(db.load_transactions(user_id, &tf).unwrap().is_empty());
}

// ── Error report export ───────────────────────────────────────

#[test]
fn test_errors_to_csv_round_trips_raw_values() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-02,expense,Groceries,,0,EUR,has \"quotes\", and commas\n",
    );
    let batch = dry(csv);
    let report = errors_to_csv(&batch.errors).unwrap();

    let mut lines = report.lines();
    assert_eq!(lines.next().unwrap(), "row_number,field,message,raw_values");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(report.as_bytes());
    let rec = rdr.records().next().unwrap().unwrap();
    assert_eq!(&rec[0], "2");
    assert_eq!(&rec[1], "amount");
    let raw: Vec<String> = serde_json::from_str(&rec[3]).unwrap();
    assert_eq!(raw, batch.errors[0].raw_values);
}

#[test]
fn test_errors_to_json_shape() {
    let csv = concat!(
        "date,type,category,subcategory,amount,currency,notes\n",
        "2025-01-02,expense,Groceries,,0,EUR,\n",
    );
    let batch = dry(csv);
    let json: serde_json::Value = serde_json::from_str(&errors_to_json(&batch.errors).unwrap()).unwrap();
    assert_eq!(json[0]["row_number"], 2);
    assert_eq!(json[0]["field"], "amount");
}
