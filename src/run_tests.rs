#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use super::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_split_category() {
    assert_eq!(split_category("Groceries"), ("Groceries".into(), None));
    assert_eq!(
        split_category("Groceries/Produce"),
        ("Groceries".into(), Some("Produce".into()))
    );
    assert_eq!(split_category("Groceries/"), ("Groceries".into(), None));
    assert_eq!(
        split_category(" Eating Out / Coffee "),
        ("Eating Out".into(), Some("Coffee".into()))
    );
}

#[test]
fn test_parse_timeframe_month() {
    let tf = parse_timeframe("2024-01").unwrap();
    assert_eq!(tf, Timeframe::month(2024, 1).unwrap());
}

#[test]
fn test_parse_timeframe_quarter() {
    let tf = parse_timeframe("2024-Q2").unwrap();
    assert_eq!(tf, Timeframe::quarter(2024, 2).unwrap());
    let tf = parse_timeframe("2024-q2").unwrap();
    assert_eq!(tf, Timeframe::quarter(2024, 2).unwrap());
}

#[test]
fn test_parse_timeframe_year() {
    let tf = parse_timeframe("2024").unwrap();
    assert_eq!(tf, Timeframe::year(2024).unwrap());
}

#[test]
fn test_parse_timeframe_invalid() {
    assert!(parse_timeframe("Q2-2024").is_none());
    assert!(parse_timeframe("2024-13").is_none());
    assert!(parse_timeframe("soon").is_none());
}

#[test]
fn test_parse_date_uses_config_formats() {
    let cfg = EngineConfig::default();
    assert_eq!(parse_date("2024-01-05", &cfg).unwrap(), d(2024, 1, 5));
    assert_eq!(parse_date("05.01.2024", &cfg).unwrap(), d(2024, 1, 5));
    assert!(parse_date("Jan 5", &cfg).is_err());
}

#[test]
fn test_end_to_end_import_then_summary_inputs() {
    // Wires the CLI pieces the way cli_import/cli_summary do, without stdout.
    let mut db = Database::open_in_memory().unwrap();
    let user_id = db.ensure_user("default").unwrap();
    let cfg = EngineConfig::default();

    let csv = concat!(
        "Datum,Betrag,Währung,Kategorie\n",
        "2024-01-05,-42.50,EUR,Groceries\n",
        "2024-01-09,-100,USD,Travel\n",
        "2024-01-10,2000,EUR,Salary\n",
    );
    let report = import::commit(&mut db, user_id, csv, &import::MappingConfig::default(), &cfg).unwrap();
    assert_eq!(report.imported, 3);

    db.upsert_fx_rate(&FxRate::new(user_id, "USD".into(), rust_decimal_macros::dec!(0.90), d(2024, 1, 1)))
        .unwrap();

    let tf = parse_timeframe("2024-01").unwrap();
    let txns = db.load_transactions(user_id, &tf).unwrap();
    let budgets = db.load_budgets(user_id, &tf).unwrap();
    let rates = db.load_all_fx_rates(user_id).unwrap();
    let breakdown = aggregate::aggregate(&txns, &budgets, &rates, tf, &cfg);

    assert!(breakdown.is_complete());
    assert_eq!(breakdown.income_total, rust_decimal_macros::dec!(2000));
    assert_eq!(breakdown.expense_total, rust_decimal_macros::dec!(132.50));
}
