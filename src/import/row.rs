use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::OnceLock;

use super::ColumnMap;
use crate::config::EngineConfig;
use crate::models::{TransactionDraft, TxnType};

/// Outcome of validating one data row. Every input row becomes exactly one
/// of these; callers must handle both cases.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RowOutcome {
    Accepted(AcceptedRow),
    Rejected(RowError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AcceptedRow {
    pub(crate) row_number: usize,
    pub(crate) draft: TransactionDraft,
    pub(crate) warnings: Vec<RowWarning>,
}

/// Row-local warning; the row is still accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowWarning {
    /// Well-formed code that is not a known ISO-4217 currency. The user may
    /// add an FX rate for it later.
    UnknownCurrency(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RowErrorKind {
    MissingField,
    InvalidDate,
    InvalidAmount,
    ZeroAmount,
    InvalidCurrency,
    InvalidType,
}

/// One rejected row, kept with its original cells so callers can show or
/// re-export exactly what was uploaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RowError {
    pub(crate) row_number: usize,
    pub(crate) raw_values: Vec<String>,
    pub(crate) kind: RowErrorKind,
    pub(crate) field: String,
    pub(crate) message: String,
}

/// Validate and coerce one raw data row against the column mapping.
/// Checks run in a fixed order and the first failure wins; a row is never
/// partially accepted.
pub(crate) fn validate_row(
    row_number: usize,
    raw: &[String],
    map: &ColumnMap,
    cfg: &EngineConfig,
) -> RowOutcome {
    // Pad short rows so positional reads cannot go out of bounds; extra
    // trailing cells pass through untouched.
    let mut cells: Vec<String> = raw.iter().map(|c| c.trim().to_string()).collect();
    if cells.len() < map.width() {
        cells.resize(map.width(), String::new());
    }

    let reject = |kind, field: &str, message: String| {
        RowOutcome::Rejected(RowError {
            row_number,
            raw_values: raw.to_vec(),
            kind,
            field: field.to_string(),
            message,
        })
    };

    // 1. Required fields present and non-empty.
    for (idx, field) in [
        (map.date, "date"),
        (map.amount, "amount"),
        (map.currency, "currency"),
        (map.category, "category"),
    ] {
        if cells[idx].is_empty() {
            return reject(
                RowErrorKind::MissingField,
                field,
                format!("{field} is required"),
            );
        }
    }

    // 2. Date against the configured formats.
    let Some(date) = parse_date(&cells[map.date], &cfg.date_formats) else {
        return reject(
            RowErrorKind::InvalidDate,
            "date",
            format!(
                "'{}' does not match any accepted date format",
                cells[map.date]
            ),
        );
    };

    // 3. Amount as an exact decimal, never through floating point.
    let Some(amount) = parse_decimal(&cells[map.amount]) else {
        return reject(
            RowErrorKind::InvalidAmount,
            "amount",
            format!("'{}' is not a valid decimal amount", cells[map.amount]),
        );
    };
    if amount.is_zero() {
        return reject(
            RowErrorKind::ZeroAmount,
            "amount",
            "a zero-value transaction carries no meaning".to_string(),
        );
    }

    // 4. Currency must look like a 3-letter code. Codes outside the known
    //    ISO list still pass, with a warning, since the matching FX rate may
    //    be added later.
    let currency = cells[map.currency].to_uppercase();
    if !currency_pattern().is_match(&currency) {
        return reject(
            RowErrorKind::InvalidCurrency,
            "currency",
            format!(
                "'{}' is not a 3-letter currency code",
                cells[map.currency]
            ),
        );
    }
    let mut warnings = Vec::new();
    if !is_known_currency(&currency) {
        warnings.push(RowWarning::UnknownCurrency(currency.clone()));
    }

    // 5. Type: an explicit column wins; an empty cell or unmapped column
    //    falls back to the amount sign.
    let kind = match map.kind.map(|i| cells[i].as_str()) {
        None | Some("") => TxnType::from_sign(amount),
        Some(cell) => match TxnType::parse(cell) {
            Some(kind) => kind,
            None => {
                return reject(
                    RowErrorKind::InvalidType,
                    "type",
                    format!("'{cell}' must be 'income' or 'expense'"),
                )
            }
        },
    };

    let subcategory = map
        .subcategory
        .map(|i| cells[i].clone())
        .filter(|s| !s.is_empty());
    let notes = map.notes.map(|i| cells[i].clone()).unwrap_or_default();

    RowOutcome::Accepted(AcceptedRow {
        row_number,
        draft: TransactionDraft {
            kind,
            category: cells[map.category].clone(),
            subcategory,
            date,
            amount: amount.abs(),
            currency,
            notes,
        },
        warnings,
    })
}

fn parse_date(s: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let mut cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != '€')
        .collect();
    // A single comma with no dot reads as a decimal comma ("42,50"); any
    // other comma is a thousands separator ("1,234.56").
    if cleaned.matches(',').count() == 1 && !cleaned.contains('.') {
        cleaned = cleaned.replace(',', ".");
    } else {
        cleaned = cleaned.replace(',', "");
    }
    Decimal::from_str(&cleaned).ok()
}

#[allow(clippy::unwrap_used)]
fn currency_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
}

/// ISO-4217 codes user files realistically carry. Codes outside this list
/// still import, with a warning.
const KNOWN_CURRENCIES: &[&str] = &[
    "AED", "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HRK",
    "HUF", "IDR", "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN",
    "RON", "RSD", "RUB", "SEK", "SGD", "THB", "TRY", "TWD", "USD", "ZAR",
];

fn is_known_currency(code: &str) -> bool {
    KNOWN_CURRENCIES.binary_search(&code).is_ok()
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
