use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::FxRate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum FxError {
    /// No rate with `valid_from <= on` exists for this currency. The user
    /// can fix it by adding a rate and retrying.
    #[error("no {currency} rate on or before {on}; add one with 'rate add {currency} <rate> <date>'")]
    NoApplicableRate { currency: String, on: NaiveDate },
}

/// Rate into the base currency effective on `on`: the rate with the largest
/// `valid_from` not after `on`. The base currency itself resolves to 1
/// without a lookup. Rates for other currencies in `rates` are ignored.
pub(crate) fn resolve(
    rates: &[FxRate],
    currency: &str,
    on: NaiveDate,
    base_currency: &str,
) -> Result<Decimal, FxError> {
    if currency.eq_ignore_ascii_case(base_currency) {
        return Ok(Decimal::ONE);
    }
    rates
        .iter()
        .filter(|r| r.currency.eq_ignore_ascii_case(currency) && r.valid_from <= on)
        .max_by_key(|r| r.valid_from)
        .map(|r| r.rate_to_base)
        .ok_or_else(|| FxError::NoApplicableRate {
            currency: currency.to_string(),
            on,
        })
}

/// Convert `amount` of `currency` into the base currency as of `on`.
pub(crate) fn convert(
    amount: Decimal,
    currency: &str,
    on: NaiveDate,
    rates: &[FxRate],
    base_currency: &str,
) -> Result<Decimal, FxError> {
    Ok(amount * resolve(rates, currency, on, base_currency)?)
}
