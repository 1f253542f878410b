use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A user-entered conversion rate into the base currency, effective from
/// `valid_from` until superseded by a later rate for the same currency.
#[derive(Debug, Clone)]
pub struct FxRate {
    pub id: Option<i64>,
    pub user_id: i64,
    pub currency: String,
    pub rate_to_base: Decimal,
    pub valid_from: NaiveDate,
}

impl FxRate {
    pub fn new(user_id: i64, currency: String, rate_to_base: Decimal, valid_from: NaiveDate) -> Self {
        Self {
            id: None,
            user_id,
            currency,
            rate_to_base,
            valid_from,
        }
    }
}
