use rust_decimal::Decimal;

use super::{Timeframe, TxnType};

/// A planned amount for one (kind, category, subcategory) key over one
/// timeframe. At most one budget may cover a key for any given date.
#[derive(Debug, Clone)]
pub struct Budget {
    pub id: Option<i64>,
    pub user_id: i64,
    pub kind: TxnType,
    pub category: String,
    pub subcategory: Option<String>,
    pub timeframe: Timeframe,
    pub amount: Decimal,
    pub currency: String,
}

impl Budget {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: i64,
        kind: TxnType,
        category: String,
        subcategory: Option<String>,
        timeframe: Timeframe,
        amount: Decimal,
        currency: String,
    ) -> Self {
        Self {
            id: None,
            user_id,
            kind,
            category,
            subcategory,
            timeframe,
            amount,
            currency,
        }
    }
}
