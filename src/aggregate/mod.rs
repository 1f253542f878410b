use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::fx;
use crate::models::{Budget, FxRate, Timeframe, Transaction, TxnType};

/// One subcategory line beneath a category. `subcategory: None` holds the
/// entries recorded without a subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubcategoryRow {
    pub(crate) subcategory: Option<String>,
    pub(crate) actual: Decimal,
    pub(crate) budget: Decimal,
    pub(crate) delta: Decimal,
}

/// Category-level roll-up: its figures are the sums of its subcategory rows,
/// so the dashboard can show both levels from one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryBreakdown {
    pub(crate) kind: TxnType,
    pub(crate) category: String,
    pub(crate) actual: Decimal,
    pub(crate) budget: Decimal,
    pub(crate) delta: Decimal,
    pub(crate) subcategories: Vec<SubcategoryRow>,
}

/// A transaction left out of the sums because its currency had no applicable
/// rate on the transaction's own date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnconvertedTransaction {
    pub(crate) id: Option<i64>,
    pub(crate) date: NaiveDate,
    pub(crate) amount: Decimal,
    pub(crate) currency: String,
    pub(crate) category: String,
}

/// A budget skipped for the same reason; it contributes 0 to its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnconvertedBudget {
    pub(crate) kind: TxnType,
    pub(crate) category: String,
    pub(crate) subcategory: Option<String>,
    pub(crate) currency: String,
}

/// Budget-vs-actual comparison for one timeframe, in the base currency.
#[derive(Debug, Clone)]
pub(crate) struct Breakdown {
    pub(crate) timeframe: Timeframe,
    pub(crate) base_currency: String,
    pub(crate) categories: Vec<CategoryBreakdown>,
    pub(crate) income_total: Decimal,
    pub(crate) expense_total: Decimal,
    pub(crate) unconverted: Vec<UnconvertedTransaction>,
    pub(crate) unconverted_budgets: Vec<UnconvertedBudget>,
}

impl Breakdown {
    /// False when any transaction could not be converted, i.e. the sums
    /// undercount the timeframe.
    pub(crate) fn is_complete(&self) -> bool {
        self.unconverted.is_empty()
    }
}

/// Convert and group the user's transactions and budgets for one timeframe.
///
/// Each transaction converts at the rate valid on its own date, not the
/// aggregation date. `delta = actual - budget` per key; a key present in
/// only one of the two sides still gets a row, with 0 on the other side.
pub(crate) fn aggregate(
    txns: &[Transaction],
    budgets: &[Budget],
    rates: &[FxRate],
    timeframe: Timeframe,
    cfg: &EngineConfig,
) -> Breakdown {
    // (kind, category) -> subcategory -> (actual, budget)
    type SubTotals = BTreeMap<Option<String>, (Decimal, Decimal)>;
    let mut keys: BTreeMap<(TxnType, String), SubTotals> = BTreeMap::new();

    let mut unconverted = Vec::new();
    let mut income_total = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;

    for t in txns.iter().filter(|t| timeframe.contains(t.date)) {
        let converted = match fx::convert(t.amount, &t.currency, t.date, rates, &cfg.base_currency)
        {
            Ok(v) => v,
            Err(fx::FxError::NoApplicableRate { .. }) => {
                unconverted.push(UnconvertedTransaction {
                    id: t.id,
                    date: t.date,
                    amount: t.amount,
                    currency: t.currency.clone(),
                    category: t.category.clone(),
                });
                continue;
            }
        };
        match t.kind {
            TxnType::Income => income_total += converted,
            TxnType::Expense => expense_total += converted,
        }
        let slot = keys
            .entry((t.kind, t.category.clone()))
            .or_default()
            .entry(t.subcategory.clone())
            .or_default();
        slot.0 += converted;
    }

    let mut unconverted_budgets = Vec::new();
    for b in budgets.iter().filter(|b| b.timeframe.overlaps(&timeframe)) {
        // Budgets convert as of the start of their own timeframe.
        let converted = match fx::convert(
            b.amount,
            &b.currency,
            b.timeframe.start,
            rates,
            &cfg.base_currency,
        ) {
            Ok(v) => v,
            Err(fx::FxError::NoApplicableRate { .. }) => {
                unconverted_budgets.push(UnconvertedBudget {
                    kind: b.kind,
                    category: b.category.clone(),
                    subcategory: b.subcategory.clone(),
                    currency: b.currency.clone(),
                });
                continue;
            }
        };
        let slot = keys
            .entry((b.kind, b.category.clone()))
            .or_default()
            .entry(b.subcategory.clone())
            .or_default();
        slot.1 += converted;
    }

    let categories = keys
        .into_iter()
        .map(|((kind, category), subs)| {
            let rows: Vec<SubcategoryRow> = subs
                .into_iter()
                .map(|(subcategory, (actual, budget))| SubcategoryRow {
                    subcategory,
                    actual,
                    budget,
                    delta: actual - budget,
                })
                .collect();
            let actual: Decimal = rows.iter().map(|r| r.actual).sum();
            let budget: Decimal = rows.iter().map(|r| r.budget).sum();
            CategoryBreakdown {
                kind,
                category,
                actual,
                budget,
                delta: actual - budget,
                subcategories: rows,
            }
        })
        .collect();

    Breakdown {
        timeframe,
        base_currency: cfg.base_currency.clone(),
        categories,
        income_total,
        expense_total,
        unconverted,
        unconverted_budgets,
    }
}
