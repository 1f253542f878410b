mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────

    /// Id of the named user, creating the row on first use.
    pub(crate) fn ensure_user(&self, name: &str) -> Result<i64> {
        let existing = self
            .conn
            .query_row("SELECT id FROM users WHERE name = ?1", params![name], |row| {
                row.get(0)
            });
        match existing {
            Ok(id) => Ok(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                self.conn.execute(
                    "INSERT INTO users (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Transactions ──────────────────────────────────────────

    /// Persist a batch of drafts in one transaction: either every draft is
    /// stored or none are.
    pub(crate) fn insert_transactions(
        &mut self,
        user_id: i64,
        drafts: &[TransactionDraft],
    ) -> Result<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            tx.execute(
                "INSERT INTO transactions (user_id, kind, category, subcategory, date, amount, currency, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user_id,
                    draft.kind.as_str(),
                    draft.category,
                    draft.subcategory,
                    draft.date.to_string(),
                    draft.amount.to_string(),
                    draft.currency,
                    draft.notes,
                    now,
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;
        Ok(ids)
    }

    pub(crate) fn load_transactions(
        &self,
        user_id: i64,
        timeframe: &Timeframe,
    ) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, kind, category, subcategory, date, amount, currency, notes, created_at
             FROM transactions
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                timeframe.start.to_string(),
                timeframe.end.to_string()
            ],
            |row| {
                let kind: String = row.get(2)?;
                let date: String = row.get(5)?;
                let amount: String = row.get(6)?;
                Ok(Transaction {
                    id: Some(row.get(0)?),
                    user_id: row.get(1)?,
                    kind: TxnType::parse(&kind).unwrap_or(TxnType::Expense),
                    category: row.get(3)?,
                    subcategory: row.get(4)?,
                    date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
                    amount: Decimal::from_str(&amount).unwrap_or_default(),
                    currency: row.get(7)?,
                    notes: row.get(8)?,
                    created_at: row.get(9)?,
                })
            },
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_transaction(&self, user_id: i64, id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(affected > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    /// Insert a budget, rejecting any timeframe overlap with an existing
    /// budget for the same (kind, category, subcategory) key.
    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<i64> {
        let overlapping: bool = self.conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM budgets
                 WHERE user_id = ?1 AND kind = ?2 AND category = ?3
                   AND IFNULL(subcategory, '') = IFNULL(?4, '')
                   AND start_date <= ?6 AND end_date >= ?5)",
            params![
                budget.user_id,
                budget.kind.as_str(),
                budget.category,
                budget.subcategory,
                budget.timeframe.start.to_string(),
                budget.timeframe.end.to_string(),
            ],
            |row| row.get(0),
        )?;
        if overlapping {
            anyhow::bail!(
                "a {} budget for '{}' already overlaps {}",
                budget.kind,
                budget.category,
                budget.timeframe
            );
        }

        self.conn.execute(
            "INSERT INTO budgets (user_id, kind, category, subcategory, start_date, end_date, amount, currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                budget.user_id,
                budget.kind.as_str(),
                budget.category,
                budget.subcategory,
                budget.timeframe.start.to_string(),
                budget.timeframe.end.to_string(),
                budget.amount.to_string(),
                budget.currency,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Budgets whose timeframe overlaps the given one.
    pub(crate) fn load_budgets(&self, user_id: i64, timeframe: &Timeframe) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, kind, category, subcategory, start_date, end_date, amount, currency
             FROM budgets
             WHERE user_id = ?1 AND start_date <= ?3 AND end_date >= ?2
             ORDER BY kind, category, subcategory",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                timeframe.start.to_string(),
                timeframe.end.to_string()
            ],
            |row| {
                let kind: String = row.get(2)?;
                let start: String = row.get(5)?;
                let end: String = row.get(6)?;
                let amount: String = row.get(7)?;
                Ok(Budget {
                    id: Some(row.get(0)?),
                    user_id: row.get(1)?,
                    kind: TxnType::parse(&kind).unwrap_or(TxnType::Expense),
                    category: row.get(3)?,
                    subcategory: row.get(4)?,
                    timeframe: Timeframe {
                        start: NaiveDate::parse_from_str(&start, "%Y-%m-%d").unwrap_or_default(),
                        end: NaiveDate::parse_from_str(&end, "%Y-%m-%d").unwrap_or_default(),
                    },
                    amount: Decimal::from_str(&amount).unwrap_or_default(),
                    currency: row.get(8)?,
                })
            },
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_budget(&self, user_id: i64, id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM budgets WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(affected > 0)
    }

    // ── FX rates ──────────────────────────────────────────────

    /// Insert or update the rate for (currency, valid_from). Re-entering a
    /// rate for the same date replaces it.
    pub(crate) fn upsert_fx_rate(&self, rate: &FxRate) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO fx_rates (user_id, currency, rate_to_base, valid_from)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, currency, valid_from) DO UPDATE SET rate_to_base = ?3",
            params![
                rate.user_id,
                rate.currency,
                rate.rate_to_base.to_string(),
                rate.valid_from.to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn load_fx_rates(&self, user_id: i64, currency: &str) -> Result<Vec<FxRate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, currency, rate_to_base, valid_from
             FROM fx_rates
             WHERE user_id = ?1 AND currency = ?2
             ORDER BY valid_from",
        )?;
        let rows = stmt.query_map(params![user_id, currency], Self::fx_rate_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn load_all_fx_rates(&self, user_id: i64) -> Result<Vec<FxRate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, currency, rate_to_base, valid_from
             FROM fx_rates
             WHERE user_id = ?1
             ORDER BY currency, valid_from",
        )?;
        let rows = stmt.query_map(params![user_id], Self::fx_rate_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn fx_rate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FxRate> {
        let rate: String = row.get(3)?;
        let valid_from: String = row.get(4)?;
        Ok(FxRate {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            currency: row.get(2)?,
            rate_to_base: Decimal::from_str(&rate).unwrap_or_default(),
            valid_from: NaiveDate::parse_from_str(&valid_from, "%Y-%m-%d").unwrap_or_default(),
        })
    }
}
