use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::aggregate;
use crate::config::EngineConfig;
use crate::db::Database;
use crate::import;
use crate::models::{Budget, FxRate, Timeframe, TransactionDraft, TxnType};

pub(crate) fn as_cli(args: &[String], db: &mut Database, user_id: i64) -> Result<()> {
    let cfg = EngineConfig::default();
    match args.get(1).map(String::as_str) {
        Some("import") => cli_import(&args[2..], db, user_id, &cfg),
        Some("template") => {
            print_template();
            Ok(())
        }
        Some("add") => cli_add(&args[2..], db, user_id, &cfg),
        Some("txns") => cli_txns(&args[2..], db, user_id),
        Some("delete") => cli_delete(&args[2..], db, user_id),
        Some("budget") => cli_budget(&args[2..], db, user_id),
        Some("rate") => cli_rate(&args[2..], db, user_id),
        Some("summary") | Some("s") => cli_summary(&args[2..], db, user_id, &cfg),
        None | Some("--help") | Some("-h") | Some("help") => {
            print_usage();
            Ok(())
        }
        Some("--version") | Some("-V") | Some("version") => {
            println!("kassa {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Kassa — local-only, multi-currency personal finance tracker");
    println!();
    println!("Usage: kassa <command>");
    println!();
    println!("Commands:");
    println!("  import <file.csv>             Validate a CSV import (dry run)");
    println!("    --commit                    Persist the accepted rows");
    println!("    --errors <path>             Write the row-error report (.csv or .json)");
    println!("  template                      Print a CSV template with sample rows");
    println!("  add <type> <category>[/<sub>] <amount> <currency> <date> [notes...]");
    println!("                                Record a transaction manually");
    println!("  txns [timeframe]              List transactions");
    println!("  delete <id>                   Delete a transaction");
    println!("  budget set <type> <category>[/<sub>] <amount> <currency> <timeframe>");
    println!("  budget list [timeframe]       List budgets");
    println!("  budget delete <id>            Delete a budget");
    println!("  rate add <code> <rate> <date> Add an FX rate to the base currency");
    println!("  rate list [code]              List FX rates");
    println!("  summary [timeframe]           Budget-vs-actual breakdown");
    println!();
    println!("Timeframes: YYYY-MM, YYYY-Qn, or YYYY (default: current month)");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

fn print_template() {
    println!("date,type,category,subcategory,amount,currency,notes");
    println!("2025-01-01,income,Salary,,1000,EUR,January salary");
    println!("2025-01-15,expense,Groceries,,45.30,EUR,Weekly shop");
}

// ── Import ────────────────────────────────────────────────────

fn cli_import(args: &[String], db: &mut Database, user_id: i64, cfg: &EngineConfig) -> Result<()> {
    let Some(file_path) = args.first().filter(|a| !a.starts_with('-')) else {
        anyhow::bail!("Usage: kassa import <file.csv> [--commit] [--errors <path>]");
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }
    let csv_text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {file_path}"))?;

    let do_commit = args.iter().any(|a| a == "--commit");
    let errors_path = args
        .windows(2)
        .find(|w| w[0] == "--errors")
        .map(|w| w[1].clone());

    let mapping = import::MappingConfig::default();

    // Always show the full dry-run picture before anything is persisted.
    let batch = import::dry_run(&csv_text, &mapping, cfg)?;
    if batch.columns.derives_type() {
        println!("No type column; deriving income/expense from the amount sign");
    }
    println!(
        "Accepted {} rows, rejected {}",
        batch.accepted_count(),
        batch.rejected_count()
    );
    for (row, warning) in batch.warnings() {
        match warning {
            import::RowWarning::UnknownCurrency(code) => {
                println!("  warning: row {row}: unknown currency {code} (add an FX rate before summarizing)");
            }
        }
    }
    for err in &batch.errors {
        println!("  row {}: {}: {}", err.row_number, err.field, err.message);
    }

    if let Some(out) = &errors_path {
        let report = if out.ends_with(".json") {
            import::errors_to_json(&batch.errors)?
        } else {
            import::errors_to_csv(&batch.errors)?
        };
        std::fs::write(out, report).with_context(|| format!("Failed to write {out}"))?;
        println!("Error report written to {out}");
    }

    if do_commit {
        let report = import::commit(db, user_id, &csv_text, &mapping, cfg)?;
        println!(
            "Imported {} transactions ({} rejected)",
            report.imported, report.rejected
        );
    } else {
        println!("Dry run only; re-run with --commit to persist the accepted rows");
    }
    Ok(())
}

// ── Manual entry ──────────────────────────────────────────────

fn cli_add(args: &[String], db: &mut Database, user_id: i64, cfg: &EngineConfig) -> Result<()> {
    if args.len() < 5 {
        anyhow::bail!(
            "Usage: kassa add <income|expense> <category>[/<sub>] <amount> <currency> <date> [notes...]"
        );
    }
    let kind = TxnType::parse(&args[0])
        .ok_or_else(|| anyhow::anyhow!("type must be 'income' or 'expense'"))?;
    let (category, subcategory) = split_category(&args[1]);
    if category.is_empty() {
        anyhow::bail!("category is required");
    }
    let amount = Decimal::from_str(&args[2]).context("amount must be a decimal number")?;
    if amount.is_zero() {
        anyhow::bail!("amount must not be zero");
    }
    let currency = args[3].to_uppercase();
    let date = parse_date(&args[4], cfg)?;
    let notes = args[5..].join(" ");

    let draft = TransactionDraft {
        kind,
        category,
        subcategory,
        date,
        amount: amount.abs(),
        currency,
        notes,
    };
    let ids = db.insert_transactions(user_id, &[draft])?;
    println!("Recorded transaction #{}", ids[0]);
    Ok(())
}

fn cli_txns(args: &[String], db: &mut Database, user_id: i64) -> Result<()> {
    let tf = parse_timeframe_arg(args.first())?;
    let txns = db.load_transactions(user_id, &tf)?;
    if txns.is_empty() {
        println!("No transactions in {tf}");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<8} {:<24} {:>12} {:<4}",
        "ID", "Date", "Type", "Category", "Amount", "Cur"
    );
    println!("{}", "─".repeat(70));
    for t in &txns {
        let category = match &t.subcategory {
            Some(sub) => format!("{}/{}", t.category, sub),
            None => t.category.clone(),
        };
        println!(
            "{:<5} {:<10} {:<8} {:<24} {:>12} {:<4}",
            t.id.unwrap_or(0),
            t.date,
            t.kind,
            category,
            t.amount,
            t.currency
        );
    }
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database, user_id: i64) -> Result<()> {
    let Some(id_arg) = args.first() else {
        anyhow::bail!("Usage: kassa delete <id>");
    };
    let id: i64 = id_arg.parse().context("id must be a number")?;
    if db.delete_transaction(user_id, id)? {
        println!("Deleted transaction #{id}");
    } else {
        println!("No transaction #{id}");
    }
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(args: &[String], db: &mut Database, user_id: i64) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("set") if args.len() >= 6 => {
            let kind = TxnType::parse(&args[1])
                .ok_or_else(|| anyhow::anyhow!("type must be 'income' or 'expense'"))?;
            let (category, subcategory) = split_category(&args[2]);
            if category.is_empty() {
                anyhow::bail!("category is required");
            }
            let amount = Decimal::from_str(&args[3]).context("amount must be a decimal number")?;
            let currency = args[4].to_uppercase();
            let tf = parse_timeframe_arg(Some(&args[5]))?;

            let budget = Budget::new(
                user_id,
                kind,
                category,
                subcategory,
                tf,
                amount.abs(),
                currency,
            );
            db.insert_budget(&budget)?;
            println!("Budget set for {} over {tf}", budget.category);
            Ok(())
        }
        Some("list") => {
            let tf = parse_timeframe_arg(args.get(1))?;
            let budgets = db.load_budgets(user_id, &tf)?;
            if budgets.is_empty() {
                println!("No budgets overlapping {tf}");
                return Ok(());
            }
            println!(
                "{:<5} {:<8} {:<24} {:>12} {:<4} Timeframe",
                "ID", "Type", "Category", "Amount", "Cur"
            );
            println!("{}", "─".repeat(80));
            for b in &budgets {
                let category = match &b.subcategory {
                    Some(sub) => format!("{}/{}", b.category, sub),
                    None => b.category.clone(),
                };
                println!(
                    "{:<5} {:<8} {:<24} {:>12} {:<4} {}",
                    b.id.unwrap_or(0),
                    b.kind,
                    category,
                    b.amount,
                    b.currency,
                    b.timeframe
                );
            }
            Ok(())
        }
        Some("delete") if args.len() >= 2 => {
            let id: i64 = args[1].parse().context("id must be a number")?;
            if db.delete_budget(user_id, id)? {
                println!("Deleted budget #{id}");
            } else {
                println!("No budget #{id}");
            }
            Ok(())
        }
        _ => anyhow::bail!(
            "Usage: kassa budget set <type> <category>[/<sub>] <amount> <currency> <timeframe>\n       kassa budget list [timeframe]\n       kassa budget delete <id>"
        ),
    }
}

// ── FX rates ──────────────────────────────────────────────────

fn cli_rate(args: &[String], db: &mut Database, user_id: i64) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") if args.len() >= 4 => {
            let currency = args[1].to_uppercase();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                anyhow::bail!("'{}' is not a 3-letter currency code", args[1]);
            }
            let rate = Decimal::from_str(&args[2]).context("rate must be a decimal number")?;
            if rate <= Decimal::ZERO {
                anyhow::bail!("rate must be positive");
            }
            let valid_from = NaiveDate::parse_from_str(&args[3], "%Y-%m-%d")
                .context("date must be YYYY-MM-DD")?;

            db.upsert_fx_rate(&FxRate::new(user_id, currency.clone(), rate, valid_from))?;
            println!("Rate {currency} -> base = {rate} from {valid_from}");
            Ok(())
        }
        Some("list") => {
            let rates = match args.get(1) {
                Some(code) => db.load_fx_rates(user_id, &code.to_uppercase())?,
                None => db.load_all_fx_rates(user_id)?,
            };
            if rates.is_empty() {
                println!("No FX rates");
                return Ok(());
            }
            println!("{:<4} {:>12} Valid from", "Cur", "Rate");
            println!("{}", "─".repeat(32));
            for r in &rates {
                println!("{:<4} {:>12} {}", r.currency, r.rate_to_base, r.valid_from);
            }
            Ok(())
        }
        _ => anyhow::bail!(
            "Usage: kassa rate add <code> <rate> <valid-from>\n       kassa rate list [code]"
        ),
    }
}

// ── Summary ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database, user_id: i64, cfg: &EngineConfig) -> Result<()> {
    let tf = parse_timeframe_arg(args.first())?;
    let txns = db.load_transactions(user_id, &tf)?;
    let budgets = db.load_budgets(user_id, &tf)?;
    let rates = db.load_all_fx_rates(user_id)?;
    let breakdown = aggregate::aggregate(&txns, &budgets, &rates, tf, cfg);

    println!(
        "Kassa — {} (amounts in {})",
        breakdown.timeframe, breakdown.base_currency
    );
    println!("{}", "─".repeat(64));
    println!("  Income:   {:.2}", breakdown.income_total);
    println!("  Expenses: {:.2}", breakdown.expense_total);
    println!(
        "  Net:      {:.2}",
        breakdown.income_total - breakdown.expense_total
    );

    if !breakdown.categories.is_empty() {
        println!();
        println!(
            "{:<8} {:<26} {:>10} {:>10} {:>10}",
            "Type", "Category", "Actual", "Budget", "Delta"
        );
        println!("{}", "─".repeat(68));
        for cat in &breakdown.categories {
            println!(
                "{:<8} {:<26} {:>10.2} {:>10.2} {:>10.2}",
                cat.kind, cat.category, cat.actual, cat.budget, cat.delta
            );
            let has_split = cat
                .subcategories
                .iter()
                .any(|row| row.subcategory.is_some());
            if has_split {
                for row in &cat.subcategories {
                    let name = row.subcategory.as_deref().unwrap_or("(none)");
                    println!(
                        "{:<8}   {:<24} {:>10.2} {:>10.2} {:>10.2}",
                        "", name, row.actual, row.budget, row.delta
                    );
                }
            }
        }
    }

    if !breakdown.is_complete() {
        println!();
        println!("Excluded (no applicable FX rate; totals are incomplete):");
        for u in &breakdown.unconverted {
            println!(
                "  #{} {} {} {} ({})",
                u.id.unwrap_or(0),
                u.date,
                u.amount,
                u.currency,
                u.category
            );
        }
    }
    if !breakdown.unconverted_budgets.is_empty() {
        println!();
        println!("Budgets skipped (no applicable FX rate):");
        for b in &breakdown.unconverted_budgets {
            let category = match &b.subcategory {
                Some(sub) => format!("{}/{}", b.category, sub),
                None => b.category.clone(),
            };
            println!("  {} {} ({})", b.kind, category, b.currency);
        }
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn split_category(s: &str) -> (String, Option<String>) {
    match s.split_once('/') {
        Some((cat, sub)) if !sub.trim().is_empty() => {
            (cat.trim().to_string(), Some(sub.trim().to_string()))
        }
        Some((cat, _)) => (cat.trim().to_string(), None),
        None => (s.trim().to_string(), None),
    }
}

fn parse_date(s: &str, cfg: &EngineConfig) -> Result<NaiveDate> {
    cfg.date_formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .ok_or_else(|| anyhow::anyhow!("'{s}' does not match any accepted date format"))
}

/// "2024-01" is a month, "2024-Q1" a quarter, "2024" a year.
fn parse_timeframe(s: &str) -> Option<Timeframe> {
    let s = s.trim();
    if let Some((y, q)) = s.split_once("-Q").or_else(|| s.split_once("-q")) {
        return Timeframe::quarter(y.parse().ok()?, q.parse().ok()?);
    }
    if s.contains('-') {
        return Timeframe::parse_month(s);
    }
    Timeframe::year(s.parse().ok()?)
}

fn parse_timeframe_arg(arg: Option<&String>) -> Result<Timeframe> {
    let raw = arg
        .cloned()
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m").to_string());
    parse_timeframe(&raw)
        .ok_or_else(|| anyhow::anyhow!("Invalid timeframe '{raw}'; use YYYY, YYYY-MM, or YYYY-Qn"))
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
