use anyhow::{Context, Result};
use serde::Serialize;

use super::{map_header, validate_row, AcceptedRow, ColumnMap, ImportError, MappingConfig, RowError, RowOutcome, RowWarning};
use crate::config::EngineConfig;
use crate::db::Database;

/// Result of one validation pass over a whole file. Every data row lands in
/// exactly one of `accepted` or `errors`, both in original file order with
/// original row numbers (header is line 1, first data row is line 2).
///
/// Exists only in memory: a batch is either committed or simply dropped.
#[derive(Debug)]
pub(crate) struct ImportBatch {
    pub(crate) columns: ColumnMap,
    pub(crate) accepted: Vec<AcceptedRow>,
    pub(crate) errors: Vec<RowError>,
}

impl ImportBatch {
    pub(crate) fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub(crate) fn rejected_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn warnings(&self) -> impl Iterator<Item = (usize, &RowWarning)> {
        self.accepted
            .iter()
            .flat_map(|row| row.warnings.iter().map(move |w| (row.row_number, w)))
    }
}

/// Summary handed back after a commit.
#[derive(Debug, Serialize)]
pub(crate) struct ImportReport {
    pub(crate) imported: usize,
    pub(crate) rejected: usize,
    pub(crate) errors: Vec<RowError>,
}

/// Validate a whole CSV without touching the database. The caller reviews
/// the batch before offering a commit.
pub(crate) fn dry_run(
    csv_text: &str,
    mapping: &MappingConfig,
    cfg: &EngineConfig,
) -> Result<ImportBatch, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(csv_text.as_bytes());

    let mut records = rdr.records();
    let header: Vec<String> = match records.next() {
        Some(rec) => rec?.iter().map(|c| c.to_string()).collect(),
        None => return Err(ImportError::EmptyFile),
    };
    let columns = map_header(&header, mapping)?;

    let mut accepted = Vec::new();
    let mut errors = Vec::new();
    let mut data_rows = 0usize;

    for (i, rec) in records.enumerate() {
        data_rows += 1;
        if data_rows > cfg.max_import_rows {
            return Err(ImportError::ImportTooLarge {
                limit: cfg.max_import_rows,
            });
        }
        let raw: Vec<String> = rec?.iter().map(|c| c.to_string()).collect();
        // Header is line 1, so the first data row is line 2.
        match validate_row(i + 2, &raw, &columns, cfg) {
            RowOutcome::Accepted(row) => accepted.push(row),
            RowOutcome::Rejected(err) => errors.push(err),
        }
    }

    Ok(ImportBatch {
        columns,
        accepted,
        errors,
    })
}

/// Re-validate and persist every accepted row in a single transaction.
/// Validation has no side effects, so a commit after a reviewed dry-run
/// yields the same accepted/rejected partition; the insert is
/// all-or-nothing.
pub(crate) fn commit(
    db: &mut Database,
    user_id: i64,
    csv_text: &str,
    mapping: &MappingConfig,
    cfg: &EngineConfig,
) -> Result<ImportReport> {
    let batch = dry_run(csv_text, mapping, cfg)?;
    let drafts: Vec<_> = batch.accepted.iter().map(|row| row.draft.clone()).collect();
    db.insert_transactions(user_id, &drafts)
        .context("failed to persist import batch")?;
    Ok(ImportReport {
        imported: batch.accepted.len(),
        rejected: batch.errors.len(),
        errors: batch.errors,
    })
}

/// Render the error list as CSV, one row per rejected input row, suitable
/// for download and re-editing. Raw cells are kept as a JSON array so the
/// original row survives round-tripping.
pub(crate) fn errors_to_csv(errors: &[RowError]) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(["row_number", "field", "message", "raw_values"])
        .context("failed to write error report header")?;
    for e in errors {
        let raw = serde_json::to_string(&e.raw_values)?;
        w.write_record([e.row_number.to_string(), e.field.clone(), e.message.clone(), raw])
            .context("failed to write error report row")?;
    }
    let bytes = w.into_inner().context("failed to flush error report")?;
    String::from_utf8(bytes).context("error report is not UTF-8")
}

pub(crate) fn errors_to_json(errors: &[RowError]) -> Result<String> {
    serde_json::to_string_pretty(errors).context("failed to serialize error report")
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
