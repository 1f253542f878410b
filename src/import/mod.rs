mod batch;
mod mapper;
mod row;

use thiserror::Error;

pub(crate) use batch::{commit, dry_run, errors_to_csv, errors_to_json, ImportBatch, ImportReport};
pub(crate) use mapper::{map_header, ColumnMap, MappingConfig};
pub(crate) use row::{validate_row, AcceptedRow, RowError, RowErrorKind, RowOutcome, RowWarning};

/// Failures that abort the whole import before any row outcome exists.
/// Row-level problems never surface here; they are collected per row.
#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("CSV file is empty")]
    EmptyFile,
    #[error("no column found for required field(s): {}", missing.join(", "))]
    UnmappableHeader { missing: Vec<String> },
    #[error("import exceeds the limit of {limit} data rows")]
    ImportTooLarge { limit: usize },
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}
