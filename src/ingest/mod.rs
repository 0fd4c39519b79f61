//! Ingestion boundary: turns an uploaded table into typed telemetry rows.

mod csv;

pub use csv::parse_telemetry_csv;

use crate::types::TelemetryRecord;

/// One validated upload row, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRow {
    /// Device ID from the upload, if it carried one
    pub gpu_id: Option<String>,
    pub telemetry: TelemetryRecord,
}

/// Schema violations found while parsing an upload.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("upload is empty")]
    Empty,
    #[error("upload has a header but no data rows")]
    NoRows,
    #[error("upload has no telemetry columns")]
    NoTelemetryColumns,
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("line {line}: expected {expected} fields, found {actual}")]
    RowWidth {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },
}
