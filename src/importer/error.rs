// ==========================================
// Schedule Import - importer error types
// ==========================================
// Two tiers:
// - FieldError: one row is rejected, the batch continues
// - PipelineError: the whole import is aborted
// ==========================================

use crate::domain::ImportError;
use crate::importer::header_resolver::CanonicalField;
use crate::repository::RepositoryError;
use thiserror::Error;

// ==========================================
// FieldError - row-level failure
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Missing required field(s): {}", join_fields(.0))]
    MissingFields(Vec<CanonicalField>),

    #[error("Unrecognized day of week: '{0}'")]
    InvalidDay(String),

    #[error("Day of week out of range [0, 6]: {0}")]
    DayOutOfRange(i64),

    #[error("Invalid {field} '{value}' (expected HH:MM, HH.MM or HHMM)")]
    InvalidTime {
        field: CanonicalField,
        value: String,
    },

    #[error("Invalid subject id '{0}'")]
    InvalidSubjectId(String),

    #[error("Subject id {0} does not exist")]
    UnknownSubjectId(i64),
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FieldError {
    /// Convert into the collected row error
    pub fn into_import_error(self, row: usize) -> ImportError {
        ImportError::new(row, self.to_string())
    }
}

// ==========================================
// PipelineError - import-level failure
// ==========================================
#[derive(Error, Debug)]
pub enum PipelineError {
    // ===== input =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (expected .csv/.txt/.tsv/.xlsx/.xls/.ods)")]
    UnsupportedFormat(String),

    #[error("File read failed: {0}")]
    FileReadError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    #[error("Spreadsheet parse failed: {0}")]
    SpreadsheetParseError(String),

    #[error("Input contains no header row")]
    MissingHeader,

    // ===== outcome =====
    #[error("Nothing importable: 0 of {total} rows passed validation")]
    NothingImportable {
        total: usize,
        errors: Vec<ImportError>,
    },

    // ===== storage =====
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("File storage failed: {0}")]
    Storage(String),
}

impl PipelineError {
    /// Diagnostic detail for logs and API callers
    pub fn detail(&self) -> String {
        match self {
            PipelineError::NothingImportable { errors, .. } => errors
                .iter()
                .map(|e| format!("row {}: {}", e.row, e.error))
                .collect::<Vec<_>>()
                .join("; "),
            PipelineError::Database(inner) => format!("{:?}", inner),
            other => other.to_string(),
        }
    }

    /// Row errors carried by the failure, if any
    pub fn row_errors(&self) -> &[ImportError] {
        match self {
            PipelineError::NothingImportable { errors, .. } => errors,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(err.to_string()),
            _ => PipelineError::FileReadError(err.to_string()),
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for PipelineError {
    fn from(err: calamine::Error) -> Self {
        PipelineError::SpreadsheetParseError(err.to_string())
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        PipelineError::Database(RepositoryError::from(err))
    }
}

/// Result alias
pub type PipelineResult<T> = Result<T, PipelineError>;
