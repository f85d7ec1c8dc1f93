// ==========================================
// Schedule Import - API error types
// ==========================================
// Converts repository and pipeline failures into user-facing
// messages (localized) plus a diagnostic detail string.
// ==========================================

use crate::domain::ImportError;
use crate::i18n::{t, t_with_args};
use crate::importer::PipelineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API-layer error
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== request =====
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Business rule violated: {0}")]
    BusinessRuleViolation(String),

    // ===== import =====
    #[error("Import failed: {message}")]
    ImportFailed {
        message: String,
        detail: String,
        row_errors: Vec<ImportError>,
    },

    // ===== data access =====
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("Database transaction failed: {0}")]
    DatabaseTransactionError(String),
}

impl ApiError {
    /// Diagnostic detail (falls back to the display text)
    pub fn detail(&self) -> String {
        match self {
            ApiError::ImportFailed { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Row errors attached to a failed import
    pub fn row_errors(&self) -> &[ImportError] {
        match self {
            ApiError::ImportFailed { row_errors, .. } => row_errors,
            _ => &[],
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock acquisition failed: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("unique constraint: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("foreign key: {}", msg))
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let detail = err.detail();
        let message = match &err {
            PipelineError::FileNotFound(path) => {
                t_with_args("import.file_not_found", &[("path", path.as_str())])
            }
            PipelineError::UnsupportedFormat(name) => {
                t_with_args("import.unsupported_format", &[("name", name.as_str())])
            }
            PipelineError::FileReadError(_) => t("import.read_failed"),
            PipelineError::CsvParseError(_) | PipelineError::SpreadsheetParseError(_) => {
                t("import.parse_failed")
            }
            PipelineError::MissingHeader => t("import.missing_header"),
            PipelineError::NothingImportable { total, .. } => {
                let total = total.to_string();
                t_with_args("import.nothing_importable", &[("total", total.as_str())])
            }
            PipelineError::Storage(_) => t("import.storage_failed"),
            PipelineError::Database(_) => t("common.internal_error"),
        };

        match err {
            PipelineError::Database(inner) => ApiError::from(inner),
            PipelineError::NothingImportable { errors, .. } => ApiError::ImportFailed {
                message,
                detail,
                row_errors: errors,
            },
            _ => ApiError::ImportFailed {
                message,
                detail,
                row_errors: Vec::new(),
            },
        }
    }
}

/// Result alias
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_importable_keeps_row_errors() {
        let err = ApiError::from(PipelineError::NothingImportable {
            total: 1,
            errors: vec![ImportError::new(2, "Unrecognized day of week: 'x'")],
        });

        assert!(matches!(err, ApiError::ImportFailed { .. }));
        assert_eq!(err.row_errors().len(), 1);
        assert!(err.detail().contains("row 2"));
    }

    #[test]
    fn test_database_error_mapped_through_repository() {
        let err = ApiError::from(PipelineError::Database(
            RepositoryError::UniqueConstraintViolation("subjects.name".to_string()),
        ));
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_transaction_error_kept_distinct() {
        let err = ApiError::from(PipelineError::Database(
            RepositoryError::DatabaseTransactionError("cannot commit".to_string()),
        ));
        assert!(matches!(err, ApiError::DatabaseTransactionError(_)));
    }

    #[test]
    fn test_repository_not_found() {
        let err = ApiError::from(RepositoryError::NotFound {
            entity: "ImportedFile".to_string(),
            id: "9".to_string(),
        });
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(err.to_string().contains("ImportedFile(id=9)"));
    }
}
