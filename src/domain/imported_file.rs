// ==========================================
// Schedule Import - import provenance model
// ==========================================
// An ImportedFile owns every schedule item its import created;
// both are deleted together.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportType - where the rows came from
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    Csv,
    Spreadsheet,
}

impl ImportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Csv => "csv",
            ImportType::Spreadsheet => "spreadsheet",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "spreadsheet" => ImportType::Spreadsheet,
            _ => ImportType::Csv,
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ImportStatus
// ==========================================
// `Error` marks an import that persisted rows but also rejected some
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Error,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "success",
            ImportStatus::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "error" => ImportStatus::Error,
            _ => ImportStatus::Success,
        }
    }

    pub fn from_counts(error_count: usize) -> Self {
        if error_count == 0 {
            ImportStatus::Success
        } else {
            ImportStatus::Error
        }
    }
}

// ==========================================
// ImportedFile - provenance record
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedFile {
    pub id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub file_path: Option<String>, // None for spreadsheet imports
    pub file_size: i64,
    pub mime_type: String,
    pub import_type: ImportType,
    pub status: ImportStatus,
    pub items_count: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Provenance record waiting to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImportedFile {
    pub original_name: String,
    pub stored_name: String,
    pub file_path: Option<String>,
    pub file_size: i64,
    pub mime_type: String,
    pub import_type: ImportType,
    pub status: ImportStatus,
    pub items_count: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

impl NewImportedFile {
    pub fn into_persisted(self, id: i64) -> ImportedFile {
        ImportedFile {
            id,
            original_name: self.original_name,
            stored_name: self.stored_name,
            file_path: self.file_path,
            file_size: self.file_size,
            mime_type: self.mime_type,
            import_type: self.import_type,
            status: self.status,
            items_count: self.items_count,
            success_count: self.success_count,
            error_count: self.error_count,
            uploaded_by: self.uploaded_by,
            created_at: self.created_at,
        }
    }
}

/// Outcome of a cascading provenance delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedImport {
    pub file: ImportedFile,
    pub deleted_items: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_type_round_trip_str() {
        assert_eq!(ImportType::parse("CSV"), ImportType::Csv);
        assert_eq!(ImportType::parse("spreadsheet"), ImportType::Spreadsheet);
        assert_eq!(ImportType::Spreadsheet.to_string(), "spreadsheet");
    }

    #[test]
    fn test_status_from_counts() {
        assert_eq!(ImportStatus::from_counts(0), ImportStatus::Success);
        assert_eq!(ImportStatus::from_counts(3), ImportStatus::Error);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ImportType::Spreadsheet).unwrap();
        assert_eq!(json, "\"spreadsheet\"");
    }
}
