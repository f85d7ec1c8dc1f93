// ==========================================
// Schedule Import - schedule domain model
// ==========================================
// Row shapes flowing through the import pipeline and the
// persisted schedule item they end up as.
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RawRow - one parsed source row
// ==========================================
// Lifetime: one import call, consumed by the header resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,              // 1-based source row (header row = 1)
    pub cells: HashMap<String, String>, // header label -> raw cell
}

impl RawRow {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells.get(label).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

// ==========================================
// CanonicalRow - normalized, not yet validated
// ==========================================
// Times are already canonical `HH:MM` when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub source_row_number: usize,
    pub subject_name: Option<String>,
    pub day_of_week: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room_number: Option<String>,
    pub teacher_name: Option<String>,
    pub subject_id: Option<i64>, // spreadsheet sources may pre-resolve the subject
}

// ==========================================
// ValidatedRow - passed RowValidator
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub source_row_number: usize,
    pub subject_name: String,
    pub day_of_week: i32, // 0 = Sunday .. 6 = Saturday
    pub start_time: String,
    pub end_time: String,
    pub room_number: Option<String>,
    pub teacher_name: Option<String>,
    pub subject_id: Option<i64>,
}

// ==========================================
// ImportError - row-level failure
// ==========================================
// Never propagated past a single row; always collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    pub row: usize,
    pub error: String,
}

impl ImportError {
    pub fn new(row: usize, error: impl Into<String>) -> Self {
        Self {
            row,
            error: error.into(),
        }
    }
}

// ==========================================
// ScheduleItem - persisted lesson slot
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: i64,
    pub subject_id: i64,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub room_number: Option<String>,
    pub teacher_name: Option<String>,
    pub imported_file_id: Option<i64>,
}

/// Schedule item waiting to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScheduleItem {
    pub subject_id: i64,
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub room_number: Option<String>,
    pub teacher_name: Option<String>,
}

impl NewScheduleItem {
    pub fn from_validated(row: ValidatedRow, subject_id: i64) -> Self {
        Self {
            subject_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            room_number: row.room_number,
            teacher_name: row.teacher_name,
        }
    }
}

// ==========================================
// ImportResult - per-import summary
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ImportError>,
}
