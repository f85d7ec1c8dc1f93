// ==========================================
// Schedule Import - importer interface
// ==========================================
// Input sources, options and outcome of one import call,
// plus the ScheduleImporter trait.
// ==========================================

use crate::domain::{ImportResult, ImportedFile};
use crate::importer::error::PipelineResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// ImportSource
// ==========================================
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// Uploaded delimited text file (.csv/.tsv/.txt)
    File {
        bytes: Vec<u8>,
        original_name: String,
        mime_type: String,
    },
    /// Rows fetched from an external spreadsheet; first row is the header
    Spreadsheet { name: String, rows: Vec<Vec<String>> },
}

impl ImportSource {
    pub fn display_name(&self) -> &str {
        match self {
            ImportSource::File { original_name, .. } => original_name,
            ImportSource::Spreadsheet { name, .. } => name,
        }
    }
}

// ==========================================
// ImportOptions
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// User recorded as the uploader
    pub uploaded_by: i64,
    /// Explicit header labels; when set, every input line is data
    pub header_override: Option<Vec<String>>,
}

impl ImportOptions {
    pub fn new(uploaded_by: i64) -> Self {
        Self {
            uploaded_by,
            header_override: None,
        }
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.header_override = Some(headers);
        self
    }
}

// ==========================================
// ImportOutcome
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub result: ImportResult,
    pub imported_file: ImportedFile,
}

// ==========================================
// ScheduleImporter Trait
// ==========================================
// Implementor: ScheduleImporterImpl
#[async_trait]
pub trait ScheduleImporter: Send + Sync {
    /// Run the full pipeline for one source
    ///
    /// # Returns
    /// - Ok(ImportOutcome): at least one row persisted
    /// - Err(NothingImportable): no row survived; nothing persisted
    /// - Err: I/O, parse or persistence failure; nothing persisted
    async fn import_schedule_items(
        &self,
        source: ImportSource,
        options: ImportOptions,
    ) -> PipelineResult<ImportOutcome>;

    /// Import a file from disk (.csv/.tsv/.txt or .xlsx/.xls/.ods)
    async fn import_from_path(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> PipelineResult<ImportOutcome>;
}
