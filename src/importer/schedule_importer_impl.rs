// ==========================================
// Schedule Import - import coordinator
// ==========================================
// Flow: decode -> detect delimiter -> parse -> resolve headers ->
//       per row (normalize -> validate -> resolve subject) ->
//       persist items + ImportedFile + back-link (one transaction)
// Row faults are collected; only I/O or persistence faults abort.
// ==========================================

use crate::config::{ImportConfig, ImportConfigReader};
use crate::domain::{
    ImportError, ImportResult, ImportStatus, ImportType, NewImportedFile, NewScheduleItem,
};
use crate::importer::delimiter_detector::detect_delimiter_with_sample;
use crate::importer::encoding_detector::{detect_and_decode, read_file_bytes};
use crate::importer::error::{PipelineError, PipelineResult};
use crate::importer::field_normalizer::normalize;
use crate::importer::file_store::{file_extension, generate_stored_name, FileStore};
use crate::importer::header_resolver::{HeaderAliasTable, HeaderResolver};
use crate::importer::row_parser::{load_workbook_grid, ParsedTable, RowParser};
use crate::importer::row_validator::RowValidator;
use crate::importer::schedule_importer_trait::{
    ImportOptions, ImportOutcome, ImportSource, ScheduleImporter,
};
use crate::importer::subject_resolver::SubjectResolver;
use crate::repository::ScheduleImportRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Extensions accepted as delimited text uploads
pub const TEXT_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Extensions read as workbooks by `import_from_path`
pub const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// MIME type recorded for external spreadsheet sources
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        _ => "text/csv",
    }
}

// ==========================================
// ImportStage - pipeline progress
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    Decoding,
    HeaderResolved,
    RowProcessing,
    Persisting,
    ProvenanceRecorded,
    Done,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Idle => "idle",
            ImportStage::Decoding => "decoding",
            ImportStage::HeaderResolved => "header_resolved",
            ImportStage::RowProcessing => "row_processing",
            ImportStage::Persisting => "persisting",
            ImportStage::ProvenanceRecorded => "provenance_recorded",
            ImportStage::Done => "done",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StageTracker {
    current: ImportStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: ImportStage::Idle,
        }
    }

    fn advance(&mut self, next: ImportStage) {
        debug!(from = %self.current, to = %next, "import stage");
        self.current = next;
    }
}

// Rows plus the provenance facts known before row processing
struct PreparedSource {
    table: ParsedTable,
    original_name: String,
    stored_name: String,
    stored_path: Option<PathBuf>,
    file_size: i64,
    mime_type: String,
    import_type: ImportType,
}

// ==========================================
// ScheduleImporterImpl
// ==========================================
pub struct ScheduleImporterImpl {
    repo: Arc<dyn ScheduleImportRepository>,
    config: Arc<dyn ImportConfigReader>,
    file_store: Arc<dyn FileStore>,
    header_resolver: HeaderResolver,
}

impl ScheduleImporterImpl {
    pub fn new(
        repo: Arc<dyn ScheduleImportRepository>,
        config: Arc<dyn ImportConfigReader>,
        file_store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            repo,
            config,
            file_store,
            header_resolver: HeaderResolver::default(),
        }
    }

    /// Replace the bilingual default alias table
    pub fn with_alias_table(mut self, table: HeaderAliasTable) -> Self {
        self.header_resolver = HeaderResolver::new(table);
        self
    }

    // Decode, parse the header and store the upload
    fn prepare_source(
        &self,
        source: ImportSource,
        options: &ImportOptions,
        config: &ImportConfig,
    ) -> PipelineResult<PreparedSource> {
        match source {
            ImportSource::File {
                bytes,
                original_name,
                mime_type,
            } => {
                match file_extension(&original_name) {
                    Some(ext) if !TEXT_EXTENSIONS.contains(&ext.as_str()) => {
                        return Err(PipelineError::UnsupportedFormat(original_name));
                    }
                    _ => {}
                }

                let decoded = detect_and_decode(&bytes);
                let delimiter =
                    detect_delimiter_with_sample(&decoded.text, config.delimiter_sample_lines);
                debug!(
                    encoding = decoded.encoding_name(),
                    delimiter = %(delimiter as char).escape_default(),
                    "upload decoded"
                );

                let table = RowParser::new(delimiter)
                    .with_headers(options.header_override.clone())
                    .parse(&decoded.text)?;

                let stored = self.file_store.save(&original_name, &bytes)?;

                Ok(PreparedSource {
                    table,
                    original_name,
                    stored_name: stored.stored_name,
                    stored_path: Some(stored.path),
                    file_size: stored.size as i64,
                    mime_type,
                    import_type: ImportType::Csv,
                })
            }
            ImportSource::Spreadsheet { name, rows } => {
                let file_size: usize = rows
                    .iter()
                    .flat_map(|row| row.iter())
                    .map(|cell| cell.len())
                    .sum();
                let table = RowParser::parse_grid(rows)?;

                Ok(PreparedSource {
                    table,
                    stored_name: generate_stored_name(&name),
                    original_name: name,
                    stored_path: None,
                    file_size: file_size as i64,
                    mime_type: SPREADSHEET_MIME_TYPE.to_string(),
                    import_type: ImportType::Spreadsheet,
                })
            }
        }
    }

    async fn run_pipeline(
        &self,
        prepared: PreparedSource,
        options: &ImportOptions,
        config: &ImportConfig,
        stage: &mut StageTracker,
    ) -> PipelineResult<ImportOutcome> {
        let ParsedTable { headers, rows } = prepared.table;

        // === headers: resolved once ===
        let resolved = self.header_resolver.resolve(&headers);
        stage.advance(ImportStage::HeaderResolved);

        let mut subjects = SubjectResolver::load(self.repo.clone(), config).await?;
        let validator = RowValidator::with_known_ids(subjects.snapshot_ids());

        // === rows ===
        stage.advance(ImportStage::RowProcessing);
        let mut total = 0usize;
        let mut errors: Vec<ImportError> = Vec::new();
        let mut pending: Vec<NewScheduleItem> = Vec::new();

        for row in rows {
            let row = row?;
            total += 1;
            let row_number = row.row_number;

            match normalize(resolved.extract(&row)).and_then(|c| validator.validate(c)) {
                Ok(valid) => {
                    let subject_id = match valid.subject_id {
                        Some(id) => id,
                        None => subjects.resolve(&valid.subject_name).await?,
                    };
                    pending.push(NewScheduleItem::from_validated(valid, subject_id));
                }
                Err(e) => {
                    debug!(row_number, error = %e, "row rejected");
                    errors.push(e.into_import_error(row_number));
                }
            }
        }

        let success = pending.len();
        let failed = errors.len();
        info!(
            total,
            success,
            failed,
            subjects_created = subjects.created_count(),
            "rows processed"
        );

        if pending.is_empty() {
            warn!(total, "no importable rows");
            return Err(PipelineError::NothingImportable { total, errors });
        }

        // === persist: items, ImportedFile, back-link ===
        stage.advance(ImportStage::Persisting);
        let new_file = NewImportedFile {
            original_name: prepared.original_name,
            stored_name: prepared.stored_name,
            file_path: prepared
                .stored_path
                .as_ref()
                .map(|p| p.display().to_string()),
            file_size: prepared.file_size,
            mime_type: prepared.mime_type,
            import_type: prepared.import_type,
            status: ImportStatus::from_counts(failed),
            items_count: success as i64,
            success_count: success as i64,
            error_count: failed as i64,
            uploaded_by: options.uploaded_by,
            created_at: Utc::now(),
        };

        let imported_file = self.repo.persist_import(pending, new_file).await?;
        stage.advance(ImportStage::ProvenanceRecorded);

        info!(
            imported_file_id = imported_file.id,
            status = imported_file.status.as_str(),
            "import recorded"
        );

        Ok(ImportOutcome {
            result: ImportResult {
                total,
                success,
                failed,
                errors,
            },
            imported_file,
        })
    }

    fn discard_upload(&self, path: &Path) {
        if let Err(e) = self.file_store.remove(path) {
            warn!(path = %path.display(), error = %e, "failed to remove stored upload");
        }
    }
}

#[async_trait]
impl ScheduleImporter for ScheduleImporterImpl {
    #[instrument(skip(self, source, options), fields(source = %source.display_name(), uploaded_by = options.uploaded_by))]
    async fn import_schedule_items(
        &self,
        source: ImportSource,
        options: ImportOptions,
    ) -> PipelineResult<ImportOutcome> {
        let mut stage = StageTracker::new();
        let config = self.config.load_import_config().await?;

        stage.advance(ImportStage::Decoding);
        let prepared = self.prepare_source(source, &options, &config)?;
        let stored_path = prepared.stored_path.clone();

        match self
            .run_pipeline(prepared, &options, &config, &mut stage)
            .await
        {
            Ok(outcome) => {
                stage.advance(ImportStage::Done);
                Ok(outcome)
            }
            Err(e) => {
                if let Some(path) = stored_path {
                    self.discard_upload(&path);
                }
                warn!(stage = %stage.current, error = %e, "import aborted");
                Err(e)
            }
        }
    }

    async fn import_from_path(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> PipelineResult<ImportOutcome> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let source = match file_extension(&file_name) {
            Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) => ImportSource::Spreadsheet {
                rows: load_workbook_grid(path)?,
                name: file_name,
            },
            Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => ImportSource::File {
                bytes: read_file_bytes(path)?,
                mime_type: mime_for_extension(&ext).to_string(),
                original_name: file_name,
            },
            _ => return Err(PipelineError::UnsupportedFormat(file_name)),
        };

        self.import_schedule_items(source, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(ImportStage::Idle.to_string(), "idle");
        assert_eq!(ImportStage::ProvenanceRecorded.as_str(), "provenance_recorded");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("csv"), "text/csv");
        assert_eq!(mime_for_extension("tsv"), "text/tab-separated-values");
        assert_eq!(mime_for_extension("txt"), "text/plain");
    }

    #[test]
    fn test_stage_tracker_advances() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.current, ImportStage::Idle);
        tracker.advance(ImportStage::Decoding);
        assert_eq!(tracker.current, ImportStage::Decoding);
    }
}
