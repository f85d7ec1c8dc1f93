// ==========================================
// Schedule Import - import API
// ==========================================
// Facade over the importer and provenance tracker: validates
// input, times the call and turns pipeline failures into ApiError.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::{ImportError, ImportStatus, ImportedFile};
use crate::i18n::{t, t_with_args};
use crate::importer::{
    FileStore, ImportOptions, ImportOutcome, ImportSource, LocalFileStore, ProvenanceTracker,
    ScheduleImporter, ScheduleImporterImpl,
};
use crate::repository::{ScheduleImportRepository, ScheduleImportRepositoryImpl};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

/// Upper bound for list queries
pub const MAX_LIST_LIMIT: usize = 100;

/// Import call response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub imported_file_id: i64,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ImportError>,
    pub status: ImportStatus,
    /// Localized summary
    pub message: String,
    pub elapsed_ms: i64,
}

impl ImportApiResponse {
    fn from_outcome(outcome: ImportOutcome, started: Instant) -> Self {
        let result = outcome.result;
        let total = result.total.to_string();
        let success = result.success.to_string();
        let failed = result.failed.to_string();

        let message = if result.failed == 0 {
            t_with_args(
                "import.completed",
                &[("success", success.as_str()), ("total", total.as_str())],
            )
        } else {
            t_with_args(
                "import.completed_with_errors",
                &[
                    ("success", success.as_str()),
                    ("total", total.as_str()),
                    ("failed", failed.as_str()),
                ],
            )
        };

        Self {
            imported_file_id: outcome.imported_file.id,
            total: result.total,
            success: result.success,
            failed: result.failed,
            errors: result.errors,
            status: outcome.imported_file.status,
            message,
            elapsed_ms: started.elapsed().as_millis() as i64,
        }
    }
}

/// Delete call response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteImportResponse {
    pub deleted: bool,
    pub message: String,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    importer: Arc<dyn ScheduleImporter>,
    provenance: ProvenanceTracker,
}

impl ImportApi {
    pub fn new(importer: Arc<dyn ScheduleImporter>, provenance: ProvenanceTracker) -> Self {
        Self {
            importer,
            provenance,
        }
    }

    /// Wire every component on one database file
    pub async fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Self::from_connection(Arc::new(Mutex::new(conn))).await
    }

    /// Wire every component on a shared connection (schema created if missing)
    pub async fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .and_then(|_| ensure_schema(&guard))
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }

        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
        let upload_dir = config.get_upload_dir().await?;

        let repo: Arc<dyn ScheduleImportRepository> =
            Arc::new(ScheduleImportRepositoryImpl::from_connection(conn));
        let file_store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(upload_dir));

        let importer = ScheduleImporterImpl::new(repo.clone(), config, file_store.clone());
        let provenance = ProvenanceTracker::new(repo, file_store);

        Ok(Self::new(Arc::new(importer), provenance))
    }

    /// Import an uploaded delimited text file
    pub async fn import_file(
        &self,
        bytes: Vec<u8>,
        original_name: &str,
        mime_type: &str,
        uploaded_by: i64,
    ) -> ApiResult<ImportApiResponse> {
        if bytes.is_empty() {
            return Err(ApiError::InvalidInput(t("import.empty_upload")));
        }
        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(ApiError::InvalidInput("original_name is empty".to_string()));
        }

        let started = Instant::now();
        let source = ImportSource::File {
            bytes,
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
        };

        let outcome = self
            .importer
            .import_schedule_items(source, ImportOptions::new(uploaded_by))
            .await?;
        Ok(ImportApiResponse::from_outcome(outcome, started))
    }

    /// Import a file from disk (text or workbook, by extension)
    pub async fn import_file_from_path(
        &self,
        file_path: &str,
        uploaded_by: i64,
    ) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        let outcome = self
            .importer
            .import_from_path(Path::new(file_path), ImportOptions::new(uploaded_by))
            .await?;
        Ok(ImportApiResponse::from_outcome(outcome, started))
    }

    /// Import rows fetched from an external spreadsheet
    pub async fn import_spreadsheet(
        &self,
        name: &str,
        rows: Vec<Vec<String>>,
        uploaded_by: i64,
    ) -> ApiResult<ImportApiResponse> {
        if rows.is_empty() {
            return Err(ApiError::InvalidInput(t("import.missing_header")));
        }

        let started = Instant::now();
        let source = ImportSource::Spreadsheet {
            name: name.trim().to_string(),
            rows,
        };

        let outcome = self
            .importer
            .import_schedule_items(source, ImportOptions::new(uploaded_by))
            .await?;
        Ok(ImportApiResponse::from_outcome(outcome, started))
    }

    /// Delete an import and all schedule items it created
    pub async fn delete_import(&self, imported_file_id: i64) -> ApiResult<DeleteImportResponse> {
        let id = imported_file_id.to_string();

        let (deleted, message) = match self
            .provenance
            .delete_import_detailed(imported_file_id)
            .await?
        {
            Some(deleted) => {
                let items = deleted.deleted_items.to_string();
                info!(imported_file_id, "import deleted via API");
                (
                    true,
                    t_with_args(
                        "import.deleted",
                        &[("id", id.as_str()), ("items", items.as_str())],
                    ),
                )
            }
            None => (
                false,
                t_with_args("import.delete_not_found", &[("id", id.as_str())]),
            ),
        };

        Ok(DeleteImportResponse { deleted, message })
    }

    /// Most recent imports, `limit` clamped to [1, 100]
    pub async fn list_imports(&self, limit: usize) -> ApiResult<Vec<ImportedFile>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        Ok(self.provenance.list_imports(limit).await?)
    }

    pub async fn get_import(&self, imported_file_id: i64) -> ApiResult<ImportedFile> {
        self.provenance
            .get_import(imported_file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("ImportedFile(id={})", imported_file_id)))
    }
}
