// ==========================================
// Schedule Import - import provenance
// ==========================================
// An ImportedFile and the schedule items it created form one
// deletion unit. The physical upload is removed after the
// transaction commits, best-effort.
// ==========================================

use crate::domain::{DeletedImport, ImportedFile, ScheduleItem};
use crate::importer::error::PipelineResult;
use crate::importer::file_store::FileStore;
use crate::repository::ScheduleImportRepository;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ProvenanceTracker {
    repo: Arc<dyn ScheduleImportRepository>,
    file_store: Arc<dyn FileStore>,
}

impl ProvenanceTracker {
    pub fn new(repo: Arc<dyn ScheduleImportRepository>, file_store: Arc<dyn FileStore>) -> Self {
        Self { repo, file_store }
    }

    /// Delete an import with every item it owns
    ///
    /// # Returns
    /// - Ok(true): import and items deleted
    /// - Ok(false): no import with this id
    /// - Err: storage failure, nothing deleted
    pub async fn delete_import(&self, imported_file_id: i64) -> PipelineResult<bool> {
        Ok(self.delete_import_detailed(imported_file_id).await?.is_some())
    }

    /// Same as `delete_import`, returning what was deleted
    #[instrument(skip(self))]
    pub async fn delete_import_detailed(
        &self,
        imported_file_id: i64,
    ) -> PipelineResult<Option<DeletedImport>> {
        let deleted = match self.repo.delete_import_cascade(imported_file_id).await? {
            Some(deleted) => deleted,
            None => {
                info!(imported_file_id, "import not found");
                return Ok(None);
            }
        };

        info!(
            imported_file_id,
            deleted_items = deleted.deleted_items,
            "import deleted"
        );

        if let Some(path) = deleted.file.file_path.as_deref() {
            match self.file_store.remove(Path::new(path)) {
                Ok(true) => {}
                Ok(false) => warn!(imported_file_id, path, "stored upload was already gone"),
                Err(e) => warn!(imported_file_id, path, error = %e, "failed to remove stored upload"),
            }
        }

        Ok(Some(deleted))
    }

    pub async fn get_import(&self, imported_file_id: i64) -> PipelineResult<Option<ImportedFile>> {
        Ok(self.repo.get_imported_file(imported_file_id).await?)
    }

    /// Most recent first
    pub async fn list_imports(&self, limit: usize) -> PipelineResult<Vec<ImportedFile>> {
        Ok(self.repo.list_imported_files(limit).await?)
    }

    pub async fn items_of_import(&self, imported_file_id: i64) -> PipelineResult<Vec<ScheduleItem>> {
        Ok(self.repo.list_items_by_import(imported_file_id).await?)
    }
}
