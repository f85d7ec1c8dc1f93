// ==========================================
// Schedule Import - import repository trait
// ==========================================
// Data access for the import pipeline. No business rules here:
// matching, defaults and counting live in the importer.
// ==========================================

use crate::domain::{
    DeletedImport, ImportedFile, NewImportedFile, NewScheduleItem, NewSubject, ScheduleItem,
    SubjectCatalogEntry,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ScheduleImportRepository Trait
// ==========================================
// Implementor: ScheduleImportRepositoryImpl (rusqlite)
#[async_trait]
pub trait ScheduleImportRepository: Send + Sync {
    // ===== subject catalog =====

    /// Full subject catalog, ordered by id
    async fn fetch_subject_catalog(&self) -> RepositoryResult<Vec<SubjectCatalogEntry>>;

    /// Insert a catalog entry and return it with its new id
    ///
    /// # Errors
    /// - UniqueConstraintViolation: the exact name already exists
    async fn create_subject(&self, subject: NewSubject) -> RepositoryResult<SubjectCatalogEntry>;

    /// Id of the first user (lowest id) holding `role`
    async fn find_default_teacher(&self, role: &str) -> RepositoryResult<Option<i64>>;

    // ===== import persistence =====

    /// Persist one import in a single transaction
    ///
    /// Order: insert items, insert the ImportedFile, back-link the items.
    /// Any failure rolls everything back.
    ///
    /// # Returns
    /// - the persisted ImportedFile
    async fn persist_import(
        &self,
        items: Vec<NewScheduleItem>,
        file: NewImportedFile,
    ) -> RepositoryResult<ImportedFile>;

    // ===== provenance =====

    async fn get_imported_file(&self, id: i64) -> RepositoryResult<Option<ImportedFile>>;

    /// Most recent imports first
    async fn list_imported_files(&self, limit: usize) -> RepositoryResult<Vec<ImportedFile>>;

    async fn list_items_by_import(&self, imported_file_id: i64)
        -> RepositoryResult<Vec<ScheduleItem>>;

    /// Delete an import and every item it owns in one transaction
    ///
    /// # Returns
    /// - Ok(None): no import with this id
    async fn delete_import_cascade(&self, id: i64) -> RepositoryResult<Option<DeletedImport>>;

    // ===== counts =====

    async fn count_schedule_items(&self) -> RepositoryResult<usize>;

    async fn count_subjects(&self) -> RepositoryResult<usize>;
}
