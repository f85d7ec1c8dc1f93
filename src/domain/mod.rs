// ==========================================
// Schedule Import - domain layer
// ==========================================
// Entities and value types shared by the importer,
// repository and API layers. No data access here.
// ==========================================

pub mod imported_file;
pub mod schedule;
pub mod subject;

pub use imported_file::{DeletedImport, ImportStatus, ImportType, ImportedFile, NewImportedFile};
pub use schedule::{
    CanonicalRow, ImportError, ImportResult, NewScheduleItem, RawRow, ScheduleItem, ValidatedRow,
};
pub use subject::{subject_name_key, NewSubject, SubjectCatalogEntry};
