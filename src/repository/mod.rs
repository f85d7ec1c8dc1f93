// ==========================================
// Schedule Import - repository layer
// ==========================================
// Data access only: parameterized SQL, no business rules.
// ==========================================

pub mod error;
pub mod schedule_import_repo;
pub mod schedule_import_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use schedule_import_repo::ScheduleImportRepository;
pub use schedule_import_repo_impl::ScheduleImportRepositoryImpl;
