// ==========================================
// Schedule Import - API layer
// ==========================================
// Business entry points for the CLI and embedding hosts
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{DeleteImportResponse, ImportApi, ImportApiResponse, MAX_LIST_LIMIT};
