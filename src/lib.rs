// ==========================================
// Schedule Import - core library
// ==========================================
// Class schedule ingestion: delimited text and spreadsheet rows
// are parsed, normalized, validated against the subject catalog
// and persisted with per-import provenance.
// ==========================================

rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// Modules
// ==========================================

// Entities and value types
pub mod domain;

// Data access
pub mod repository;

// Import pipeline
pub mod importer;

// Import settings
pub mod config;

// Connection setup and schema
pub mod db;

pub mod logging;

pub mod i18n;

// Business entry points
pub mod api;

// ==========================================
// Re-exports
// ==========================================

pub use domain::{
    DeletedImport, ImportError, ImportResult, ImportStatus, ImportType, ImportedFile,
    ScheduleItem, SubjectCatalogEntry,
};

pub use importer::{
    PipelineError, ProvenanceTracker, ScheduleImporter, ScheduleImporterImpl,
};

pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Schedule Import";
