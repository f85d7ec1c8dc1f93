// ==========================================
// Schedule Import - importer layer
// ==========================================
// Pipeline:
// encoding/delimiter detection -> row parsing -> header resolution ->
// normalization -> validation -> subject resolution -> persistence ->
// provenance
// ==========================================

pub mod delimiter_detector;
pub mod encoding_detector;
pub mod error;
pub mod field_normalizer;
pub mod file_store;
pub mod header_resolver;
pub mod provenance_tracker;
pub mod row_parser;
pub mod row_validator;
pub mod schedule_importer_impl;
pub mod schedule_importer_trait;
pub mod subject_resolver;

pub use delimiter_detector::detect_delimiter;
pub use encoding_detector::{detect_and_decode, DecodedText};
pub use error::{FieldError, PipelineError, PipelineResult};
pub use field_normalizer::{normalize, parse_day, parse_time};
pub use file_store::{FileStore, LocalFileStore, StoredFile};
pub use header_resolver::{CanonicalField, HeaderAliasTable, HeaderResolver, ResolvedHeaders};
pub use provenance_tracker::ProvenanceTracker;
pub use row_parser::{ParsedTable, RowParser, RowStream};
pub use row_validator::{RowValidator, SubjectExistsFn};
pub use schedule_importer_impl::{ImportStage, ScheduleImporterImpl};
pub use schedule_importer_trait::{ImportOptions, ImportOutcome, ImportSource, ScheduleImporter};
pub use subject_resolver::SubjectResolver;
