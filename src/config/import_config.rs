// ==========================================
// Schedule Import - import configuration
// ==========================================
// ImportConfig: resolved settings for one import call.
// ImportConfigReader: read interface, implemented by ConfigManager.
// ==========================================

use crate::repository::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Display colors handed out to newly created subjects, in order
pub const DEFAULT_COLOR_PALETTE: [&str; 10] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#EC4899", "#06B6D4", "#84CC16",
    "#F97316", "#6366F1",
];

pub const DEFAULT_SUBJECT_DESCRIPTION: &str = "Imported from schedule";
pub const DEFAULT_TEACHER_ROLE: &str = "teacher";
pub const DEFAULT_FALLBACK_TEACHER_ID: i64 = 1;
pub const DEFAULT_SHORT_NAME_LENGTH: usize = 10;

// ==========================================
// ImportConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub color_palette: Vec<String>,
    pub default_subject_description: String,
    pub teacher_role: String,
    pub fallback_teacher_id: i64,
    pub short_name_length: usize,
    pub delimiter_sample_lines: usize,
    pub upload_dir: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            color_palette: DEFAULT_COLOR_PALETTE.iter().map(|c| c.to_string()).collect(),
            default_subject_description: DEFAULT_SUBJECT_DESCRIPTION.to_string(),
            teacher_role: DEFAULT_TEACHER_ROLE.to_string(),
            fallback_teacher_id: DEFAULT_FALLBACK_TEACHER_ID,
            short_name_length: DEFAULT_SHORT_NAME_LENGTH,
            delimiter_sample_lines: crate::importer::delimiter_detector::DEFAULT_SAMPLE_LINES,
            upload_dir: default_upload_dir(),
        }
    }
}

impl ImportConfig {
    /// Palette color for the `index`-th created subject (cycles)
    pub fn color_for(&self, index: usize) -> &str {
        if self.color_palette.is_empty() {
            return DEFAULT_COLOR_PALETTE[index % DEFAULT_COLOR_PALETTE.len()];
        }
        &self.color_palette[index % self.color_palette.len()]
    }
}

/// `<data dir>/schedule-import/uploads`
pub fn default_upload_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("schedule-import")
        .join("uploads")
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// Implementor: ConfigManager (config_kv, scope 'global')
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// Subject colors, default: the ten-color palette
    async fn get_color_palette(&self) -> RepositoryResult<Vec<String>>;

    async fn get_default_subject_description(&self) -> RepositoryResult<String>;

    /// Role looked up for the default teacher, default: "teacher"
    async fn get_teacher_role(&self) -> RepositoryResult<String>;

    /// Used when no user holds the teacher role, default: 1
    async fn get_fallback_teacher_id(&self) -> RepositoryResult<i64>;

    async fn get_short_name_length(&self) -> RepositoryResult<usize>;

    async fn get_delimiter_sample_lines(&self) -> RepositoryResult<usize>;

    async fn get_upload_dir(&self) -> RepositoryResult<PathBuf>;

    /// Assemble the full configuration
    async fn load_import_config(&self) -> RepositoryResult<ImportConfig> {
        Ok(ImportConfig {
            color_palette: self.get_color_palette().await?,
            default_subject_description: self.get_default_subject_description().await?,
            teacher_role: self.get_teacher_role().await?,
            fallback_teacher_id: self.get_fallback_teacher_id().await?,
            short_name_length: self.get_short_name_length().await?,
            delimiter_sample_lines: self.get_delimiter_sample_lines().await?,
            upload_dir: self.get_upload_dir().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let config = ImportConfig::default();
        assert_eq!(config.color_for(0), "#3B82F6");
        assert_eq!(config.color_for(9), "#6366F1");
        assert_eq!(config.color_for(10), "#3B82F6");
    }

    #[test]
    fn test_empty_palette_falls_back() {
        let config = ImportConfig {
            color_palette: Vec::new(),
            ..Default::default()
        };
        assert_eq!(config.color_for(1), "#EF4444");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"teacher_role": "преподаватель"}"#).unwrap();
        assert_eq!(config.teacher_role, "преподаватель");
        assert_eq!(config.short_name_length, 10);
        assert_eq!(config.color_palette.len(), 10);
    }
}
