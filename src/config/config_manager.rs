// ==========================================
// Schedule Import - configuration manager
// ==========================================
// Loads overrides from config_kv (scope_id = 'global').
// Missing keys fall back to defaults; malformed values are
// logged and replaced by the default.
// ==========================================

use crate::config::import_config::{
    default_upload_dir, ImportConfigReader, DEFAULT_COLOR_PALETTE, DEFAULT_FALLBACK_TEACHER_ID,
    DEFAULT_SHORT_NAME_LENGTH, DEFAULT_SUBJECT_DESCRIPTION, DEFAULT_TEACHER_ROLE,
};
use crate::db::open_sqlite_connection;
use crate::importer::delimiter_detector::DEFAULT_SAMPLE_LINES;
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection (PRAGMAs re-applied, idempotent)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Upsert a global value
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// All global values, keyed by name
    pub fn get_config_snapshot(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, "malformed config value, using default");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_color_palette(&self) -> RepositoryResult<Vec<String>> {
        let defaults = || -> Vec<String> {
            DEFAULT_COLOR_PALETTE.iter().map(|c| c.to_string()).collect()
        };

        let raw = match self.get_config_value(config_keys::COLOR_PALETTE)? {
            Some(raw) => raw,
            None => return Ok(defaults()),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(colors) if !colors.is_empty() => Ok(colors),
            _ => {
                warn!(value = %raw, "color palette must be a non-empty JSON array, using default");
                Ok(defaults())
            }
        }
    }

    async fn get_default_subject_description(&self) -> RepositoryResult<String> {
        self.get_config_or_default(
            config_keys::DEFAULT_SUBJECT_DESCRIPTION,
            DEFAULT_SUBJECT_DESCRIPTION,
        )
    }

    async fn get_teacher_role(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::TEACHER_ROLE, DEFAULT_TEACHER_ROLE)
    }

    async fn get_fallback_teacher_id(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::FALLBACK_TEACHER_ID, DEFAULT_FALLBACK_TEACHER_ID)
    }

    async fn get_short_name_length(&self) -> RepositoryResult<usize> {
        let len =
            self.get_parsed_or_default(config_keys::SHORT_NAME_LENGTH, DEFAULT_SHORT_NAME_LENGTH)?;
        Ok(len.max(1))
    }

    async fn get_delimiter_sample_lines(&self) -> RepositoryResult<usize> {
        let lines =
            self.get_parsed_or_default(config_keys::DELIMITER_SAMPLE_LINES, DEFAULT_SAMPLE_LINES)?;
        Ok(lines.max(1))
    }

    async fn get_upload_dir(&self) -> RepositoryResult<PathBuf> {
        Ok(self
            .get_config_value(config_keys::UPLOAD_DIR)?
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_upload_dir))
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    pub const COLOR_PALETTE: &str = "import_color_palette"; // JSON array of colors
    pub const DEFAULT_SUBJECT_DESCRIPTION: &str = "import_default_subject_description";
    pub const TEACHER_ROLE: &str = "import_teacher_role";
    pub const FALLBACK_TEACHER_ID: &str = "import_fallback_teacher_id";
    pub const SHORT_NAME_LENGTH: &str = "import_short_name_length";
    pub const DELIMITER_SAMPLE_LINES: &str = "import_delimiter_sample_lines";
    pub const UPLOAD_DIR: &str = "import_upload_dir";
}
