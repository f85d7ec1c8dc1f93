// ==========================================
// Schedule Import - physical upload storage
// ==========================================
// Uploads are written under a generated name (uuid v4 + original
// extension): temp file first, then renamed into place.
// ==========================================

use crate::importer::error::{PipelineError, PipelineResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A saved upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub stored_name: String,
    pub path: PathBuf,
    pub size: u64,
}

// ==========================================
// FileStore Trait
// ==========================================
// Implementor: LocalFileStore
pub trait FileStore: Send + Sync {
    /// Persist the raw upload
    fn save(&self, original_name: &str, bytes: &[u8]) -> PipelineResult<StoredFile>;

    /// Remove a stored upload
    ///
    /// # Returns
    /// - Ok(false): nothing to remove
    fn remove(&self, path: &Path) -> PipelineResult<bool>;
}

/// Lowercased extension of `name`, if any
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// `<uuid>.<ext>` (or bare uuid when the original has no extension)
pub fn generate_stored_name(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match file_extension(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

// ==========================================
// LocalFileStore
// ==========================================
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_temp(temp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

impl FileStore for LocalFileStore {
    fn save(&self, original_name: &str, bytes: &[u8]) -> PipelineResult<StoredFile> {
        fs::create_dir_all(&self.root)
            .map_err(|e| PipelineError::Storage(format!("{}: {}", self.root.display(), e)))?;

        let stored_name = generate_stored_name(original_name);
        let final_path = self.root.join(&stored_name);
        let temp_path = self.root.join(format!(".{}.part", stored_name));

        if let Err(e) = Self::write_temp(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(PipelineError::Storage(e.to_string()));
        }

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(PipelineError::Storage(e.to_string()));
        }

        debug!(original_name, stored_name = %stored_name, size = bytes.len(), "upload stored");

        Ok(StoredFile {
            stored_name,
            path: final_path,
            size: bytes.len() as u64,
        })
    }

    fn remove(&self, path: &Path) -> PipelineResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "stored upload already missing");
                Ok(false)
            }
            Err(e) => Err(PipelineError::Storage(e.to_string())),
        }
    }
}
