// ==========================================
// Schedule Import - subject resolution
// ==========================================
// Subject name -> catalog id, creating missing entries.
// The catalog snapshot is loaded once and owned by one import call;
// entries created during the call are appended immediately, so later
// rows with the same name (any case) reuse them.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{NewSubject, SubjectCatalogEntry};
use crate::importer::error::PipelineResult;
use crate::repository::{RepositoryError, ScheduleImportRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SubjectResolver {
    repo: Arc<dyn ScheduleImportRepository>,
    snapshot: Vec<SubjectCatalogEntry>,
    default_teacher_id: i64,
    config: ImportConfig,
    created: usize,
}

impl SubjectResolver {
    /// Fetch the catalog snapshot and the default teacher once
    pub async fn load(
        repo: Arc<dyn ScheduleImportRepository>,
        config: &ImportConfig,
    ) -> PipelineResult<Self> {
        let snapshot = repo.fetch_subject_catalog().await?;

        let default_teacher_id = match repo.find_default_teacher(&config.teacher_role).await? {
            Some(id) => id,
            None => {
                debug!(
                    role = %config.teacher_role,
                    fallback = config.fallback_teacher_id,
                    "no user with teacher role, using fallback id"
                );
                config.fallback_teacher_id
            }
        };

        debug!(
            catalog_size = snapshot.len(),
            default_teacher_id, "subject catalog loaded"
        );

        Ok(Self {
            repo,
            snapshot,
            default_teacher_id,
            config: config.clone(),
            created: 0,
        })
    }

    /// Catalog id for `name`, creating the entry when absent
    pub async fn resolve(&mut self, name: &str) -> PipelineResult<i64> {
        let name = name.trim();

        if let Some(id) = self.find(name) {
            return Ok(id);
        }

        let new_subject = NewSubject {
            name: name.to_string(),
            short_name: name
                .chars()
                .take(self.config.short_name_length)
                .collect(),
            description: Some(self.config.default_subject_description.clone()),
            display_color: self.config.color_for(self.created).to_string(),
            default_teacher_id: Some(self.default_teacher_id),
        };

        match self.repo.create_subject(new_subject).await {
            Ok(entry) => {
                info!(subject_id = entry.id, name = %entry.name, "subject created during import");
                let id = entry.id;
                self.snapshot.push(entry);
                self.created += 1;
                Ok(id)
            }
            // created by a concurrent import since the snapshot was taken
            Err(RepositoryError::UniqueConstraintViolation(msg)) => {
                warn!(name, error = %msg, "subject appeared concurrently, reloading catalog");
                self.snapshot = self.repo.fetch_subject_catalog().await?;
                self.find(name).ok_or_else(|| {
                    RepositoryError::UniqueConstraintViolation(msg).into()
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find(&self, name: &str) -> Option<i64> {
        self.snapshot
            .iter()
            .find(|entry| entry.matches_name(name))
            .map(|entry| entry.id)
    }

    /// Number of entries created by this resolver
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Ids present in the snapshot
    pub fn snapshot_ids(&self) -> HashSet<i64> {
        self.snapshot.iter().map(|entry| entry.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};
    use crate::repository::ScheduleImportRepositoryImpl;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup_repo() -> Arc<dyn ScheduleImportRepository> {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        Arc::new(ScheduleImportRepositoryImpl::from_connection(Arc::new(
            Mutex::new(conn),
        )))
    }

    #[tokio::test]
    async fn test_case_insensitive_reuse() {
        let repo = setup_repo();
        let config = ImportConfig::default();
        let mut resolver = SubjectResolver::load(repo.clone(), &config).await.unwrap();

        let first = resolver.resolve("Математика").await.unwrap();
        let second = resolver.resolve("математика").await.unwrap();
        let third = resolver.resolve("  МАТЕМАТИКА ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(resolver.created_count(), 1);
        assert_eq!(repo.count_subjects().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_new_entry_defaults() {
        let repo = setup_repo();
        let config = ImportConfig::default();
        let mut resolver = SubjectResolver::load(repo.clone(), &config).await.unwrap();

        resolver.resolve("Информатика и ИКТ").await.unwrap();
        resolver.resolve("Physics").await.unwrap();

        let catalog = repo.fetch_subject_catalog().await.unwrap();
        assert_eq!(catalog[0].short_name, "Информатик");
        assert_eq!(catalog[0].display_color, "#3B82F6");
        assert_eq!(catalog[0].default_teacher_id, Some(1));
        assert_eq!(
            catalog[0].description.as_deref(),
            Some(config.default_subject_description.as_str())
        );
        assert_eq!(catalog[1].display_color, "#EF4444");
    }

    #[tokio::test]
    async fn test_existing_catalog_reused() {
        let repo = setup_repo();
        let existing = repo
            .create_subject(NewSubject {
                name: "History".to_string(),
                short_name: "History".to_string(),
                description: None,
                display_color: "#000000".to_string(),
                default_teacher_id: None,
            })
            .await
            .unwrap();

        let mut resolver = SubjectResolver::load(repo, &ImportConfig::default())
            .await
            .unwrap();
        assert_eq!(resolver.resolve("history").await.unwrap(), existing.id);
        assert_eq!(resolver.created_count(), 0);
        assert!(resolver.snapshot_ids().contains(&existing.id));
    }

    #[tokio::test]
    async fn test_concurrently_created_case_variant_reused() {
        let repo = setup_repo();
        let mut resolver = SubjectResolver::load(repo.clone(), &ImportConfig::default())
            .await
            .unwrap();

        // another import creates the name after this snapshot was taken
        let other = repo
            .create_subject(NewSubject {
                name: "GEOGRAPHY".to_string(),
                short_name: "GEOGRAPHY".to_string(),
                description: None,
                display_color: "#000000".to_string(),
                default_teacher_id: None,
            })
            .await
            .unwrap();

        assert_eq!(resolver.resolve("Geography").await.unwrap(), other.id);
        assert_eq!(resolver.created_count(), 0);
        assert_eq!(repo.count_subjects().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_palette_wraps_after_ten() {
        let repo = setup_repo();
        let mut resolver = SubjectResolver::load(repo.clone(), &ImportConfig::default())
            .await
            .unwrap();
        for i in 0..11 {
            resolver.resolve(&format!("Subject {}", i)).await.unwrap();
        }

        let catalog = repo.fetch_subject_catalog().await.unwrap();
        assert_eq!(catalog[10].display_color, catalog[0].display_color);
        assert_eq!(resolver.created_count(), 11);
    }
}
