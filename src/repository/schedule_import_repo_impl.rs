// ==========================================
// Schedule Import - import repository (rusqlite)
// ==========================================
// Multi-statement writes run inside one transaction; the connection
// is shared behind Arc<Mutex<_>>.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    subject_name_key, DeletedImport, ImportStatus, ImportType, ImportedFile, NewImportedFile,
    NewScheduleItem, NewSubject, ScheduleItem, SubjectCatalogEntry,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_import_repo::ScheduleImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const IMPORTED_FILE_COLUMNS: &str = "id, original_name, stored_name, file_path, file_size, \
     mime_type, import_type, status, items_count, success_count, error_count, uploaded_by, \
     created_at";

fn parse_created_at(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_imported_file(row: &Row) -> rusqlite::Result<ImportedFile> {
    let import_type: String = row.get(6)?;
    let status: String = row.get(7)?;
    let created_at: String = row.get(12)?;

    Ok(ImportedFile {
        id: row.get(0)?,
        original_name: row.get(1)?,
        stored_name: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        mime_type: row.get(5)?,
        import_type: ImportType::parse(&import_type),
        status: ImportStatus::parse(&status),
        items_count: row.get(8)?,
        success_count: row.get(9)?,
        error_count: row.get(10)?,
        uploaded_by: row.get(11)?,
        created_at: parse_created_at(&created_at)?,
    })
}

fn map_schedule_item(row: &Row) -> rusqlite::Result<ScheduleItem> {
    Ok(ScheduleItem {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        day_of_week: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        room_number: row.get(5)?,
        teacher_name: row.get(6)?,
        imported_file_id: row.get(7)?,
    })
}

fn map_subject(row: &Row) -> rusqlite::Result<SubjectCatalogEntry> {
    Ok(SubjectCatalogEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        short_name: row.get(2)?,
        description: row.get(3)?,
        display_color: row.get(4)?,
        default_teacher_id: row.get(5)?,
    })
}

// ==========================================
// ScheduleImportRepositoryImpl
// ==========================================
pub struct ScheduleImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleImportRepositoryImpl {
    /// Open `db_path` with the shared PRAGMAs
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_items_tx(tx: &Transaction, items: &[NewScheduleItem]) -> RepositoryResult<Vec<i64>> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO schedule_items (
                subject_id, day_of_week, start_time, end_time, room_number, teacher_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            stmt.execute(params![
                item.subject_id,
                item.day_of_week,
                item.start_time,
                item.end_time,
                item.room_number,
                item.teacher_name,
            ])?;
            ids.push(tx.last_insert_rowid());
        }

        Ok(ids)
    }

    fn insert_imported_file_tx(tx: &Transaction, file: &NewImportedFile) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO imported_files (
                original_name, stored_name, file_path, file_size, mime_type,
                import_type, status, items_count, success_count, error_count,
                uploaded_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                file.original_name,
                file.stored_name,
                file.file_path,
                file.file_size,
                file.mime_type,
                file.import_type.as_str(),
                file.status.as_str(),
                file.items_count,
                file.success_count,
                file.error_count,
                file.uploaded_by,
                file.created_at.to_rfc3339(),
            ],
        )?;

        Ok(tx.last_insert_rowid())
    }

    fn link_items_tx(tx: &Transaction, item_ids: &[i64], imported_file_id: i64) -> RepositoryResult<usize> {
        let mut stmt =
            tx.prepare("UPDATE schedule_items SET imported_file_id = ?1 WHERE id = ?2")?;

        let mut linked = 0;
        for id in item_ids {
            linked += stmt.execute(params![imported_file_id, id])?;
        }
        Ok(linked)
    }

    fn count_table(&self, sql: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl ScheduleImportRepository for ScheduleImportRepositoryImpl {
    async fn fetch_subject_catalog(&self) -> RepositoryResult<Vec<SubjectCatalogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, short_name, description, display_color, default_teacher_id
            FROM subjects
            ORDER BY id
            "#,
        )?;

        let entries = stmt
            .query_map([], map_subject)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn create_subject(&self, subject: NewSubject) -> RepositoryResult<SubjectCatalogEntry> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO subjects (name, name_key, short_name, description, display_color, default_teacher_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                subject.name,
                subject_name_key(&subject.name),
                subject.short_name,
                subject.description,
                subject.display_color,
                subject.default_teacher_id,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(subject_id = id, name = %subject.name, "subject created");

        Ok(SubjectCatalogEntry {
            id,
            name: subject.name,
            short_name: subject.short_name,
            description: subject.description,
            display_color: subject.display_color,
            default_teacher_id: subject.default_teacher_id,
        })
    }

    async fn find_default_teacher(&self, role: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM users WHERE role = ?1 ORDER BY id LIMIT 1",
                params![role],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    async fn persist_import(
        &self,
        items: Vec<NewScheduleItem>,
        file: NewImportedFile,
    ) -> RepositoryResult<ImportedFile> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(RepositoryError::transaction)?;

        let item_ids = Self::insert_items_tx(&tx, &items)?;
        let file_id = Self::insert_imported_file_tx(&tx, &file)?;
        let linked = Self::link_items_tx(&tx, &item_ids, file_id)?;

        tx.commit().map_err(RepositoryError::transaction)?;
        debug!(imported_file_id = file_id, items = linked, "import persisted");

        Ok(file.into_persisted(file_id))
    }

    async fn get_imported_file(&self, id: i64) -> RepositoryResult<Option<ImportedFile>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM imported_files WHERE id = ?1",
            IMPORTED_FILE_COLUMNS
        );
        let file = conn
            .query_row(&sql, params![id], map_imported_file)
            .optional()?;
        Ok(file)
    }

    async fn list_imported_files(&self, limit: usize) -> RepositoryResult<Vec<ImportedFile>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM imported_files ORDER BY created_at DESC, id DESC LIMIT ?1",
            IMPORTED_FILE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let files = stmt
            .query_map(params![limit as i64], map_imported_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    async fn list_items_by_import(
        &self,
        imported_file_id: i64,
    ) -> RepositoryResult<Vec<ScheduleItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subject_id, day_of_week, start_time, end_time,
                   room_number, teacher_name, imported_file_id
            FROM schedule_items
            WHERE imported_file_id = ?1
            ORDER BY id
            "#,
        )?;
        let items = stmt
            .query_map(params![imported_file_id], map_schedule_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn delete_import_cascade(&self, id: i64) -> RepositoryResult<Option<DeletedImport>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(RepositoryError::transaction)?;

        let sql = format!(
            "SELECT {} FROM imported_files WHERE id = ?1",
            IMPORTED_FILE_COLUMNS
        );
        let file = match tx.query_row(&sql, params![id], map_imported_file).optional()? {
            Some(file) => file,
            None => return Ok(None),
        };

        let deleted_items = tx.execute(
            "DELETE FROM schedule_items WHERE imported_file_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM imported_files WHERE id = ?1", params![id])?;
        tx.commit().map_err(RepositoryError::transaction)?;

        Ok(Some(DeletedImport {
            file,
            deleted_items,
        }))
    }

    async fn count_schedule_items(&self) -> RepositoryResult<usize> {
        self.count_table("SELECT COUNT(*) FROM schedule_items")
    }

    async fn count_subjects(&self) -> RepositoryResult<usize> {
        self.count_table("SELECT COUNT(*) FROM subjects")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn setup_repo() -> ScheduleImportRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ScheduleImportRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_subject(name: &str) -> NewSubject {
        NewSubject {
            name: name.to_string(),
            short_name: name.chars().take(10).collect(),
            description: Some("imported".to_string()),
            display_color: "#3B82F6".to_string(),
            default_teacher_id: Some(1),
        }
    }

    fn new_file(items: i64) -> NewImportedFile {
        NewImportedFile {
            original_name: "week.csv".to_string(),
            stored_name: "stored.csv".to_string(),
            file_path: Some("/tmp/stored.csv".to_string()),
            file_size: 64,
            mime_type: "text/csv".to_string(),
            import_type: ImportType::Csv,
            status: ImportStatus::Success,
            items_count: items,
            success_count: items,
            error_count: 0,
            uploaded_by: 7,
            created_at: Utc::now(),
        }
    }

    fn new_item(subject_id: i64, day: i32) -> NewScheduleItem {
        NewScheduleItem {
            subject_id,
            day_of_week: day,
            start_time: "09:00".to_string(),
            end_time: "10:30".to_string(),
            room_number: Some("101".to_string()),
            teacher_name: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_subjects() {
        let repo = setup_repo();
        let created = repo.create_subject(new_subject("Math")).await.unwrap();
        assert!(created.id > 0);

        let catalog = repo.fetch_subject_catalog().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "Math");
    }

    #[tokio::test]
    async fn test_duplicate_subject_name_rejected() {
        let repo = setup_repo();
        repo.create_subject(new_subject("Math")).await.unwrap();
        let err = repo.create_subject(new_subject("Math")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_nested_transaction_reported_as_transaction_error() {
        let repo = setup_repo();
        repo.get_conn().unwrap().execute_batch("BEGIN").unwrap();

        let err = repo.delete_import_cascade(1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseTransactionError(_)));
    }

    #[tokio::test]
    async fn test_case_variant_subject_name_rejected() {
        let repo = setup_repo();
        repo.create_subject(new_subject("Математика")).await.unwrap();
        let err = repo
            .create_subject(new_subject(" МАТЕМАТИКА"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert_eq!(repo.count_subjects().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_default_teacher() {
        let repo = setup_repo();
        assert_eq!(repo.find_default_teacher("teacher").await.unwrap(), None);

        {
            let conn = repo.get_conn().unwrap();
            conn.execute_batch(
                "INSERT INTO users (full_name, role) VALUES ('Admin', 'admin');
                 INSERT INTO users (full_name, role) VALUES ('Ivanova', 'teacher');
                 INSERT INTO users (full_name, role) VALUES ('Petrov', 'teacher');",
            )
            .unwrap();
        }

        assert_eq!(repo.find_default_teacher("teacher").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_persist_import_links_items() {
        let repo = setup_repo();
        let subject = repo.create_subject(new_subject("Math")).await.unwrap();

        let file = repo
            .persist_import(vec![new_item(subject.id, 1), new_item(subject.id, 3)], new_file(2))
            .await
            .unwrap();

        let items = repo.list_items_by_import(file.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.imported_file_id == Some(file.id)));

        let stored = repo.get_imported_file(file.id).await.unwrap().unwrap();
        assert_eq!(stored.items_count, 2);
        assert_eq!(stored.import_type, ImportType::Csv);
    }

    #[tokio::test]
    async fn test_persist_import_rolls_back_on_failure() {
        let repo = setup_repo();
        // subject 999 does not exist: foreign key failure
        let result = repo
            .persist_import(vec![new_item(999, 1)], new_file(1))
            .await;

        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
        assert_eq!(repo.count_schedule_items().await.unwrap(), 0);
        assert!(repo.list_imported_files(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_import_cascade() {
        let repo = setup_repo();
        let subject = repo.create_subject(new_subject("Math")).await.unwrap();
        let first = repo
            .persist_import(vec![new_item(subject.id, 1), new_item(subject.id, 2)], new_file(2))
            .await
            .unwrap();
        let second = repo
            .persist_import(vec![new_item(subject.id, 4)], new_file(1))
            .await
            .unwrap();

        let deleted = repo.delete_import_cascade(first.id).await.unwrap().unwrap();
        assert_eq!(deleted.deleted_items, 2);
        assert_eq!(deleted.file.id, first.id);

        assert_eq!(repo.count_schedule_items().await.unwrap(), 1);
        assert!(repo.get_imported_file(second.id).await.unwrap().is_some());
        assert!(repo.delete_import_cascade(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_imported_files_limit() {
        let repo = setup_repo();
        let subject = repo.create_subject(new_subject("Math")).await.unwrap();
        for day in 0..3 {
            repo.persist_import(vec![new_item(subject.id, day)], new_file(1))
                .await
                .unwrap();
        }

        let files = repo.list_imported_files(2).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].id > files[1].id);
    }
}
