//! Repository layer for database operations
//!
//! SQLite implementation of the note collection.

use super::backend::NoteBackend;
use super::models::*;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a note by ID
    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;

        Ok(note)
    }

    /// List all notes, most recently updated first
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Insert a new note
    pub async fn create_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notes (id, title, body, created_at, updated_at, pinned, archived)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.body)
        .bind(note.created_at)
        .bind(note.updated_at)
        .bind(note.pinned)
        .bind(note.archived)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created note: {}", note.id);
        Ok(())
    }

    /// Write every field of a note over its stored row.
    ///
    /// `created_at` is never rewritten.
    pub async fn update_note(&self, note: &Note) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE notes
            SET title = ?, body = ?, updated_at = ?, pinned = ?, archived = ?
            WHERE id = ?
            "#,
        )
        .bind(&note.title)
        .bind(&note.body)
        .bind(note.updated_at)
        .bind(note.pinned)
        .bind(note.archived)
        .bind(&note.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NoteNotFound(note.id.clone()));
        }

        tracing::debug!("Updated note: {}", note.id);
        Ok(())
    }

    /// Permanently delete a note. Returns whether a row was removed.
    pub async fn delete_note(&self, id: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted note: {} ({} rows)", id, rows);
        Ok(rows > 0)
    }
}

#[async_trait]
impl NoteBackend for Repository {
    async fn load_all(&self) -> Result<Vec<Note>> {
        self.list_notes().await
    }

    async fn insert(&self, note: &Note) -> Result<()> {
        self.create_note(note).await
    }

    async fn replace(&self, note: &Note) -> Result<()> {
        self.update_note(note).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.delete_note(id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use crate::database::memory_pool;
    use chrono::{Duration, Utc};

    async fn create_test_repo() -> Repository {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        Repository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let repo = create_test_repo().await;

        let note = Note {
            title: "Test Note".to_string(),
            body: "Hello".to_string(),
            ..Note::new()
        };
        repo.create_note(&note).await.unwrap();

        let fetched = repo.get_note(&note.id).await.unwrap();
        assert_eq!(fetched, note);
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let repo = create_test_repo().await;
        let note = Note::new();

        repo.insert(&note).await.unwrap();
        let err = repo.insert(&note).await.unwrap_err();

        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_update_note() {
        let repo = create_test_repo().await;
        let mut note = Note::new();
        repo.create_note(&note).await.unwrap();

        note.title = "Updated".to_string();
        note.pinned = true;
        note.touch();
        repo.update_note(&note).await.unwrap();

        let fetched = repo.get_note(&note.id).await.unwrap();
        assert_eq!(fetched.title, "Updated");
        assert!(fetched.pinned);
        assert_eq!(fetched.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_note() {
        let repo = create_test_repo().await;

        let result = repo.update_note(&Note::new()).await;

        assert!(matches!(result, Err(AppError::NoteNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_notes_newest_first() {
        let repo = create_test_repo().await;
        let base = Utc::now();

        for i in 0..3 {
            let note = Note {
                title: format!("Note {}", i),
                updated_at: base + Duration::seconds(i),
                created_at: base,
                ..Note::new()
            };
            repo.create_note(&note).await.unwrap();
        }

        let notes = repo.list_notes().await.unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Note 2", "Note 1", "Note 0"]);
    }

    #[tokio::test]
    async fn test_delete_is_permanent_and_repeatable() {
        let repo = create_test_repo().await;
        let note = Note::new();
        repo.create_note(&note).await.unwrap();

        assert!(repo.delete_note(&note.id).await.unwrap());
        assert!(!repo.delete_note(&note.id).await.unwrap());

        assert!(repo.get_note(&note.id).await.is_err());
        assert!(repo.list_notes().await.unwrap().is_empty());

        // The trait-level remove tolerates absent ids
        repo.remove(&note.id).await.unwrap();
    }
}
