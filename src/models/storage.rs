use crate::models::book::{Book, BookFields};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("Connection error: {0}")]
    Connection(String),
}

#[async_trait]
pub trait BookStore {
    /// All books, ordered by id.
    async fn list(&self) -> Result<Vec<Book>, StorageError>;
    /// Inserts a new row and returns it with its assigned id.
    async fn create(&self, fields: BookFields) -> Result<Book, StorageError>;
    async fn get(&self, id: i64) -> Result<Option<Book>, StorageError>;
    /// Full replacement of the mutable fields; None when the id is absent.
    async fn update(&self, id: i64, fields: BookFields) -> Result<Option<Book>, StorageError>;
    /// Returns false when the id is absent.
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;
    async fn test_connection(&self) -> Result<(), StorageError>;
}

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(50) NOT NULL,
                writer VARCHAR(100) NOT NULL,
                year VARCHAR(50) NOT NULL,
                main_contents TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn book_from_row(row: &sqlx::postgres::PgRow) -> Book {
        Book {
            id: row.get("id"),
            name: row.get("name"),
            writer: row.get("writer"),
            year: row.get("year"),
            main_contents: row.get("main_contents"),
        }
    }
}

#[async_trait]
impl BookStore for PostgresBackend {
    async fn list(&self) -> Result<Vec<Book>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, writer, year, main_contents FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::book_from_row).collect())
    }

    async fn create(&self, fields: BookFields) -> Result<Book, StorageError> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (name, writer, year, main_contents)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.writer)
        .bind(&fields.year)
        .bind(&fields.main_contents)
        .fetch_one(&self.pool)
        .await?;

        Ok(Book::from_fields(row.get("id"), fields))
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StorageError> {
        let row = sqlx::query(
            "SELECT id, name, writer, year, main_contents FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::book_from_row))
    }

    async fn update(&self, id: i64, fields: BookFields) -> Result<Option<Book>, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET name = $2, writer = $3, year = $4, main_contents = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.writer)
        .bind(&fields.year)
        .bind(&fields.main_contents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(None)
        } else {
            Ok(Some(Book::from_fields(id, fields)))
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// In-process backend for local runs and the test suite. Ids are assigned
/// from a counter that never goes backwards, so deleted ids are not reused.
pub struct MemoryBackend {
    inner: Mutex<MemoryState>,
}

struct MemoryState {
    books: BTreeMap<i64, Book>,
    next_id: i64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                books: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for MemoryBackend {
    async fn list(&self) -> Result<Vec<Book>, StorageError> {
        let state = self.inner.lock().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn create(&self, fields: BookFields) -> Result<Book, StorageError> {
        let mut state = self.inner.lock().await;
        let id = state.next_id;
        state.next_id += 1;

        let book = Book::from_fields(id, fields);
        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StorageError> {
        let state = self.inner.lock().await;
        Ok(state.books.get(&id).cloned())
    }

    async fn update(&self, id: i64, fields: BookFields) -> Result<Option<Book>, StorageError> {
        let mut state = self.inner.lock().await;
        match state.books.get_mut(&id) {
            Some(book) => {
                *book = Book::from_fields(id, fields);
                Ok(Some(book.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let mut state = self.inner.lock().await;
        Ok(state.books.remove(&id).is_some())
    }

    async fn test_connection(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> BookFields {
        BookFields {
            name: name.to_string(),
            writer: "Writer".to_string(),
            year: "2000".to_string(),
            main_contents: "Contents".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryBackend::new();
        let first = store.create(fields("First")).await.unwrap();
        let second = store.create(fields("Second")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = MemoryBackend::new();
        let first = store.create(fields("First")).await.unwrap();
        assert!(store.delete(first.id).await.unwrap());
        let second = store.create(fields("Second")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = MemoryBackend::new();
        let book = store.create(fields("Before")).await.unwrap();

        let replaced = store
            .update(
                book.id,
                BookFields {
                    name: "After".to_string(),
                    writer: "Other Writer".to_string(),
                    year: "circa 1965".to_string(),
                    main_contents: "New contents".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, book.id);
        assert_eq!(replaced.name, "After");
        assert_eq!(replaced.writer, "Other Writer");
        assert_eq!(replaced.year, "circa 1965");
        assert_eq!(replaced.main_contents, "New contents");
        assert_eq!(store.get(book.id).await.unwrap().unwrap(), replaced);
    }

    #[tokio::test]
    async fn update_missing_id_returns_none() {
        let store = MemoryBackend::new();
        let result = store.update(42, fields("Ghost")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_missing_id_returns_false() {
        let store = MemoryBackend::new();
        assert!(!store.delete(42).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = MemoryBackend::new();
        for name in ["One", "Two", "Three"] {
            store.create(fields(name)).await.unwrap();
        }
        let books = store.list().await.unwrap();
        let ids: Vec<_> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
