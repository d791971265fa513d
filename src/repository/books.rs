//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use super::{map_foreign_key, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput},
};

/// Books joined with their sorted category ids
const SELECT_BOOKS: &str = r#"
    SELECT b.id, b.name,
           COALESCE(
               ARRAY_AGG(bc.category_id ORDER BY bc.category_id)
                   FILTER (WHERE bc.category_id IS NOT NULL),
               '{}'
           ) AS category_ids
    FROM books b
    LEFT JOIN book_categories bc ON bc.book_id = b.id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert_categories(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        category_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO book_categories (book_id, category_id)
            SELECT $1, UNNEST($2::int4[])
            "#,
        )
        .bind(book_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            map_foreign_key(e, || {
                AppError::BadRequest(format!("Unknown category ids: {:?}", category_ids))
            })
        })?;
        Ok(())
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let query = format!("{} GROUP BY b.id ORDER BY b.id", SELECT_BOOKS);
        let books = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let query = format!("{} WHERE b.id = $1 GROUP BY b.id", SELECT_BOOKS);
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, input: &BookInput) -> AppResult<Book> {
        let category_ids = input.normalized_category_ids();
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar("INSERT INTO books (name) VALUES ($1) RETURNING id")
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await?;

        Self::insert_categories(&mut tx, id, &category_ids).await?;
        tx.commit().await?;

        Ok(Book {
            id,
            name: input.name.clone(),
            category_ids,
        })
    }

    async fn update(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>> {
        let category_ids = input.normalized_category_ids();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE books SET name = $1 WHERE id = $2")
            .bind(&input.name)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_categories(&mut tx, id, &category_ids).await?;
        tx.commit().await?;

        Ok(Some(Book {
            id,
            name: input.name.clone(),
            category_ids,
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        // Detail lines hold the book with ON DELETE RESTRICT
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_foreign_key(e, || {
                    AppError::Conflict(format!("Book {} is part of a borrowing request", id))
                })
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let missing: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::int4[]) AS wanted(id)
            WHERE NOT EXISTS (SELECT 1 FROM books b WHERE b.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(missing)
    }
}
