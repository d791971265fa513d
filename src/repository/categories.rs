//! Categories repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::CategoryStore;
use crate::{
    error::AppResult,
    models::category::{Category, CategoryInput},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for CategoriesRepository {
    async fn list(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create(&self, input: &CategoryInput) -> AppResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, input: &CategoryInput) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(&input.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a category; book associations go with it (ON DELETE CASCADE)
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let missing: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::int4[]) AS wanted(id)
            WHERE NOT EXISTS (SELECT 1 FROM categories c WHERE c.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(missing)
    }
}
