//! Borrowing requests repository for database operations

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use super::{map_foreign_key, BorrowingStore};
use crate::{
    error::{AppError, AppResult},
    models::borrowing::{
        BorrowingChanges, BorrowingDetail, BorrowingDetailLine, BorrowingRequest,
        BorrowingRequestRow, BorrowingStatus, UpdateOutcome,
    },
};

const SELECT_REQUESTS: &str = r#"
    SELECT id, requested_by, status, requested_at, processed_by, processed_at
    FROM borrowing_requests
"#;

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load the detail lines of every row and assemble full requests
    async fn attach_details(&self, rows: Vec<BorrowingRequestRow>) -> AppResult<Vec<BorrowingRequest>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let details = sqlx::query_as::<_, BorrowingDetail>(
            r#"
            SELECT id, request_id, book_id
            FROM borrowing_request_details
            WHERE request_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_request: HashMap<i32, Vec<BorrowingDetail>> = HashMap::new();
        for detail in details {
            by_request.entry(detail.request_id).or_default().push(detail);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let details = by_request.remove(&row.id).unwrap_or_default();
                row.with_details(details)
            })
            .collect())
    }

    async fn insert_details(
        tx: &mut Transaction<'_, Postgres>,
        request_id: i32,
        book_ids: &[i32],
    ) -> AppResult<Vec<BorrowingDetail>> {
        let details = sqlx::query_as::<_, BorrowingDetail>(
            r#"
            INSERT INTO borrowing_request_details (request_id, book_id)
            SELECT $1, UNNEST($2::int4[])
            RETURNING id, request_id, book_id
            "#,
        )
        .bind(request_id)
        .bind(book_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            map_foreign_key(e, || AppError::BadRequest(format!("Unknown book ids: {:?}", book_ids)))
        })?;
        Ok(details)
    }
}

#[async_trait]
impl BorrowingStore for BorrowingsRepository {
    async fn create(&self, user_id: i32, book_ids: &[i32]) -> AppResult<BorrowingRequest> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BorrowingRequestRow>(
            r#"
            INSERT INTO borrowing_requests (requested_by, status, requested_at)
            VALUES ($1, $2, $3)
            RETURNING id, requested_by, status, requested_at, processed_by, processed_at
            "#,
        )
        .bind(user_id)
        .bind(BorrowingStatus::Requested)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let mut details = Self::insert_details(&mut tx, row.id, book_ids).await?;
        tx.commit().await?;

        details.sort_by_key(|d| d.id);
        Ok(row.with_details(details))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<BorrowingRequest>> {
        let query = format!("{} WHERE id = $1", SELECT_REQUESTS);
        let row = sqlx::query_as::<_, BorrowingRequestRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_details(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> AppResult<Vec<BorrowingRequest>> {
        let query = format!("{} ORDER BY id", SELECT_REQUESTS);
        let rows = sqlx::query_as::<_, BorrowingRequestRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        self.attach_details(rows).await
    }

    async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<BorrowingRequest>> {
        let query = format!("{} WHERE requested_by = $1 ORDER BY id", SELECT_REQUESTS);
        let rows = sqlx::query_as::<_, BorrowingRequestRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.attach_details(rows).await
    }

    async fn detail_lines(&self, request_id: i32) -> AppResult<Option<Vec<BorrowingDetailLine>>> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowing_requests WHERE id = $1)",
        )
        .bind(request_id)
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            return Ok(None);
        }

        let lines = sqlx::query_as::<_, BorrowingDetailLine>(
            r#"
            SELECT d.id, d.request_id, d.book_id, b.name AS book_name
            FROM borrowing_request_details d
            JOIN books b ON b.id = d.book_id
            WHERE d.request_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(lines))
    }

    async fn update(&self, id: i32, changes: &BorrowingChanges) -> AppResult<UpdateOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit; the status read here is the one the write applies to
        let current: Option<BorrowingStatus> = sqlx::query_scalar(
            "SELECT status FROM borrowing_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match current {
            None => return Ok(UpdateOutcome::Missing),
            Some(status) if status != changes.expected_status => return Ok(UpdateOutcome::Stale),
            Some(_) => {}
        }

        if let Some(status) = changes.status {
            let (processed_by, processed_at) = match changes.processed {
                Some((user_id, at)) => (Some(user_id), Some(at)),
                None => (None, None),
            };
            sqlx::query(
                r#"
                UPDATE borrowing_requests
                SET status = $1,
                    processed_by = COALESCE($2, processed_by),
                    processed_at = COALESCE($3, processed_at)
                WHERE id = $4
                "#,
            )
            .bind(status)
            .bind(processed_by)
            .bind(processed_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(ref book_ids) = changes.book_ids {
            sqlx::query("DELETE FROM borrowing_request_details WHERE request_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_details(&mut tx, id, book_ids).await?;
        }

        tx.commit().await?;
        Ok(match self.find_by_id(id).await? {
            Some(request) => UpdateOutcome::Updated(request),
            None => UpdateOutcome::Missing,
        })
    }

    async fn references_book(&self, book_id: i32) -> AppResult<bool> {
        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowing_request_details WHERE book_id = $1)",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(referenced)
    }
}
