//! Book borrowing workflow service
//!
//! Every user-scoped operation takes an already resolved [`User`]; see
//! [`super::users::UsersService::resolve_caller`].

use std::collections::HashSet;

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{
            BorrowingChanges, BorrowingDetailLine, BorrowingRequest, CreateBorrowing,
            TransitionPolicy, UpdateBorrowing, UpdateOutcome,
        },
        user::User,
    },
    repository::Repository,
};

/// Rounds of read, check and conditional write before giving up on a
/// request that keeps changing
const MAX_UPDATE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct BorrowingService {
    repository: Repository,
    policy: TransitionPolicy,
}

impl BorrowingService {
    pub fn new(repository: Repository, policy: TransitionPolicy) -> Self {
        Self { repository, policy }
    }

    /// Create a borrowing request owned by `user`, one detail line per book
    pub async fn create_borrowing(
        &self,
        user: &User,
        request: CreateBorrowing,
    ) -> AppResult<BorrowingRequest> {
        request.validate()?;
        self.check_books(&request.book_ids).await?;

        let created = self
            .repository
            .borrowings
            .create(user.id, &request.book_ids)
            .await?;

        tracing::info!(
            "Borrowing request {} created by user {} for {} book(s)",
            created.id,
            user.id,
            created.details.len()
        );
        Ok(created)
    }

    /// Change the status and/or book list of request `id`.
    ///
    /// Any caller allowed to manage borrowing may process any user's
    /// request; the caller is recorded as processor on status changes.
    /// The policy is checked against the status the store still holds when
    /// it writes; a concurrent change makes the check run again.
    pub async fn update_borrowing(
        &self,
        user: &User,
        id: i32,
        update: UpdateBorrowing,
    ) -> AppResult<BorrowingRequest> {
        update.validate()?;
        if update.status.is_none() && update.book_ids.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        if let Some(ref book_ids) = update.book_ids {
            self.check_books(book_ids).await?;
        }

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current = self
                .repository
                .borrowings
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Borrowing request {} not found", id)))?;

            let changes = self.accept_changes(user, &current, &update)?;
            let status_change = changes.status;

            match self.repository.borrowings.update(id, &changes).await? {
                UpdateOutcome::Updated(updated) => {
                    if let Some(status) = status_change {
                        tracing::info!(
                            "Borrowing request {} moved from {} to {} by user {}",
                            id,
                            current.status,
                            status,
                            user.id
                        );
                    }
                    return Ok(updated);
                }
                UpdateOutcome::Missing => {
                    return Err(AppError::NotFound(format!(
                        "Borrowing request {} not found",
                        id
                    )));
                }
                UpdateOutcome::Stale => {
                    tracing::debug!(
                        "Borrowing request {} left {} during update, checking again",
                        id,
                        current.status
                    );
                }
            }
        }

        tracing::warn!("Borrowing request {} kept changing, update abandoned", id);
        Err(AppError::Conflict(format!(
            "Borrowing request {} is being updated concurrently",
            id
        )))
    }

    /// Check `update` against the policy for a request currently in
    /// `current.status`
    fn accept_changes(
        &self,
        user: &User,
        current: &BorrowingRequest,
        update: &UpdateBorrowing,
    ) -> AppResult<BorrowingChanges> {
        let status_change = update.status.filter(|&status| status != current.status);

        if let Some(status) = status_change {
            if !self.policy.allows(current.status, status) {
                return Err(AppError::BadRequest(format!(
                    "Cannot move borrowing request {} from {} to {}",
                    current.id, current.status, status
                )));
            }
        }

        if update.book_ids.is_some() && !self.policy.allows_content_change(current.status) {
            return Err(AppError::BadRequest(format!(
                "Borrowing request {} is {} and can no longer be edited",
                current.id, current.status
            )));
        }

        Ok(BorrowingChanges {
            expected_status: current.status,
            status: status_change,
            book_ids: update.book_ids.clone(),
            processed: status_change.map(|_| (user.id, Utc::now())),
        })
    }

    /// Every borrowing request, unfiltered
    pub async fn list_all(&self) -> AppResult<Vec<BorrowingRequest>> {
        self.repository.borrowings.list_all().await
    }

    /// Detail lines of request `id`
    pub async fn get_details(&self, id: i32) -> AppResult<Vec<BorrowingDetailLine>> {
        self.repository
            .borrowings
            .detail_lines(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing request {} not found", id)))
    }

    /// Requests owned by `user`, possibly none
    pub async fn list_for_user(&self, user: &User) -> AppResult<Vec<BorrowingRequest>> {
        self.repository.borrowings.list_by_user(user.id).await
    }

    /// Reject duplicate and unknown book ids
    async fn check_books(&self, book_ids: &[i32]) -> AppResult<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = book_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::BadRequest(format!(
                "Book {} appears more than once",
                dup
            )));
        }

        let missing = self.repository.books.missing_ids(book_ids).await?;
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!("Unknown book ids: {:?}", missing)));
        }
        Ok(())
    }
}
