//! User directory service

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Resolve the authenticated caller to a user record.
    ///
    /// Claims without a user identifier yield `NotFound`; an identifier with
    /// no matching record yields `BadRequest`.
    pub async fn resolve_caller(&self, claims: &UserClaims) -> AppResult<User> {
        let user_id = claims.user_id.ok_or_else(|| {
            AppError::NotFound(format!("No user identity in token for {}", claims.sub))
        })?;

        self.repository
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Token subject {} references unknown user {}", claims.sub, user_id);
                AppError::BadRequest(format!("User {} does not exist", user_id))
            })
    }

    /// Whether the user directory answers
    pub async fn check_store(&self) -> AppResult<()> {
        self.repository.users.ping().await
    }
}
