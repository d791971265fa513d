//! Repository layer for database operations
//!
//! Each store is a trait so the services run against PostgreSQL in
//! production and against [`memory::MemoryStore`] in tests or when no
//! database is configured.

pub mod books;
pub mod borrowings;
pub mod categories;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookInput},
        borrowing::{BorrowingChanges, BorrowingDetailLine, BorrowingRequest, UpdateOutcome},
        category::{Category, CategoryInput},
        user::User,
    },
};

/// Read-only access to user records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;
    /// Cheapest round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;
    async fn create(&self, input: &BookInput) -> AppResult<Book>;
    async fn update(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>>;
    /// Returns false when no book had this id
    async fn delete(&self, id: i32) -> AppResult<bool>;
    /// Subset of `ids` with no matching book
    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Category>>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>>;
    async fn create(&self, input: &CategoryInput) -> AppResult<Category>;
    async fn update(&self, id: i32, input: &CategoryInput) -> AppResult<Option<Category>>;
    /// Returns false when no category had this id
    async fn delete(&self, id: i32) -> AppResult<bool>;
    /// Subset of `ids` with no matching category
    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowingStore: Send + Sync {
    /// Persist a new `requested` request with one detail per book
    async fn create(&self, user_id: i32, book_ids: &[i32]) -> AppResult<BorrowingRequest>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<BorrowingRequest>>;
    async fn list_all(&self) -> AppResult<Vec<BorrowingRequest>>;
    async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<BorrowingRequest>>;
    /// `None` when the request does not exist
    async fn detail_lines(&self, request_id: i32) -> AppResult<Option<Vec<BorrowingDetailLine>>>;
    /// Apply `changes` atomically, provided the request is still in
    /// `changes.expected_status`
    async fn update(&self, id: i32, changes: &BorrowingChanges) -> AppResult<UpdateOutcome>;
    /// Whether any detail line references the book
    async fn references_book(&self, book_id: i32) -> AppResult<bool>;
}

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Turn a foreign key violation into `on_violation()`; any other error stays a
/// database error
pub(crate) fn map_foreign_key(err: sqlx::Error, on_violation: impl FnOnce() -> AppError) -> AppError {
    let violated = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);
    if violated {
        on_violation()
    } else {
        AppError::Database(err)
    }
}

/// Main repository struct holding one handle per store
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub borrowings: Arc<dyn BorrowingStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            categories: Arc::new(categories::CategoriesRepository::new(pool.clone())),
            borrowings: Arc::new(borrowings::BorrowingsRepository::new(pool)),
        }
    }

    /// Create a repository where every store shares one in-memory state
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            books: store.clone(),
            categories: store.clone(),
            borrowings: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct ConstraintError(&'static str);

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "constraint violated ({})", self.0)
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn conflict() -> AppError {
        AppError::Conflict("still referenced".to_string())
    }

    #[test]
    fn test_foreign_key_violation_is_mapped() {
        let err = sqlx::Error::Database(Box::new(ConstraintError("23503")));
        assert!(matches!(map_foreign_key(err, conflict), AppError::Conflict(_)));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let unique = sqlx::Error::Database(Box::new(ConstraintError("23505")));
        assert!(matches!(map_foreign_key(unique, conflict), AppError::Database(_)));
        assert!(matches!(
            map_foreign_key(sqlx::Error::RowNotFound, conflict),
            AppError::Database(_)
        ));
    }
}
