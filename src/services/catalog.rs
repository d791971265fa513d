//! Book catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List every book
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book attached to existing categories
    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        self.check_input(&input).await?;
        let book = self.repository.books.create(&input).await?;
        tracing::info!("Created book id={} with {} categories", book.id, book.category_ids.len());
        Ok(book)
    }

    /// Replace name and categories of a book
    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<Book> {
        self.check_input(&input).await?;
        self.repository
            .books
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book. Returns false if it did not exist.
    pub async fn delete_book(&self, id: i32) -> AppResult<bool> {
        if self.repository.borrowings.references_book(id).await? {
            return Err(AppError::Conflict(format!(
                "Book {} is part of a borrowing request",
                id
            )));
        }
        let deleted = self.repository.books.delete(id).await?;
        if deleted {
            tracing::info!("Deleted book id={}", id);
        }
        Ok(deleted)
    }

    async fn check_input(&self, input: &BookInput) -> AppResult<()> {
        input.validate()?;

        let missing = self
            .repository
            .categories
            .missing_ids(&input.normalized_category_ids())
            .await?;
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Unknown category ids: {:?}",
                missing
            )));
        }
        Ok(())
    }
}
