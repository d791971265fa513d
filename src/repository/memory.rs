//! In-memory store
//!
//! Implements every store trait over a single shared state. Used by the
//! tests and by the `memory` storage backend; nothing survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BookStore, BorrowingStore, CategoryStore, UserStore};
use crate::{
    error::AppResult,
    models::{
        book::{Book, BookInput},
        borrowing::{
            BorrowingChanges, BorrowingDetail, BorrowingDetailLine, BorrowingRequest,
            BorrowingStatus, UpdateOutcome,
        },
        category::{Category, CategoryInput},
        user::User,
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    books: BTreeMap<i32, Book>,
    categories: BTreeMap<i32, Category>,
    borrowings: BTreeMap<i32, BorrowingRequest>,
    next_book_id: i32,
    next_category_id: i32,
    next_request_id: i32,
    next_detail_id: i32,
}

impl MemoryState {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn new_details(&mut self, request_id: i32, book_ids: &[i32]) -> Vec<BorrowingDetail> {
        book_ids
            .iter()
            .map(|&book_id| BorrowingDetail {
                id: Self::next_id(&mut self.next_detail_id),
                request_id,
                book_id,
            })
            .collect()
    }
}

/// Shared in-memory state behind every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with user records
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let state = MemoryState {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            ..MemoryState::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.state.read().await.books.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn create(&self, input: &BookInput) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let book = Book {
            id: MemoryState::next_id(&mut state.next_book_id),
            name: input.name.clone(),
            category_ids: input.normalized_category_ids(),
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i32, input: &BookInput) -> AppResult<Option<Book>> {
        let mut state = self.state.write().await;
        Ok(state.books.get_mut(&id).map(|book| {
            book.name = input.name.clone();
            book.category_ids = input.normalized_category_ids();
            book.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.state.write().await.books.remove(&id).is_some())
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !state.books.contains_key(id))
            .collect())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Category>> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn create(&self, input: &CategoryInput) -> AppResult<Category> {
        let mut state = self.state.write().await;
        let category = Category {
            id: MemoryState::next_id(&mut state.next_category_id),
            name: input.name.clone(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i32, input: &CategoryInput) -> AppResult<Option<Category>> {
        let mut state = self.state.write().await;
        Ok(state.categories.get_mut(&id).map(|category| {
            category.name = input.name.clone();
            category.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for book in state.books.values_mut() {
            book.category_ids.retain(|&c| c != id);
        }
        Ok(true)
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !state.categories.contains_key(id))
            .collect())
    }
}

#[async_trait]
impl BorrowingStore for MemoryStore {
    async fn create(&self, user_id: i32, book_ids: &[i32]) -> AppResult<BorrowingRequest> {
        let mut state = self.state.write().await;
        let id = MemoryState::next_id(&mut state.next_request_id);
        let details = state.new_details(id, book_ids);
        let request = BorrowingRequest {
            id,
            requested_by: user_id,
            status: BorrowingStatus::Requested,
            requested_at: Utc::now(),
            processed_by: None,
            processed_at: None,
            details,
        };
        state.borrowings.insert(id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<BorrowingRequest>> {
        Ok(self.state.read().await.borrowings.get(&id).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<BorrowingRequest>> {
        Ok(self.state.read().await.borrowings.values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<BorrowingRequest>> {
        Ok(self
            .state
            .read()
            .await
            .borrowings
            .values()
            .filter(|r| r.requested_by == user_id)
            .cloned()
            .collect())
    }

    async fn detail_lines(&self, request_id: i32) -> AppResult<Option<Vec<BorrowingDetailLine>>> {
        let state = self.state.read().await;
        Ok(state.borrowings.get(&request_id).map(|request| {
            request
                .details
                .iter()
                .map(|d| BorrowingDetailLine {
                    id: d.id,
                    request_id: d.request_id,
                    book_id: d.book_id,
                    book_name: state
                        .books
                        .get(&d.book_id)
                        .map(|b| b.name.clone())
                        .unwrap_or_default(),
                })
                .collect()
        }))
    }

    async fn update(&self, id: i32, changes: &BorrowingChanges) -> AppResult<UpdateOutcome> {
        let mut state = self.state.write().await;
        match state.borrowings.get(&id) {
            None => return Ok(UpdateOutcome::Missing),
            Some(request) if request.status != changes.expected_status => {
                return Ok(UpdateOutcome::Stale)
            }
            Some(_) => {}
        }

        let new_details = changes
            .book_ids
            .as_ref()
            .map(|book_ids| state.new_details(id, book_ids));

        let Some(request) = state.borrowings.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if let Some(status) = changes.status {
            request.status = status;
        }
        if let Some((user_id, at)) = changes.processed {
            request.processed_by = Some(user_id);
            request.processed_at = Some(at);
        }
        if let Some(details) = new_details {
            request.details = details;
        }
        Ok(UpdateOutcome::Updated(request.clone()))
    }

    async fn references_book(&self, book_id: i32) -> AppResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .borrowings
            .values()
            .any(|r| r.details.iter().any(|d| d.book_id == book_id)))
    }
}
