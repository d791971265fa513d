//! Data models for the Bookstore server

pub mod book;
pub mod borrowing;
pub mod category;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookInput};
pub use borrowing::{BorrowingDetail, BorrowingRequest, BorrowingStatus};
pub use category::{Category, CategoryInput};
pub use user::{Role, User, UserClaims};
