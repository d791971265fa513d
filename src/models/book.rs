//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book with the categories it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "bookId")]
    pub id: i32,
    #[serde(rename = "bookName")]
    pub name: String,
    pub category_ids: Vec<i32>,
}

/// Create or update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[serde(rename = "bookName", alias = "name")]
    #[validate(length(min = 1, max = 255, message = "Book name must be 1 to 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub category_ids: Vec<i32>,
}

impl BookInput {
    /// Category ids sorted with duplicates removed
    pub fn normalized_category_ids(&self) -> Vec<i32> {
        let mut ids = self.category_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
