//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "categoryId")]
    pub id: i32,
    #[serde(rename = "categoryName")]
    pub name: String,
}

/// Create or update category request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[serde(rename = "categoryName", alias = "name")]
    #[validate(length(min = 1, max = 100, message = "Category name must be 1 to 100 characters"))]
    pub name: String,
}
