//! Category management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::category::{Category, CategoryInput},
    AppState,
};

use super::AppJson;

/// List all categories
#[utoipa::path(
    get,
    path = "/category-management/categories",
    tag = "categories",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.categories.list_categories().await?;
    Ok(Json(categories))
}

/// Get category by ID
#[utoipa::path(
    get,
    path = "/category-management/categories/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Category>> {
    let category = state.services.categories.get_category(id).await?;
    Ok(Json(category))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/category-management/categories",
    tag = "categories",
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category created", body = Category),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(input): AppJson<CategoryInput>,
) -> AppResult<Json<Category>> {
    let created = state.services.categories.create_category(input).await?;
    Ok(Json(created))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/category-management/categories/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(input): AppJson<CategoryInput>,
) -> AppResult<Json<Category>> {
    let updated = state.services.categories.update_category(id, input).await?;
    Ok(Json(updated))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/category-management/categories/{id}",
    tag = "categories",
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted", body = bool),
        (status = 400, description = "No such category", body = bool)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<bool>)> {
    let deleted = state.services.categories.delete_category(id).await?;
    let status = if deleted {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(deleted)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::super::test_support::TestApp;

    const CATEGORIES: &str = "/api/category-management/categories";

    #[tokio::test]
    async fn test_delete_missing_category() {
        let app = TestApp::new();
        let (_, kept) = app
            .send(Method::POST, CATEGORIES, None, Some(json!({ "categoryName": "Poetry" })))
            .await;

        let (status, body) = app
            .send(Method::DELETE, &format!("{}/999", CATEGORIES), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!(false));

        let (_, all) = app.send(Method::GET, CATEGORIES, None, None).await;
        assert_eq!(all, json!([kept]));
    }

    #[tokio::test]
    async fn test_crud() {
        let app = TestApp::new();
        let (status, created) = app
            .send(Method::POST, CATEGORIES, None, Some(json!({ "categoryName": "Poetry" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        let uri = format!("{}/{}", CATEGORIES, created["categoryId"]);

        let (first, second) = (
            app.send(Method::GET, &uri, None, None).await,
            app.send(Method::GET, &uri, None, None).await,
        );
        assert_eq!(first, second);

        let (status, updated) = app
            .send(Method::PUT, &uri, None, Some(json!({ "categoryName": "Verse" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["categoryName"], "Verse");

        let (status, body) = app.send(Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(true));

        let (status, _) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let app = TestApp::new();
        let (status, _) = app
            .send(Method::POST, CATEGORIES, None, Some(json!({ "categoryName": "" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
