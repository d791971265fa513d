//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, BookInput},
    AppState,
};

use super::{AppJson, Authorized, CanManageCatalog};

/// List all books
#[utoipa::path(
    get,
    path = "/book-management/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 500, description = "Catalog unavailable")
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/book-management/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/book-management/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or unknown category"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    _: Authorized<CanManageCatalog>,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<Json<Book>> {
    let created = state.services.catalog.create_book(input).await?;
    Ok(Json(created))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/book-management/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or unknown category"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    _: Authorized<CanManageCatalog>,
    Path(id): Path<i32>,
    AppJson(input): AppJson<BookInput>,
) -> AppResult<Json<Book>> {
    let updated = state.services.catalog.update_book(id, input).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/book-management/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Whether a book was deleted", body = bool),
        (status = 409, description = "Book is part of a borrowing request")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _: Authorized<CanManageCatalog>,
    Path(id): Path<i32>,
) -> AppResult<Json<bool>> {
    let deleted = state.services.catalog.delete_book(id).await?;
    Ok(Json(deleted))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::super::test_support::TestApp;
    use crate::models::user::Role;

    #[tokio::test]
    async fn test_public_reads_and_protected_writes() {
        let app = TestApp::new();

        let (status, body) = app.send(Method::GET, "/api/book-management/books", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let book = json!({ "bookName": "Dune", "categoryIds": [] });
        let (status, _) = app
            .send(Method::POST, "/api/book-management/books", None, Some(book.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let reader = app.token(Some(3), Role::NormalUser);
        let (status, _) = app
            .send(Method::POST, "/api/book-management/books", Some(&reader), Some(book))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, body) = app.send(Method::GET, "/api/book-management/books", None, None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_create_fetch_update_delete() {
        let app = TestApp::new();
        let token = app.admin_token();

        let (status, created) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&token),
                Some(json!({ "bookName": "Dune", "categoryIds": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let uri = format!("/api/book-management/books/{}", created["bookId"]);

        let (status, fetched) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = app
            .send(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({ "bookName": "Dune Messiah", "categoryIds": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["bookName"], "Dune Messiah");

        let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(true));

        let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(false));

        let (status, _) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_set_round_trip() {
        let app = TestApp::new();
        let token = app.admin_token();

        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let (_, category) = app
                .send(
                    Method::POST,
                    "/api/category-management/categories",
                    None,
                    Some(json!({ "categoryName": name })),
                )
                .await;
            ids.push(category["categoryId"].as_i64().unwrap());
        }

        let (_, created) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&token),
                Some(json!({ "bookName": "Emma", "categoryIds": [ids[1], ids[0]] })),
            )
            .await;
        let (_, fetched) = app
            .send(
                Method::GET,
                &format!("/api/book-management/books/{}", created["bookId"]),
                None,
                None,
            )
            .await;

        let mut categories: Vec<i64> = fetched["categoryIds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        categories.sort_unstable();
        assert_eq!(categories, ids);
    }

    #[tokio::test]
    async fn test_unknown_category_is_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&app.admin_token()),
                Some(json!({ "bookName": "Dune", "categoryIds": [12] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadValue");
    }

    #[tokio::test]
    async fn test_reader_cannot_change_books() {
        let app = TestApp::new();
        let (_, created) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&app.admin_token()),
                Some(json!({ "bookName": "Dune", "categoryIds": [] })),
            )
            .await;
        let uri = format!("/api/book-management/books/{}", created["bookId"]);
        let reader = app.token(Some(3), Role::NormalUser);

        let (status, body) = app
            .send(
                Method::PUT,
                &uri,
                Some(&reader),
                Some(json!({ "bookName": "Renamed", "categoryIds": [] })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "NotAuthorized");

        let (status, _) = app.send(Method::DELETE, &uri, Some(&reader), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, fetched) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_rights_checked_before_body() {
        let app = TestApp::new();
        let reader = app.token(Some(3), Role::NormalUser);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&reader),
                Some(json!({ "bookName": 42 })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/book-management/books",
                Some(&app.admin_token()),
                Some(json!({ "bookName": 42 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadValue");
    }
}
