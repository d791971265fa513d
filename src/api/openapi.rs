//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowing, categories, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore API",
        version = "0.1.0",
        description = "Book borrowing management REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowing
        borrowing::create_borrowing,
        borrowing::list_borrowings,
        borrowing::update_borrowing,
        borrowing::get_borrowing_details,
        borrowing::list_my_borrowings,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::category::Category,
            crate::models::category::CategoryInput,
            crate::models::borrowing::BorrowingStatus,
            crate::models::borrowing::BorrowingRequest,
            crate::models::borrowing::BorrowingDetail,
            crate::models::borrowing::BorrowingDetailLine,
            crate::models::borrowing::CreateBorrowing,
            crate::models::borrowing::UpdateBorrowing,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "borrowing", description = "Book borrowing requests"),
        (name = "categories", description = "Category management")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_borrowing_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/book-management/book-borrowing/{id}"));
        assert!(doc.paths.paths.contains_key("/category-management/categories"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
