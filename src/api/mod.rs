//! API handlers for the Bookstore REST endpoints

pub mod books;
pub mod borrowing;
pub mod categories;
pub mod health;
pub mod openapi;

use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::user::{Capability, UserClaims},
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Capability an [`Authorized`] extractor demands
pub trait RequiredCapability {
    const CAPABILITY: Capability;
}

pub struct CanManageCatalog;

impl RequiredCapability for CanManageCatalog {
    const CAPABILITY: Capability = Capability::ManageCatalog;
}

pub struct CanManageBorrowing;

impl RequiredCapability for CanManageBorrowing {
    const CAPABILITY: Capability = Capability::ManageBorrowing;
}

/// Authenticated caller whose role grants `C`.
///
/// Runs with the request parts, so a denied caller is rejected before the
/// body is read.
pub struct Authorized<C>(pub UserClaims, PhantomData<C>);

#[async_trait]
impl<C> FromRequestParts<AppState> for Authorized<C>
where
    C: RequiredCapability + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        claims.require(C::CAPABILITY)?;
        Ok(Authorized(claims, PhantomData))
    }
}

/// JSON body extractor whose rejections use the application error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let book_management = Router::new()
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/book-borrowing",
            get(borrowing::list_borrowings).post(borrowing::create_borrowing),
        )
        .route("/book-borrowing/:id", put(borrowing::update_borrowing))
        .route("/book-borrowingdetail/:id", get(borrowing::get_borrowing_details))
        .route("/book-borrowingrequest", get(borrowing::list_my_borrowings));

    let category_management = Router::new()
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        );

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/book-management", book_management)
        .nest("/category-management", category_management)
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
