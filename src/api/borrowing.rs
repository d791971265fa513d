//! Book borrowing endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::borrowing::{BorrowingDetailLine, BorrowingRequest, CreateBorrowing, UpdateBorrowing},
    AppState,
};

use super::{AppJson, Authorized, CanManageBorrowing};

/// Create a borrowing request for the current user
#[utoipa::path(
    post,
    path = "/book-management/book-borrowing",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    request_body = CreateBorrowing,
    responses(
        (status = 200, description = "Borrowing request created", body = BorrowingRequest),
        (status = 400, description = "Unknown user, unknown or duplicate books"),
        (status = 404, description = "No user identity in token"),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn create_borrowing(
    State(state): State<AppState>,
    Authorized(claims, _): Authorized<CanManageBorrowing>,
    AppJson(request): AppJson<CreateBorrowing>,
) -> AppResult<Json<BorrowingRequest>> {
    let user = state.services.users.resolve_caller(&claims).await?;

    let created = state.services.borrowing.create_borrowing(&user, request).await?;
    Ok(Json(created))
}

/// List every borrowing request
#[utoipa::path(
    get,
    path = "/book-management/book-borrowing",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All borrowing requests", body = Vec<BorrowingRequest>),
        (status = 403, description = "Insufficient rights")
    )
)]
pub async fn list_borrowings(
    State(state): State<AppState>,
    _: Authorized<CanManageBorrowing>,
) -> AppResult<Json<Vec<BorrowingRequest>>> {
    let requests = state.services.borrowing.list_all().await?;
    Ok(Json(requests))
}

/// Update status or books of a borrowing request
#[utoipa::path(
    put,
    path = "/book-management/book-borrowing/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing request ID")
    ),
    request_body = UpdateBorrowing,
    responses(
        (status = 200, description = "Borrowing request updated", body = BorrowingRequest),
        (status = 400, description = "Unknown user or rejected change"),
        (status = 404, description = "No user identity in token, or request not found")
    )
)]
pub async fn update_borrowing(
    State(state): State<AppState>,
    Authorized(claims, _): Authorized<CanManageBorrowing>,
    Path(id): Path<i32>,
    AppJson(update): AppJson<UpdateBorrowing>,
) -> AppResult<Json<BorrowingRequest>> {
    let user = state.services.users.resolve_caller(&claims).await?;

    let updated = state.services.borrowing.update_borrowing(&user, id, update).await?;
    Ok(Json(updated))
}

/// Get the detail lines of a borrowing request
#[utoipa::path(
    get,
    path = "/book-management/book-borrowingdetail/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing request ID")
    ),
    responses(
        (status = 200, description = "Detail lines", body = Vec<BorrowingDetailLine>),
        (status = 404, description = "Borrowing request not found")
    )
)]
pub async fn get_borrowing_details(
    State(state): State<AppState>,
    _: Authorized<CanManageBorrowing>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BorrowingDetailLine>>> {
    let lines = state.services.borrowing.get_details(id).await?;
    Ok(Json(lines))
}

/// List the current user's borrowing requests
#[utoipa::path(
    get,
    path = "/book-management/book-borrowingrequest",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's borrowing requests", body = Vec<BorrowingRequest>),
        (status = 400, description = "Unknown user"),
        (status = 404, description = "No user identity in token")
    )
)]
pub async fn list_my_borrowings(
    State(state): State<AppState>,
    Authorized(claims, _): Authorized<CanManageBorrowing>,
) -> AppResult<Json<Vec<BorrowingRequest>>> {
    let user = state.services.users.resolve_caller(&claims).await?;

    let requests = state.services.borrowing.list_for_user(&user).await?;
    Ok(Json(requests))
}
