//! API integration tests
//!
//! Run against a live server started with `RUN_MODE=development` (memory
//! backend, users 1 = admin and 2 = reader):
//! `cargo test --test api_tests -- --ignored`

use bookstore_server::models::user::{Role, UserClaims};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Mint a token with the secret the server was started with
fn token(user_id: Option<i32>, role: Role) -> String {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".into());
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: "integration".to_string(),
        user_id,
        role,
        exp: now + 600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

fn admin_token() -> String {
    token(Some(1), Role::SuperUser)
}

async fn create_book(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/book-management/books", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "bookName": name, "categoryIds": [] }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["bookId"].as_i64().expect("No book ID")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/book-management/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/book-management/book-borrowing", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/book-management/book-borrowing", BASE_URL))
        .bearer_auth(token(Some(2), Role::NormalUser))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_borrowing_workflow() {
    let client = Client::new();
    let first = create_book(&client, "Integration A").await;
    let second = create_book(&client, "Integration B").await;

    let response = client
        .post(format!("{}/book-management/book-borrowing", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "bookIds": [first, second] }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let created: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(created["requestedBy"], 1);
    assert_eq!(created["details"].as_array().map(Vec::len), Some(2));

    let response = client
        .put(format!(
            "{}/book-management/book-borrowing/{}",
            BASE_URL, created["id"]
        ))
        .bearer_auth(admin_token())
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["status"], "approved");

    let response = client
        .get(format!(
            "{}/book-management/book-borrowingdetail/{}",
            BASE_URL, created["id"]
        ))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let lines: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(lines[0]["bookName"], "Integration A");
}

#[tokio::test]
#[ignore]
async fn test_unknown_user_is_bad_request() {
    let client = Client::new();

    let response = client
        .get(format!("{}/book-management/book-borrowingrequest", BASE_URL))
        .bearer_auth(token(Some(9999), Role::SuperUser))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_delete_missing_category() {
    let client = Client::new();

    let response = client
        .delete(format!("{}/category-management/categories/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!(false));
}
