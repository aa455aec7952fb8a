mod common;

use axum::http::StatusCode;
use common::{TEST_PASSWORD, generate_unique_email, get_request, json_body, json_request, test_app};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

fn registration(email: &str) -> serde_json::Value {
    json!({
        "first_name": "Ada",
        "last_name": "Okafor",
        "email": email,
        "phone_number": "0771234567",
        "password": TEST_PASSWORD,
        "confirm_password": TEST_PASSWORD,
        "occupation": "Engineer",
    })
}

fn login(email: &str) -> serde_json::Value {
    json!({ "email": email, "password": TEST_PASSWORD })
}

async fn verification_token(pool: &PgPool, email: &str) -> Uuid {
    sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT email_verification_token FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
    .expect("registration stores a verification token")
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_registers_verifies_and_logs_in(pool: PgPool) {
    let app = test_app(pool.clone());
    let email = generate_unique_email();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register/parent",
            None,
            registration(&email),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["user_type"], "parent");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/login", None, login(&email)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Please verify your email before logging in.");

    let token = verification_token(&pool, &email).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/verify-email",
            None,
            json!({ "token": token.to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/auth/login", None, login(&email)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["token_type"], "Bearer");
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request("/api/v1/auth/profile", Some(&access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The token is single use.
    let reused = test_app(pool)
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/verify-email",
            None,
            json!({ "token": token.to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(reused.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_registration_is_rejected(pool: PgPool) {
    let app = test_app(pool);
    let email = generate_unique_email();

    let first = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register/parent",
            None,
            registration(&email),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register/parent",
            None,
            registration(&email),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = json_body(second).await;
    assert!(body["details"]["email"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_verification_token_is_rejected(pool: PgPool) {
    let app = test_app(pool.clone());
    let email = generate_unique_email();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register/parent",
            None,
            registration(&email),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    sqlx::query(
        "UPDATE users SET email_verification_sent_at = NOW() - INTERVAL '30 days' WHERE email = $1",
    )
    .bind(&email)
    .execute(&pool)
    .await
    .unwrap();

    let token = verification_token(&pool, &email).await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/verify-email",
            None,
            json!({ "token": token.to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let verified = sqlx::query_scalar::<_, bool>(
        "SELECT is_email_verified FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!verified);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_wrong_password_is_unauthorized(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let parent = common::create_test_user(&mut tx, nursery::nursery_models::UserType::Parent).await;
    tx.commit().await.unwrap();

    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
        .bind(parent.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    let response = test_app(pool)
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": "Wr0ng!Pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
