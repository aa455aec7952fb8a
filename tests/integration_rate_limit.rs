mod common;

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::StatusCode;
use common::{json_request, lazy_pool, test_state};
use nursery::nursery_config::RateLimitConfig;
use nursery::router::init_router;
use serde_json::json;
use tower::ServiceExt;

fn strict_app() -> axum::Router {
    let state = nursery::state::AppState {
        rate_limit_config: RateLimitConfig {
            enabled: true,
            auth_per_second: 60,
            auth_burst_size: 1,
        },
        ..test_state(lazy_pool())
    };
    init_router(state)
}

fn login_from(ip: [u8; 4]) -> axum::http::Request<axum::body::Body> {
    // Fails validation, so the handler never touches the database.
    let mut request = json_request(
        "POST",
        "/api/v1/auth/login",
        None,
        json!({ "email": "not-an-email", "password": "" }),
    );
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
    request
}

#[tokio::test]
async fn test_auth_burst_exhausted() {
    let app = strict_app();

    let first = app.clone().oneshot(login_from([10, 0, 0, 1])).await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = app.oneshot(login_from([10, 0, 0, 1])).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_limit_is_per_address() {
    let app = strict_app();

    let first = app.clone().oneshot(login_from([10, 0, 0, 2])).await.unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let other = app.oneshot(login_from([10, 0, 0, 3])).await.unwrap();
    assert_eq!(other.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_is_not_rate_limited() {
    let app = strict_app();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(common::get_request("/api/v1/auth/profile", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
