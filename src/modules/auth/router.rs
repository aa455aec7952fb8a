use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    change_password, forgot_password, get_profile, health, login, refresh_token, register_parent,
    resend_verification, reset_password, update_profile, validate_reset_token, verify_email,
};

/// Public credential endpoints. The router applies the rate limiter here.
pub fn init_auth_public_router() -> Router<AppState> {
    Router::new()
        .route("/register/parent", post(register_parent))
        .route("/login", post(login))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/refresh", post(refresh_token))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/validate-reset-token/{token}", get(validate_reset_token))
}

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/change-password", post(change_password))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/health", get(health))
}
