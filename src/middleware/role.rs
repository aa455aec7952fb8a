//! Route-level role gating.
//!
//! Router groups are wrapped with `middleware::from_fn_with_state` using one
//! of the `require_*` functions below, so every route in the group answers
//! 401 without a valid token and 403 for the wrong user type before any
//! handler extractor runs.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use nursery_core::AppError;
use nursery_models::UserType;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Authenticates the request, applies `check` and stores the [`AuthUser`]
/// in the request extensions for downstream extractors.
async fn require_user(
    state: &AppState,
    req: Request,
    next: Next,
    check: impl Fn(&AuthUser) -> Result<(), AppError>,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let auth_user = match AuthUser::from_request_parts(&mut parts, state).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    if let Err(err) = check(&auth_user) {
        return err.into_response();
    }

    next.run(Request::from_parts(parts, body)).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_user(&state, req, next, |user| check_user_type(user, UserType::Admin)).await
}

pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_user(&state, req, next, check_super_admin).await
}

pub async fn require_teacher(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_user(&state, req, next, |user| check_user_type(user, UserType::Teacher)).await
}

pub async fn require_parent(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_user(&state, req, next, |user| check_user_type(user, UserType::Parent)).await
}

fn denied_message(required: UserType) -> &'static str {
    match required {
        UserType::Admin => "Access denied. Administrator privileges required.",
        UserType::Teacher => "Access denied. Teacher account required.",
        UserType::Parent => "Access denied. Parent account required.",
    }
}

/// # Errors
///
/// `AppError::forbidden` with a message naming the required account type.
pub fn check_user_type(auth_user: &AuthUser, required: UserType) -> Result<(), AppError> {
    if auth_user.user_type() != required {
        return Err(AppError::forbidden(denied_message(required)));
    }
    Ok(())
}

pub fn check_any_user_type(auth_user: &AuthUser, allowed: &[UserType]) -> Result<(), AppError> {
    if !allowed.contains(&auth_user.user_type()) {
        return Err(AppError::forbidden(format!(
            "Access denied. Allowed user types: {}",
            allowed
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(())
}

pub fn check_super_admin(auth_user: &AuthUser) -> Result<(), AppError> {
    check_user_type(auth_user, UserType::Admin)?;
    if !auth_user.is_super_admin() {
        return Err(AppError::forbidden(
            "Access denied. Super admin privileges required.",
        ));
    }
    Ok(())
}

/// Owner of a resource, or any admin.
pub fn check_owner_or_admin(auth_user: &AuthUser, owner_id: uuid::Uuid) -> Result<(), AppError> {
    if auth_user.is_admin() || auth_user.user_id()? == owner_id {
        return Ok(());
    }
    Err(AppError::forbidden(
        "You do not have permission to modify this resource.",
    ))
}
