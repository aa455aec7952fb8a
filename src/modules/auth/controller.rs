use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use nursery_core::AppError;
use tracing::{error, instrument};
use utoipa::ToSchema;

use super::model::{
    ChangePasswordRequest, FORGOT_PASSWORD_MESSAGE, ForgotPasswordRequest, HealthResponse,
    LoginRequest, LoginResponse, MessageResponse, ProfileResponse, RefreshTokenRequest,
    RefreshTokenResponse, RegisterParentDto, RegisterResponse, ResendVerificationRequest,
    ResetPasswordRequest, UpdateProfileDto, UserResponse, VERIFICATION_SENT_MESSAGE,
    ValidateResetTokenResponse, VerifyEmailRequest,
};
use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Field name to messages, present on validation failures
    pub details: Option<std::collections::HashMap<String, Vec<String>>>,
}

/// Register a parent account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register/parent",
    request_body = RegisterParentDto,
    responses(
        (status = 201, description = "Parent registered, verification email sent", body = RegisterResponse),
        (status = 400, description = "Validation error or email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register_parent(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterParentDto>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (user, token) = AuthService::register_parent(&state.db, dto).await?;

    let email_service = state.email_service();
    let content = email_service.verification_email(
        &user.full_name(),
        &token.to_string(),
        state.account_config.email_verification_ttl_hours,
    );
    email_service
        .send_or_log("verification", &user.email, content)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: VERIFICATION_SENT_MESSAGE.to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error or user type mismatch", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Account inactive or email not verified", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Verify an email address
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired verification token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = AuthService::verify_email(
        &state.db,
        &dto.token,
        state.account_config.email_verification_ttl_hours,
    )
    .await?;

    let email_service = state.email_service();
    let content = email_service.welcome_email(&user.full_name());
    email_service.send_or_log("welcome", &user.email, content).await;

    Ok(Json(MessageResponse::new(
        "Email verified successfully. You can now log in.",
    )))
}

/// Send a new verification email
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 400, description = "Email already verified", body = ErrorResponse),
        (status = 404, description = "No account with this email", body = ErrorResponse),
        (status = 500, description = "Email delivery failed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let (user, token) = AuthService::resend_verification(&state.db, &dto.email).await?;

    let email_service = state.email_service();
    let content = email_service.verification_email(
        &user.full_name(),
        &token.to_string(),
        state.account_config.email_verification_ttl_hours,
    );
    email_service
        .send("verification", &user.email, content)
        .await
        .map_err(|err| {
            error!(error = %err.message(), "Failed to resend verification email");
            AppError::internal_error("Failed to send verification email")
        })?;

    Ok(Json(MessageResponse::new(
        "Verification email sent. Please check your inbox.",
    )))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshTokenResponse),
        (status = 401, description = "Invalid refresh token or user can no longer log in", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let response = AuthService::refresh(&state.db, &dto.refresh_token, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Some((user, token)) = AuthService::forgot_password(&state.db, &dto.email).await? {
        let email_service = state.email_service();
        let content = email_service.password_reset_email(
            &user.full_name(),
            &token.to_string(),
            state.account_config.password_reset_ttl_hours,
        );
        email_service
            .send_or_log("password_reset", &user.email, content)
            .await;
    }

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

/// Reset a password with an emailed token
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or weak password", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = AuthService::reset_password(
        &state.db,
        dto,
        state.account_config.password_reset_ttl_hours,
    )
    .await?;

    let email_service = state.email_service();
    let content = email_service.password_reset_confirmation_email(&user.full_name());
    email_service
        .send_or_log("password_reset_confirmation", &user.email, content)
        .await;

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now log in.",
    )))
}

/// Check whether a reset token is still usable
#[utoipa::path(
    get,
    path = "/api/v1/auth/validate-reset-token/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    responses(
        (status = 200, description = "Token is valid", body = ValidateResetTokenResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, token))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ValidateResetTokenResponse>, AppError> {
    let user = AuthService::validate_reset_token(
        &state.db,
        &token,
        state.account_config.password_reset_ttl_hours,
    )
    .await?;

    Ok(Json(ValidateResetTokenResponse {
        valid: true,
        email: user.email,
    }))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or invalid new password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(MessageResponse::new("Password changed successfully.")))
}

/// Current user with their role profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = AuthService::get_profile(&state.db, auth_user.user_id()?).await?;
    Ok(Json(profile))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = AuthService::update_profile(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(profile))
}

/// Service and database health
#[utoipa::path(
    get,
    path = "/api/v1/auth/health",
    responses(
        (status = 200, description = "Healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    AuthService::health(&state.db).await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
    }))
}
