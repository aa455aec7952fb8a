//! Authentication request and response bodies.

use nursery_core::validation::{
    validate_person_name, validate_phone_number, validate_strong_password,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::enums::UserType;
use crate::users::UserResponse;

/// Self-registration for parents. Creates an inactive account that is
/// activated by email verification.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterParentDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: String,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "parent@example.com")]
    pub email: String,
    #[validate(custom(function = "validate_phone_number"))]
    #[schema(example = "0771234567")]
    pub phone_number: Option<String>,
    #[validate(custom(function = "validate_strong_password"))]
    #[schema(example = "Sunflower#2024")]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    /// When present, the account must be of this type.
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Verification token is required."))]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required."))]
    pub token: String,
    #[validate(custom(function = "validate_strong_password"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match."))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateResetTokenResponse {
    pub valid: bool,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required."))]
    #[serde(alias = "old_password")]
    pub current_password: String,
    #[validate(custom(function = "validate_strong_password"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "New passwords do not match."))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "connected")]
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_dto() -> RegisterParentDto {
        RegisterParentDto {
            first_name: "Nimali".into(),
            last_name: "Silva".into(),
            email: "nimali@example.com".into(),
            phone_number: Some("+94771234567".into()),
            password: "Sunflower#2024".into(),
            confirm_password: "Sunflower#2024".into(),
            occupation: None,
            emergency_contact: None,
            address: None,
        }
    }

    #[test]
    fn test_register_dto_valid() {
        assert!(register_dto().validate().is_ok());
    }

    #[test]
    fn test_register_dto_password_mismatch() {
        let dto = RegisterParentDto {
            confirm_password: "Sunflower#2025".into(),
            ..register_dto()
        };
        let errors = dto.validate().unwrap_err();
        let field_errors = errors.field_errors();
        let messages = &field_errors["confirm_password"];
        assert_eq!(
            messages[0].message.as_deref(),
            Some("Passwords do not match.")
        );
    }

    #[test]
    fn test_register_dto_weak_password() {
        let dto = RegisterParentDto {
            password: "password".into(),
            confirm_password: "password".into(),
            ..register_dto()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_login_request_accepts_user_type() {
        let req: LoginRequest = serde_json::from_str(
            r#"{"email":"t@example.com","password":"x","user_type":"teacher"}"#,
        )
        .unwrap();
        assert_eq!(req.user_type, Some(UserType::Teacher));
    }

    #[test]
    fn test_change_password_accepts_old_password_alias() {
        let req: ChangePasswordRequest = serde_json::from_str(
            r#"{"old_password":"a","new_password":"Sunflower#2024","confirm_password":"Sunflower#2024"}"#,
        )
        .unwrap();
        assert_eq!(req.current_password, "a");
        assert!(req.validate().is_ok());
    }
}
