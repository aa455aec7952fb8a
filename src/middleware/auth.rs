use anyhow::Context;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use nursery_auth::{Claims, verify_token};
use nursery_core::AppError;
use nursery_models::{AdminLevel, UserType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.0.user_id()
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn user_type(&self) -> UserType {
        self.0.user_type
    }

    pub fn admin_level(&self) -> Option<AdminLevel> {
        self.0.admin_level
    }

    pub fn is_admin(&self) -> bool {
        self.0.user_type == UserType::Admin
    }

    pub fn is_super_admin(&self) -> bool {
        self.0.is_super_admin()
    }

    /// Teachers and admins.
    pub fn is_staff(&self) -> bool {
        matches!(self.0.user_type, UserType::Teacher | UserType::Admin)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

/// Account state as stored right now, independent of what the token says.
#[derive(Debug, Clone, FromRow)]
pub struct AccountState {
    pub user_type: UserType,
    pub is_active: bool,
    /// `None` when the role profile row is missing
    pub profile_active: Option<bool>,
    pub admin_level: Option<AdminLevel>,
}

/// Loads the caller's current account flags.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn load_account_state(db: &PgPool, user_id: Uuid) -> Result<Option<AccountState>, AppError> {
    sqlx::query_as::<_, AccountState>(
        r#"SELECT u.user_type,
                  u.is_active,
                  CASE u.user_type
                      WHEN 'teacher' THEN t.is_active
                      WHEN 'parent' THEN p.is_active
                      ELSE a.is_active
                  END AS profile_active,
                  a.admin_level
           FROM users u
           LEFT JOIN teachers t ON t.user_id = u.id
           LEFT JOIN parents p ON p.user_id = u.id
           LEFT JOIN admins a ON a.user_id = u.id
           WHERE u.id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("Failed to load account state")
    .map_err(AppError::database)
}

/// Reconciles verified claims with the stored account.
///
/// A missing or deactivated user is rejected with 401 and a deactivated
/// role profile with 403. The returned claims carry the stored user type
/// and admin level, so a demotion takes effect on the next request.
///
/// # Arguments
///
/// * `claims` - Claims from a token whose signature and expiry are valid
/// * `account` - Result of [`load_account_state`] for the token subject
///
/// # Errors
///
/// `AppError::unauthorized` for a missing or inactive user and
/// `AppError::forbidden` for an inactive role profile.
pub fn apply_account_state(
    mut claims: Claims,
    account: Option<AccountState>,
) -> Result<Claims, AppError> {
    let account = match account {
        Some(account) if account.is_active => account,
        _ => {
            return Err(AppError::unauthorized(
                "User account is inactive or no longer exists.",
            ));
        }
    };
    if account.profile_active != Some(true) {
        return Err(AppError::forbidden(
            "Your account profile has been deactivated.",
        ));
    }

    claims.user_type = account.user_type;
    claims.admin_level = match account.user_type {
        UserType::Admin => account.admin_level,
        _ => None,
    };
    Ok(claims)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    /// Verifies the bearer token, then checks the account is still active
    /// and refreshes the role from the database. The result is cached in
    /// the request extensions so later extractors skip both steps.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let claims = verify_token(bearer_token(parts)?, &state.jwt_config)?;
        let account = load_account_state(&state.db, claims.user_id()?).await?;
        let user = AuthUser(apply_account_state(claims, account)?);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Generates an extractor that authenticates the caller and then applies a
/// predicate over [`AuthUser`], rejecting with 403 and `$message` on failure.
#[macro_export]
macro_rules! require_user {
    ($name:ident, $check:expr, $message:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = nursery_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                let check: fn(&$crate::middleware::auth::AuthUser) -> bool = $check;
                if !check(&auth_user) {
                    return Err(nursery_core::AppError::forbidden($message));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_user!(
    RequireAdmin,
    |user| user.is_admin(),
    "Access denied. Administrator privileges required."
);
require_user!(
    RequireSuperAdmin,
    |user| user.is_super_admin(),
    "Access denied. Super admin privileges required."
);
require_user!(
    RequireTeacher,
    |user| user.user_type() == UserType::Teacher,
    "Access denied. Teacher account required."
);
require_user!(
    RequireParent,
    |user| user.user_type() == UserType::Parent,
    "Access denied. Parent account required."
);
require_user!(
    RequireStaff,
    |user| user.is_staff(),
    "Only teachers and admins can create stories"
);

#[cfg(test)]
mod tests {
    use super::*;
    use nursery_auth::ACCESS_TOKEN;

    fn auth_user(user_type: UserType, admin_level: Option<AdminLevel>) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            email: "nimal@example.com".to_string(),
            user_type,
            admin_level,
            token_type: ACCESS_TOKEN.to_string(),
            exp: 9_999_999_999,
            iat: 1_234_567_890,
        })
    }

    #[test]
    fn test_is_admin() {
        assert!(auth_user(UserType::Admin, Some(AdminLevel::Moderator)).is_admin());
        assert!(!auth_user(UserType::Teacher, None).is_admin());
    }

    #[test]
    fn test_is_super_admin_requires_level() {
        assert!(auth_user(UserType::Admin, Some(AdminLevel::SuperAdmin)).is_super_admin());
        assert!(!auth_user(UserType::Admin, Some(AdminLevel::Admin)).is_super_admin());
        assert!(!auth_user(UserType::Teacher, Some(AdminLevel::SuperAdmin)).is_super_admin());
    }

    #[test]
    fn test_is_staff() {
        assert!(auth_user(UserType::Teacher, None).is_staff());
        assert!(auth_user(UserType::Admin, Some(AdminLevel::Admin)).is_staff());
        assert!(!auth_user(UserType::Parent, None).is_staff());
    }

    fn account(user_type: UserType, admin_level: Option<AdminLevel>) -> AccountState {
        AccountState {
            user_type,
            is_active: true,
            profile_active: Some(true),
            admin_level,
        }
    }

    #[test]
    fn test_inactive_or_missing_account_is_unauthorized() {
        let claims = auth_user(UserType::Teacher, None).0;
        let err = apply_account_state(claims.clone(), None).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);

        let inactive = AccountState {
            is_active: false,
            ..account(UserType::Teacher, None)
        };
        let err = apply_account_state(claims, Some(inactive)).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_deactivated_profile_is_forbidden() {
        let claims = auth_user(UserType::Parent, None).0;
        let deactivated = AccountState {
            profile_active: Some(false),
            ..account(UserType::Parent, None)
        };
        let err = apply_account_state(claims.clone(), Some(deactivated)).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);

        let missing = AccountState {
            profile_active: None,
            ..account(UserType::Parent, None)
        };
        assert!(apply_account_state(claims, Some(missing)).is_err());
    }

    #[test]
    fn test_stored_admin_level_wins_over_token() {
        let claims = auth_user(UserType::Admin, Some(AdminLevel::SuperAdmin)).0;
        let demoted = apply_account_state(
            claims,
            Some(account(UserType::Admin, Some(AdminLevel::Admin))),
        )
        .unwrap();
        assert_eq!(demoted.admin_level, Some(AdminLevel::Admin));
        assert!(!demoted.is_super_admin());
    }

    #[test]
    fn test_user_id() {
        let user_id = Uuid::new_v4();
        let mut user = auth_user(UserType::Parent, None);
        user.0.sub = user_id.to_string();
        assert_eq!(user.user_id().unwrap(), user_id);

        user.0.sub = "not-a-uuid".to_string();
        assert_eq!(user.user_id().unwrap_err().status.as_u16(), 401);
    }
}
