use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, Utc};
use nursery_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use nursery_config::JwtConfig;
use nursery_core::{AppError, hash_password_async, verify_password_async};
use nursery_models::{AdminLevel, UserType};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AdminProfile, ChangePasswordRequest, INVALID_CREDENTIALS, INVALID_RESET_TOKEN,
    INVALID_VERIFICATION_TOKEN, LoginRequest, LoginResponse, ParentProfile, ProfileResponse,
    RefreshTokenResponse, RegisterParentDto, ResetPasswordRequest, TeacherProfile,
    UpdateProfileDto, UserResponse, UserRow,
};
use crate::metrics::{track_login_failure, track_login_success, track_registration};
use crate::utils::db::{begin, commit, unique_violation};

pub const USER_COLUMNS: &str = "id, email, password, first_name, last_name, phone_number, \
     user_type, is_active, is_email_verified, email_verification_token, \
     email_verification_sent_at, password_reset_token, password_reset_sent_at, \
     must_change_password, is_superuser, last_login, created_at, updated_at";

/// `true` when a token sent at `sent_at` is older than `ttl_hours` at `now`.
pub fn token_expired(sent_at: Option<DateTime<Utc>>, now: DateTime<Utc>, ttl_hours: i64) -> bool {
    match sent_at {
        Some(sent_at) => now - sent_at > Duration::hours(ttl_hours),
        None => true,
    }
}

/// Account-level login rules, checked after the password matched.
pub fn check_login_eligibility(
    user: &UserRow,
    expected_type: Option<UserType>,
) -> Result<(), AppError> {
    if user.user_type == UserType::Parent && !user.is_email_verified {
        return Err(AppError::forbidden(
            "Please verify your email before logging in.",
        ));
    }
    if !user.is_active {
        return Err(AppError::forbidden("Your account is not active."));
    }
    if let Some(expected) = expected_type
        && expected != user.user_type
    {
        return Err(AppError::bad_request(anyhow!(
            "This account is registered as a {}, not a {}.",
            user.user_type,
            expected
        )));
    }
    Ok(())
}

fn parse_token(raw: &str, message: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(anyhow!(message)))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db))]
    pub async fn find_user_by_email(db: &PgPool, email: &str) -> Result<Option<UserRow>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by email")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn find_user_by_id(db: &PgPool, user_id: Uuid) -> Result<UserRow, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch user")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    pub async fn email_taken(db: &PgPool, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(db)
            .await
            .context("Failed to check email")
            .map_err(AppError::database)
    }

    /// Creates an inactive, unverified parent and returns it with the
    /// verification token to email.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn register_parent(
        db: &PgPool,
        dto: RegisterParentDto,
    ) -> Result<(UserRow, Uuid), AppError> {
        if Self::email_taken(db, &dto.email).await? {
            return Err(AppError::field(
                "email",
                "A user with this email already exists.",
            ));
        }

        let password_hash = hash_password_async(&dto.password).await?;
        let token = Uuid::new_v4();

        let mut tx = begin(db).await?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"INSERT INTO users (email, password, first_name, last_name, phone_number, user_type,
                                  is_active, is_email_verified, email_verification_token,
                                  email_verification_sent_at)
               VALUES ($1, $2, $3, $4, $5, 'parent', false, false, $6, NOW())
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(normalize_email(&dto.email))
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.phone_number)
        .bind(token)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation(
                e,
                "email",
                "A user with this email already exists.",
                "Failed to create user",
            )
        })?;

        sqlx::query(
            r#"INSERT INTO parents (user_id, occupation, emergency_contact, address)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(user.id)
        .bind(&dto.occupation)
        .bind(&dto.emergency_contact)
        .bind(&dto.address)
        .execute(&mut *tx)
        .await
        .context("Failed to create parent profile")
        .map_err(AppError::database)?;

        commit(tx).await?;

        track_registration(UserType::Parent.as_str());
        Ok((user, token))
    }

    /// Whether the role profile of `user` exists and is active, plus the
    /// admin level for admins.
    async fn profile_status(
        db: &PgPool,
        user: &UserRow,
    ) -> Result<(bool, Option<AdminLevel>), AppError> {
        let status = match user.user_type {
            UserType::Teacher => sqlx::query_scalar::<_, bool>(
                "SELECT is_active FROM teachers WHERE user_id = $1",
            )
            .bind(user.id)
            .fetch_optional(db)
            .await
            .map(|active| (active.unwrap_or(false), None)),
            UserType::Parent => sqlx::query_scalar::<_, bool>(
                "SELECT is_active FROM parents WHERE user_id = $1",
            )
            .bind(user.id)
            .fetch_optional(db)
            .await
            .map(|active| (active.unwrap_or(false), None)),
            UserType::Admin => sqlx::query_as::<_, (bool, AdminLevel)>(
                "SELECT is_active, admin_level FROM admins WHERE user_id = $1",
            )
            .bind(user.id)
            .fetch_optional(db)
            .await
            .map(|row| match row {
                Some((active, level)) => (active, Some(level)),
                None => (false, None),
            }),
        };

        status
            .context("Failed to fetch role profile")
            .map_err(AppError::database)
    }

    /// Checks credentials and account state, then issues an access and a
    /// refresh token.
    ///
    /// # Arguments
    ///
    /// * `dto` - Email, password and optionally the expected user type
    /// * `jwt_config` - Secret and token lifetimes
    ///
    /// # Errors
    ///
    /// 401 for an unknown email or a wrong password. 403 for an unverified
    /// parent or an inactive account or profile. 400 when `user_type` does not
    /// match the account.
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let Some(user) = Self::find_user_by_email(db, &dto.email).await? else {
            track_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password_async(&dto.password, &user.password).await? {
            track_login_failure("invalid_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if let Err(err) = check_login_eligibility(&user, dto.user_type) {
            track_login_failure("not_eligible");
            return Err(err);
        }

        let (profile_active, admin_level) = Self::profile_status(db, &user).await?;
        if !profile_active {
            track_login_failure("profile_inactive");
            return Err(AppError::forbidden(format!(
                "Your {} profile is not active.",
                user.user_type
            )));
        }

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .fetch_one(db)
        .await
        .context("Failed to update last login")
        .map_err(AppError::database)?;

        let access_token = create_access_token(
            user.id,
            &user.email,
            user.user_type,
            admin_level,
            jwt_config,
        )?;
        let refresh_token = create_refresh_token(user.id, &user.email, jwt_config)?;

        track_login_success(user.user_type.as_str());

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            must_change_password: user.must_change_password,
            user: UserResponse::from(user),
        })
    }

    #[instrument(skip(db, jwt_config, refresh_token))]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshTokenResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = claims.user_id()?;

        let user = Self::find_user_by_id(db, user_id)
            .await
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        check_login_eligibility(&user, None)
            .map_err(|_| AppError::unauthorized("User is no longer able to log in"))?;

        let (profile_active, admin_level) = Self::profile_status(db, &user).await?;
        if !profile_active {
            return Err(AppError::unauthorized("User is no longer able to log in"));
        }

        let access_token = create_access_token(
            user.id,
            &user.email,
            user.user_type,
            admin_level,
            jwt_config,
        )?;

        Ok(RefreshTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
        })
    }

    /// Marks the owner of `token` verified and activates parents.
    #[instrument(skip(db, token))]
    pub async fn verify_email(db: &PgPool, token: &str, ttl_hours: i64) -> Result<UserRow, AppError> {
        let token = parse_token(token, INVALID_VERIFICATION_TOKEN)?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email_verification_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by verification token")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::bad_request(anyhow!(INVALID_VERIFICATION_TOKEN)))?;

        if token_expired(user.email_verification_sent_at, Utc::now(), ttl_hours) {
            return Err(AppError::bad_request(anyhow!(INVALID_VERIFICATION_TOKEN)));
        }

        sqlx::query_as::<_, UserRow>(&format!(
            r#"UPDATE users
               SET is_email_verified = true,
                   is_active = CASE WHEN user_type = 'parent' THEN true ELSE is_active END,
                   email_verification_token = NULL,
                   email_verification_sent_at = NULL,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user.id)
        .fetch_one(db)
        .await
        .context("Failed to mark email verified")
        .map_err(AppError::database)
    }

    /// Issues a fresh verification token for an unverified user.
    #[instrument(skip(db))]
    pub async fn resend_verification(db: &PgPool, email: &str) -> Result<(UserRow, Uuid), AppError> {
        let user = Self::find_user_by_email(db, email)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("No account found with this email.")))?;

        if user.is_email_verified {
            return Err(AppError::bad_request(anyhow!("Email is already verified.")));
        }

        let token = Uuid::new_v4();
        sqlx::query(
            r#"UPDATE users
               SET email_verification_token = $2, email_verification_sent_at = NOW(), updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(token)
        .execute(db)
        .await
        .context("Failed to store verification token")
        .map_err(AppError::database)?;

        Ok((user, token))
    }

    /// Sets a reset token for an active user. `None` for unknown or
    /// inactive accounts, which callers must not reveal.
    #[instrument(skip(db))]
    pub async fn forgot_password(db: &PgPool, email: &str) -> Result<Option<(UserRow, Uuid)>, AppError> {
        let Some(user) = Self::find_user_by_email(db, email).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let token = Uuid::new_v4();
        sqlx::query(
            r#"UPDATE users
               SET password_reset_token = $2, password_reset_sent_at = NOW(), updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(token)
        .execute(db)
        .await
        .context("Failed to store reset token")
        .map_err(AppError::database)?;

        Ok(Some((user, token)))
    }

    #[instrument(skip(db, token))]
    pub async fn validate_reset_token(
        db: &PgPool,
        token: &str,
        ttl_hours: i64,
    ) -> Result<UserRow, AppError> {
        let token = parse_token(token, INVALID_RESET_TOKEN)?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE password_reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by reset token")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::bad_request(anyhow!(INVALID_RESET_TOKEN)))?;

        if token_expired(user.password_reset_sent_at, Utc::now(), ttl_hours) {
            return Err(AppError::bad_request(anyhow!(INVALID_RESET_TOKEN)));
        }

        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn reset_password(
        db: &PgPool,
        dto: ResetPasswordRequest,
        ttl_hours: i64,
    ) -> Result<UserRow, AppError> {
        let user = Self::validate_reset_token(db, &dto.token, ttl_hours).await?;
        let password_hash = hash_password_async(&dto.new_password).await?;

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE users
               SET password = $2,
                   password_reset_token = NULL,
                   password_reset_sent_at = NULL,
                   must_change_password = false,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .context("Failed to reset password")
        .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE teachers SET password_change_required = false, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear teacher password flag")
        .map_err(AppError::database)?;

        commit(tx).await?;

        Ok(user)
    }

    /// Replaces the password of `user_id` after checking the current one.
    ///
    /// # Errors
    ///
    /// Field errors on `current_password` or `new_password` when the current
    /// password is wrong or the new one repeats it.
    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let user = Self::find_user_by_id(db, user_id).await?;

        if !verify_password_async(&dto.current_password, &user.password).await? {
            return Err(AppError::field(
                "current_password",
                "Current password is incorrect.",
            ));
        }
        if dto.new_password == dto.current_password {
            return Err(AppError::field(
                "new_password",
                "New password must be different from the current password.",
            ));
        }

        let password_hash = hash_password_async(&dto.new_password).await?;

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE users
               SET password = $2, must_change_password = false, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user_id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .context("Failed to change password")
        .map_err(AppError::database)?;

        if user.user_type == UserType::Teacher {
            sqlx::query(
                "UPDATE teachers SET password_change_required = false, updated_at = NOW() WHERE user_id = $1",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear teacher password flag")
            .map_err(AppError::database)?;
        }

        commit(tx).await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, user_id: Uuid) -> Result<ProfileResponse, AppError> {
        let user = Self::find_user_by_id(db, user_id).await?;

        let mut profile = ProfileResponse {
            user: UserResponse::from(user.clone()),
            teacher_profile: None,
            parent_profile: None,
            admin_profile: None,
        };

        match user.user_type {
            UserType::Teacher => {
                profile.teacher_profile = sqlx::query_as::<_, TeacherProfile>(
                    r#"SELECT id, user_id, employee_id, subjects, qualification, experience_years,
                              hire_date, is_active, password_change_required, created_at, updated_at
                       FROM teachers WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch teacher profile")
                .map_err(AppError::database)?;
            }
            UserType::Parent => {
                profile.parent_profile = sqlx::query_as::<_, ParentProfile>(
                    r#"SELECT id, user_id, occupation, emergency_contact, address, is_active,
                              created_at, updated_at
                       FROM parents WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch parent profile")
                .map_err(AppError::database)?;
            }
            UserType::Admin => {
                profile.admin_profile = sqlx::query_as::<_, AdminProfile>(
                    r#"SELECT id, user_id, admin_level, permissions, is_active, created_at, updated_at
                       FROM admins WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch admin profile")
                .map_err(AppError::database)?;
            }
        }

        Ok(profile)
    }

    /// Name and phone for everyone; subjects and qualification for
    /// teachers; occupation, emergency contact and address for parents.
    /// Fields that do not apply to the caller's role are ignored.
    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<ProfileResponse, AppError> {
        let user = Self::find_user_by_id(db, user_id).await?;

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name = COALESCE($3, last_name),
                   phone_number = COALESCE($4, phone_number),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user_id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.phone_number)
        .execute(&mut *tx)
        .await
        .context("Failed to update user")
        .map_err(AppError::database)?;

        match user.user_type {
            UserType::Teacher => {
                sqlx::query(
                    r#"UPDATE teachers
                       SET subjects = COALESCE($2, subjects),
                           qualification = COALESCE($3, qualification),
                           updated_at = NOW()
                       WHERE user_id = $1"#,
                )
                .bind(user_id)
                .bind(&dto.subjects)
                .bind(&dto.qualification)
                .execute(&mut *tx)
                .await
                .context("Failed to update teacher profile")
                .map_err(AppError::database)?;
            }
            UserType::Parent => {
                sqlx::query(
                    r#"UPDATE parents
                       SET occupation = COALESCE($2, occupation),
                           emergency_contact = COALESCE($3, emergency_contact),
                           address = COALESCE($4, address),
                           updated_at = NOW()
                       WHERE user_id = $1"#,
                )
                .bind(user_id)
                .bind(&dto.occupation)
                .bind(&dto.emergency_contact)
                .bind(&dto.address)
                .execute(&mut *tx)
                .await
                .context("Failed to update parent profile")
                .map_err(AppError::database)?;
            }
            UserType::Admin => {}
        }

        commit(tx).await?;

        Self::get_profile(db, user_id).await
    }

    pub async fn health(db: &PgPool) -> Result<(), AppError> {
        nursery_db::ping(db)
            .await
            .map_err(|_| AppError::service_unavailable("Database unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType, is_active: bool, is_email_verified: bool) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            password: String::new(),
            first_name: "Anura".into(),
            last_name: "Bandara".into(),
            phone_number: None,
            user_type,
            is_active,
            is_email_verified,
            email_verification_token: None,
            email_verification_sent_at: None,
            password_reset_token: None,
            password_reset_sent_at: None,
            must_change_password: false,
            is_superuser: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unverified_parent_is_told_to_verify() {
        let err = check_login_eligibility(&user(UserType::Parent, false, false), None).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.message(), "Please verify your email before logging in.");
    }

    #[test]
    fn test_inactive_account_rejected() {
        let err = check_login_eligibility(&user(UserType::Teacher, false, true), None).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.message(), "Your account is not active.");
    }

    #[test]
    fn test_user_type_mismatch_is_bad_request() {
        let err = check_login_eligibility(
            &user(UserType::Parent, true, true),
            Some(UserType::Teacher),
        )
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.message().contains("registered as a parent"));

        assert!(
            check_login_eligibility(&user(UserType::Parent, true, true), Some(UserType::Parent))
                .is_ok()
        );
    }

    #[test]
    fn test_unverified_teacher_may_log_in() {
        assert!(check_login_eligibility(&user(UserType::Teacher, true, false), None).is_ok());
    }

    #[test]
    fn test_token_expiry_window() {
        let now = Utc::now();
        assert!(!token_expired(Some(now - Duration::hours(23)), now, 24));
        assert!(token_expired(Some(now - Duration::hours(25)), now, 24));
        assert!(!token_expired(Some(now - Duration::minutes(59)), now, 1));
        assert!(token_expired(Some(now - Duration::minutes(61)), now, 1));
        assert!(token_expired(None, now, 24));
    }

    #[test]
    fn test_parse_token_rejects_garbage() {
        let err = parse_token("not-a-token", INVALID_VERIFICATION_TOKEN).unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.message(), INVALID_VERIFICATION_TOKEN);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Parent@Example.COM "), "parent@example.com");
    }
}
