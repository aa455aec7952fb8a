//! Token creation and verification.
//!
//! Both token kinds are HS256-signed with `JwtConfig::secret`. A
//! `token_type` claim stops a refresh token from being presented as an
//! access token and vice versa.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use nursery_config::JwtConfig;
use nursery_core::AppError;
use nursery_models::{AdminLevel, UserType};

use crate::claims::{ACCESS_TOKEN, Claims, REFRESH_TOKEN, RefreshTokenClaims};

fn timestamps(lifetime_secs: i64) -> (usize, usize) {
    let now = Utc::now().timestamp();
    let exp = (now + lifetime_secs).max(0);
    (now as usize, exp as usize)
}

/// Creates an access token for `user_id`.
///
/// # Errors
///
/// Returns an internal error if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    user_type: UserType,
    admin_level: Option<AdminLevel>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (iat, exp) = timestamps(jwt_config.access_token_expiry);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        user_type,
        admin_level,
        token_type: ACCESS_TOKEN.to_string(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies signature, expiry and token type of an access token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    if claims.token_type != ACCESS_TOKEN {
        return Err(AppError::unauthorized("Invalid or expired token"));
    }
    Ok(claims)
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let (iat, exp) = timestamps(jwt_config.refresh_token_expiry);

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_type: REFRESH_TOKEN.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))?;

    if claims.token_type != REFRESH_TOKEN {
        return Err(AppError::unauthorized("Invalid or expired refresh token"));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(
            user_id,
            "teacher@example.com",
            UserType::Teacher,
            None,
            &config,
        )
        .unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "teacher@example.com");
        assert_eq!(claims.user_type, UserType::Teacher);
        assert!(claims.admin_level.is_none());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_admin_level_is_embedded() {
        let config = test_config();
        let token = create_access_token(
            Uuid::new_v4(),
            "root@example.com",
            UserType::Admin,
            Some(AdminLevel::SuperAdmin),
            &config,
        )
        .unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert!(claims.is_super_admin());
    }

    #[test]
    fn test_verify_token_invalid() {
        assert!(verify_token("invalid-token", &test_config()).is_err());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = test_config();
        let token =
            create_access_token(Uuid::new_v4(), "a@example.com", UserType::Parent, None, &config)
                .unwrap();

        let wrong = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            ..test_config()
        };
        assert!(verify_token(&token, &wrong).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig {
            access_token_expiry: -300,
            ..test_config()
        };
        let token =
            create_access_token(Uuid::new_v4(), "a@example.com", UserType::Parent, None, &config)
                .unwrap();
        let err = verify_token(&token, &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "a@example.com", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.token_type, REFRESH_TOKEN);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let refresh = create_refresh_token(user_id, "a@example.com", &config).unwrap();
        assert!(verify_token(&refresh, &config).is_err());

        let access =
            create_access_token(user_id, "a@example.com", UserType::Parent, None, &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }

    #[test]
    fn test_refresh_outlives_access() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let access =
            create_access_token(user_id, "a@example.com", UserType::Parent, None, &config).unwrap();
        let refresh = create_refresh_token(user_id, "a@example.com", &config).unwrap();

        let access_claims = verify_token(&access, &config).unwrap();
        let refresh_claims = verify_refresh_token(&refresh, &config).unwrap();
        assert!(refresh_claims.exp > access_claims.exp);
    }
}
