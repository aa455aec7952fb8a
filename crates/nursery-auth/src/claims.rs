//! JWT claim structures.

use nursery_core::AppError;
use nursery_models::{AdminLevel, UserType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub user_type: UserType,
    /// Present for admins only
    pub admin_level: Option<AdminLevel>,
    pub token_type: String,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh token claims. `jti` keeps two tokens minted in the same second
/// distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub token_type: String,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

fn parse_subject(sub: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(sub).map_err(|_| AppError::unauthorized("Invalid user ID in token"))
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }

    pub fn is_super_admin(&self) -> bool {
        self.user_type == UserType::Admin && self.admin_level == Some(AdminLevel::SuperAdmin)
    }
}

impl RefreshTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        parse_subject(&self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize_user_type() {
        let claims = Claims {
            sub: Uuid::nil().to_string(),
            email: "amaya@example.com".to_string(),
            user_type: UserType::Admin,
            admin_level: Some(AdminLevel::SuperAdmin),
            token_type: ACCESS_TOKEN.to_string(),
            exp: 1_900_000_000,
            iat: 1_899_996_400,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""user_type":"admin""#));
        assert!(json.contains(r#""admin_level":"super_admin""#));
        assert!(claims.is_super_admin());
    }

    #[test]
    fn test_claims_deserialize_parent() {
        let json = r#"{"sub":"6f1c1a2b-8d3e-4f5a-9b6c-7d8e9f0a1b2c","email":"p@example.com","user_type":"parent","admin_level":null,"token_type":"access","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.user_type, UserType::Parent);
        assert!(!claims.is_super_admin());
        assert_eq!(
            claims.user_id().unwrap().to_string(),
            "6f1c1a2b-8d3e-4f5a-9b6c-7d8e9f0a1b2c"
        );
    }

    #[test]
    fn test_user_id_rejects_garbage_subject() {
        let claims = RefreshTokenClaims {
            sub: "not-a-uuid".to_string(),
            email: "x@example.com".to_string(),
            token_type: REFRESH_TOKEN.to_string(),
            jti: "j".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
