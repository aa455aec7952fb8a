use std::env;

const DEV_SECRET: &str = "nursery-dev-secret-change-in-production";

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    pub access_token_expiry: i64,
    /// Seconds
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string()),
            access_token_expiry: crate::env_parse("JWT_ACCESS_EXPIRY", 3600),
            refresh_token_expiry: crate::env_parse("JWT_REFRESH_EXPIRY", 604_800),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_SECRET
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604_800,
        }
    }
}
