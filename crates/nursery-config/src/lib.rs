//! # Nursery Config
//!
//! Typed configuration loaded from environment variables. Every loader falls
//! back to a development default when a variable is missing or unparsable.
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`cors`]: allowed browser origins
//! - [`email`]: SMTP delivery and the frontend base URL used in links
//! - [`rate_limit`]: per-IP limits for the auth endpoints
//! - [`account`]: verification and password reset token lifetimes
//! - [`storage`]: where uploaded media lives and how it is addressed
//!
//! ```ignore
//! use nursery_config::{AccountConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let account_config = AccountConfig::from_env();
//! ```

pub mod account;
pub mod cors;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod storage;

pub use account::AccountConfig;
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use storage::StorageConfig;

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v).unwrap_or(default))
        .unwrap_or(default)
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_env_parse_falls_back_on_missing_key() {
        assert_eq!(env_parse("NURSERY_CONFIG_TEST_UNSET_KEY", 42u32), 42);
        assert!(env_flag("NURSERY_CONFIG_TEST_UNSET_FLAG", true));
    }
}
