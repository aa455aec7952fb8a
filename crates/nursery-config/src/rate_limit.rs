//! Per-IP rate limiting for authentication endpoints.
//!
//! Login, registration and password-reset routes are wrapped in a
//! `tower_governor` layer keyed on the peer address. The limiter is a token
//! bucket: `RATE_LIMIT_AUTH_PER_SECOND` is the replenish interval in seconds
//! and `RATE_LIMIT_AUTH_BURST_SIZE` the bucket size.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_AUTH_PER_SECOND` | `2` |
//! | `RATE_LIMIT_AUTH_BURST_SIZE` | `10` |
//!
//! The peer address comes from `ConnectInfo`, so the server must be started
//! with `into_make_service_with_connect_info::<SocketAddr>()` when enabled.

use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

pub type AuthGovernorConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_per_second: 2,
            auth_burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: crate::env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            auth_per_second: crate::env_parse("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: crate::env_parse("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Governor settings for the auth routes, or `None` when limiting is
    /// switched off or the values are zero.
    #[must_use]
    pub fn auth_governor_config(&self) -> Option<AuthGovernorConfig> {
        if !self.enabled {
            return None;
        }
        GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.auth_per_second, 2);
        assert_eq!(config.auth_burst_size, 10);
    }

    #[test]
    fn test_disabled_has_no_governor() {
        assert!(RateLimitConfig::disabled().auth_governor_config().is_none());
    }

    #[test]
    fn test_enabled_builds_governor() {
        assert!(RateLimitConfig::default().auth_governor_config().is_some());
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let config = RateLimitConfig {
            enabled: true,
            auth_per_second: 1,
            auth_burst_size: 0,
        };
        assert!(config.auth_governor_config().is_none());
    }
}
