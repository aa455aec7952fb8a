//! Lifetimes of the one-shot tokens emailed to users.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountConfig {
    /// `EMAIL_VERIFICATION_TTL_HOURS`, default 24
    pub email_verification_ttl_hours: i64,
    /// `PASSWORD_RESET_TTL_HOURS`, default 1
    pub password_reset_ttl_hours: i64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            email_verification_ttl_hours: 24,
            password_reset_ttl_hours: 1,
        }
    }
}

impl AccountConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            email_verification_ttl_hours: crate::env_parse(
                "EMAIL_VERIFICATION_TTL_HOURS",
                defaults.email_verification_ttl_hours,
            )
            .max(1),
            password_reset_ttl_hours: crate::env_parse(
                "PASSWORD_RESET_TTL_HOURS",
                defaults.password_reset_ttl_hours,
            )
            .max(1),
        }
    }
}
