use std::env;

#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// When false, messages are logged instead of delivered.
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    /// Base URL for links in emails (verification, password reset).
    pub frontend_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: crate::env_flag("SMTP_ENABLED", false),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: crate::env_parse("SMTP_PORT", 1025),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@nursery.local".to_string()),
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "Little Steps Nursery".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@nursery.local".to_string(),
            from_name: "Little Steps Nursery".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}
