use std::env;

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Reads the comma-separated `CORS_ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        let raw = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string());
        Self {
            allowed_origins: parse_origins(&raw),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: parse_origins(DEFAULT_ORIGINS),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://a.test/ ,,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_default_has_local_frontends() {
        let config = CorsConfig::default();
        assert!(config
            .allowed_origins
            .contains(&"http://localhost:5173".to_string()));
    }
}
