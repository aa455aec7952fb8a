use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Directory uploaded files are written to (`MEDIA_ROOT`).
    pub media_root: PathBuf,
    /// Public URL prefix the directory is served under (`MEDIA_URL`).
    pub media_url: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./storage/media")),
            media_url: env::var("MEDIA_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media".to_string()),
        }
    }
}
