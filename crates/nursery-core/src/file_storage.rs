//! File storage for story attachments.
//!
//! Business logic talks to the [`FileStorage`] trait; the server wires in a
//! [`LocalFileStorage`] rooted at `MEDIA_ROOT` whose files are served under
//! `MEDIA_URL`.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("./storage/media"),
//!     "http://localhost:3000/media".to_string(),
//! );
//!
//! let kind = check_attachment("image/png", bytes.len())?;
//! let key = storage.save("stories/3f1c.../a1b2.png", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! storage.delete(&key).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::fs;

pub const MAX_ATTACHMENTS_PER_STORY: i64 = 5;

pub const MAX_IMAGE_BYTES: usize = 3 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_DOCUMENT_BYTES: usize = 3 * 1024 * 1024;

pub const ALLOWED_DOCUMENT_TYPES: [&str; 9] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "application/rtf",
];

type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file. A missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    fn get_url(&self, key: &str) -> Result<String, StorageError>;
}

#[derive(Debug)]
pub enum StorageError {
    InvalidFileSize { kind: AttachmentKind, max_bytes: usize },
    InvalidMimeType { received: String },
    IoError(std::io::Error),
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { kind, max_bytes } => write!(
                f,
                "{} files must be smaller than {}MB",
                kind.label(),
                max_bytes / (1024 * 1024)
            ),
            Self::InvalidMimeType { received } => write!(
                f,
                "File type {} is not allowed. Please upload images, videos, or common document formats.",
                received
            ),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Document,
}

impl AttachmentKind {
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else if ALLOWED_DOCUMENT_TYPES.contains(&mime.as_str()) {
            Some(Self::Document)
        } else {
            None
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Video => MAX_VIDEO_BYTES,
            Self::Document => MAX_DOCUMENT_BYTES,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Document => "Document",
        }
    }
}

/// Classifies an upload and enforces the per-kind size limit.
pub fn check_attachment(content_type: &str, size: usize) -> Result<AttachmentKind, StorageError> {
    let kind =
        AttachmentKind::from_mime(content_type).ok_or_else(|| StorageError::InvalidMimeType {
            received: content_type.to_string(),
        })?;

    if size > kind.max_bytes() {
        return Err(StorageError::InvalidFileSize {
            kind,
            max_bytes: kind.max_bytes(),
        });
    }
    Ok(kind)
}

/// Local filesystem storage. Keys are relative paths below `base_dir`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_max_size(base_dir, base_url, MAX_VIDEO_BYTES)
    }

    pub fn with_max_size(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    kind: AttachmentKind::Video,
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

/// Lowercased extension of an uploaded file name, limited to safe characters.
pub fn safe_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> LocalFileStorage {
        let dir = std::env::temp_dir().join(format!("nursery-media-{}", uuid::Uuid::new_v4()));
        LocalFileStorage::new(dir, "http://localhost:3000/media".to_string())
    }

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(LocalFileStorage::validate_key("stories/abc/photo.png").is_ok());
        assert!(LocalFileStorage::validate_key("stories/abc-123_x.mp4").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal_and_absolute_paths() {
        assert!(LocalFileStorage::validate_key("../../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("\\windows\\system32").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[test]
    fn test_get_url_handles_trailing_slash() {
        let storage = LocalFileStorage::new(
            PathBuf::from("./storage/media"),
            "http://localhost:3000/media/".to_string(),
        );
        assert_eq!(
            storage.get_url("stories/a.png").unwrap(),
            "http://localhost:3000/media/stories/a.png"
        );
    }

    #[test]
    fn test_attachment_kinds() {
        assert_eq!(
            AttachmentKind::from_mime("image/jpeg"),
            Some(AttachmentKind::Image)
        );
        assert_eq!(
            AttachmentKind::from_mime("video/mp4"),
            Some(AttachmentKind::Video)
        );
        assert_eq!(
            AttachmentKind::from_mime("application/pdf"),
            Some(AttachmentKind::Document)
        );
        assert_eq!(
            AttachmentKind::from_mime("text/plain; charset=utf-8"),
            Some(AttachmentKind::Document)
        );
        assert_eq!(AttachmentKind::from_mime("application/zip"), None);
    }

    #[test]
    fn test_check_attachment_limits() {
        assert!(check_attachment("image/png", MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(
            check_attachment("image/png", MAX_IMAGE_BYTES + 1),
            Err(StorageError::InvalidFileSize {
                kind: AttachmentKind::Image,
                ..
            })
        ));
        assert!(check_attachment("video/mp4", 10 * 1024 * 1024).is_ok());
        assert!(check_attachment("video/mp4", MAX_VIDEO_BYTES + 1).is_err());
        assert!(check_attachment("application/pdf", 4 * 1024 * 1024).is_err());
        assert!(matches!(
            check_attachment("application/x-msdownload", 10),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn test_size_error_message() {
        let err = check_attachment("image/png", MAX_IMAGE_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "Image files must be smaller than 3MB");
    }

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("Photo.JPG"), Some("jpg".to_string()));
        assert_eq!(safe_extension("report.final.pdf"), Some("pdf".to_string()));
        assert_eq!(safe_extension("noext"), None);
        assert_eq!(safe_extension("bad.p/g"), None);
    }

    #[tokio::test]
    async fn test_save_and_delete_roundtrip() {
        let storage = temp_storage();
        let key = storage.save("stories/s1/a.txt", b"hello").await.unwrap();
        let path = storage.base_dir().join(&key);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        storage.delete(&key).await.unwrap();
        assert!(!path.exists());
        // deleting again is fine
        storage.delete(&key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(storage.base_dir()).await;
    }
}
