//! bcrypt hashing.
//!
//! The `_async` variants move the work onto tokio's blocking
//! pool; request handlers should use those. The sync functions remain for
//! the CLI and tests.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Hashes `password` on the blocking thread pool.
///
/// # Errors
///
/// Returns an internal error if hashing fails or the blocking task panics.
pub async fn hash_password_async(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal_error(format!("Password hashing task failed: {}", e)))?
}

/// Checks `password` against `hash` on the blocking thread pool.
///
/// # Errors
///
/// Returns an internal error if `hash` is malformed or the blocking task
/// panics.
pub async fn verify_password_async(password: &str, hash: &str) -> Result<bool, AppError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("Password check task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("Sunflower#2024").unwrap();
        assert_ne!(hashed, "Sunflower#2024");
        assert!(verify_password("Sunflower#2024", &hashed).unwrap());
        assert!(!verify_password("sunflower#2024", &hashed).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_async_variants_agree_with_sync() {
        let hashed = hash_password_async("Sunflower#2024").await.unwrap();
        assert!(verify_password("Sunflower#2024", &hashed).unwrap());
        assert!(verify_password_async("Sunflower#2024", &hashed).await.unwrap());
        assert!(!verify_password_async("Sunflower#2025", &hashed).await.unwrap());
        assert!(verify_password_async("x", "not-a-bcrypt-hash").await.is_err());
    }
}
