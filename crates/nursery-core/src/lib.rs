//! # Nursery Core
//!
//! Foundational types shared by every Nursery crate:
//!
//! - [`errors`]: [`AppError`] and its HTTP response mapping
//! - [`pagination`]: page/limit query parameters and response metadata
//! - [`password`]: bcrypt hashing helpers
//! - [`validation`]: field validators (password strength, phone numbers, names, child birth dates)
//! - [`permissions`]: admin permission keys stored on admin profiles
//! - [`file_storage`]: storage backend for uploaded story attachments
//! - [`serde`]: query-string deserialization helpers

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod serde;
pub mod validation;

pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
