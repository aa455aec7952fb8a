//! # Nursery Auth
//!
//! JWT claims and token utilities for the Nursery API.
//!
//! - [`claims`]: access and refresh token claims
//! - [`jwt`]: token creation and verification
//!
//! Access tokens carry the user type (and admin level for admins) so role
//! checks need no database round trip. Refresh tokens only identify the user
//! and are exchanged at `/api/v1/auth/refresh`.
//!
//! ```ignore
//! use nursery_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user.id, &user.email, user.user_type, None, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.user_type, UserType::Parent);
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{ACCESS_TOKEN, Claims, REFRESH_TOKEN, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
