//! Authentication extractors and role gating.
//!
//! - [`auth`]: the [`auth::AuthUser`] extractor and per-role extractors
//! - [`role`]: middleware functions for router groups and check helpers
//!
//! Clients send `Authorization: Bearer <access token>`. Role middleware
//! stores the verified [`auth::AuthUser`] in the request extensions so
//! handlers extracting it again do not re-verify the token.

pub mod auth;
pub mod role;
