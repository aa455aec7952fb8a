//! # Nursery API
//!
//! REST backend for running a nursery, built on Axum and PostgreSQL.
//!
//! ## Overview
//!
//! - **Authentication**: parent self-registration with email verification,
//!   JWT access/refresh tokens for parents, teachers and admins
//! - **Administration**: teachers, admins, classes, students, enrollment and
//!   teacher assignment, enrollment requests from parents
//! - **Teacher portal**: assigned classes, daily attendance, learning sessions
//! - **Parent portal**: linked children, monthly attendance and learning hours
//! - **Stories**: a newsfeed with attachments, likes and comments
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/      # AuthUser extractor and role gating
//! ├── modules/         # Feature modules
//! │   ├── auth/
//! │   ├── teachers/    # admin
//! │   ├── admins/      # super admin
//! │   ├── classes/     # admin
//! │   ├── students/    # admin
//! │   ├── assignments/ # admin
//! │   ├── teacher_portal/
//! │   ├── attendance/  # teacher
//! │   ├── learning/    # admin catalog, teacher sessions
//! │   ├── children/    # parent
//! │   └── stories/
//! └── utils/           # email, code generation, ownership lookups
//! ```
//!
//! Shared pieces live in workspace crates: `nursery-core` (errors,
//! pagination, validation, file storage), `nursery-config`, `nursery-db`,
//! `nursery-auth` (JWT and bcrypt) and `nursery-models`.
//!
//! ## Route groups
//!
//! | Prefix | Who |
//! |--------|-----|
//! | `/api/v1/auth` | public, plus authenticated profile routes |
//! | `/api/v1/admin` | admins; `/admin/admins` super admins only |
//! | `/api/v1/teacher` | teachers |
//! | `/api/v1/parent` | parents |
//! | `/api/v1/stories` | any authenticated user |
//!
//! API documentation is served at `/swagger-ui` and `/scalar`.

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use nursery_auth;
pub use nursery_config;
pub use nursery_core;
pub use nursery_db;
pub use nursery_models;
