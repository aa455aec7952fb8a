//! Feature modules. Each one is split into `controller` (axum handlers with
//! OpenAPI annotations), `service` (database work), `model` (DTOs and SQL
//! fragments) and `router`.

pub mod admins;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod children;
pub mod classes;
pub mod learning;
pub mod stories;
pub mod students;
pub mod teacher_portal;
pub mod teachers;
