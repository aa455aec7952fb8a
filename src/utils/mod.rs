pub mod auth_helpers;
pub mod codes;
pub mod db;
pub mod email;
