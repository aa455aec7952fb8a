//! # Nursery CLI
//!
//! Administrative commands that have no HTTP surface, plus development
//! seeding.
//!
//! ```ignore
//! use nursery_cli::seeder::{SeedConfig, seed_all};
//!
//! seed_all(&pool, SeedConfig::default()).await?;
//! ```

pub mod accounts;
pub mod seeder;
