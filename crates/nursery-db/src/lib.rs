//! # Nursery DB
//!
//! PostgreSQL pool construction and schema migrations.
//!
//! ```ignore
//! let pool = nursery_db::init_db_pool().await?;
//! nursery_db::run_migrations(&pool).await?;
//! ```

use std::env;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connects to `DATABASE_URL` with up to `DATABASE_MAX_CONNECTIONS`
/// connections (default 10).
pub async fn init_db_pool() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// `SELECT 1` round trip used by the health endpoint.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
