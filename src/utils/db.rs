use anyhow::{Context, anyhow};
use nursery_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};

pub async fn begin(db: &PgPool) -> Result<Transaction<'static, Postgres>, AppError> {
    db.begin()
        .await
        .context("Failed to begin transaction")
        .map_err(AppError::database)
}

pub async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), AppError> {
    tx.commit()
        .await
        .context("Failed to commit transaction")
        .map_err(AppError::database)
}

/// Maps a unique violation to a 400 on `field`, anything else to a 500
/// with `context`.
pub fn unique_violation(e: sqlx::Error, field: &str, message: &str, context: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::field(field, message);
    }
    AppError::database(anyhow!(e).context(context))
}
