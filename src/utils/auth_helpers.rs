//! Profile lookups and class-access checks shared by the portal services.

use anyhow::Context;
use nursery_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Active teacher profile id for a user, 403 otherwise.
pub async fn teacher_id_for_user(db: &PgPool, user_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM teachers WHERE user_id = $1 AND is_active = true",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("Failed to fetch teacher profile")
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::forbidden("Teacher profile not found or inactive."))
}

/// Active parent profile id for a user, 403 otherwise.
pub async fn parent_id_for_user(db: &PgPool, user_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM parents WHERE user_id = $1 AND is_active = true",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("Failed to fetch parent profile")
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::forbidden("Parent profile not found or inactive."))
}

/// # Errors
///
/// Returns `AppError::not_found` when `class_id` does not exist.
pub async fn ensure_class_exists(db: &PgPool, class_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
        .bind(class_id)
        .fetch_one(db)
        .await
        .context("Failed to check class")
        .map_err(AppError::database)?;

    if !exists {
        return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
    }
    Ok(())
}

pub async fn is_teacher_assigned(
    db: &PgPool,
    teacher_id: Uuid,
    class_id: Uuid,
) -> Result<bool, AppError> {
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(
               SELECT 1 FROM class_teacher_assignments
               WHERE teacher_id = $1 AND class_id = $2 AND is_active = true
           )"#,
    )
    .bind(teacher_id)
    .bind(class_id)
    .fetch_one(db)
    .await
    .context("Failed to check teacher assignment")
    .map_err(AppError::database)
}

/// 404 for an unknown class, 403 when the teacher is not actively assigned.
pub async fn ensure_teacher_assigned(
    db: &PgPool,
    teacher_id: Uuid,
    class_id: Uuid,
) -> Result<(), AppError> {
    ensure_class_exists(db, class_id).await?;
    if !is_teacher_assigned(db, teacher_id, class_id).await? {
        return Err(AppError::forbidden("You are not assigned to this class."));
    }
    Ok(())
}
