use anyhow::{Context, anyhow};
use nursery_core::{AppError, PaginationMeta, hash_password_async, permissions};
use nursery_models::AdminLevel;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    ADMIN_SELECT, AdminResetPasswordDto, AdminWithUser, CreateAdminDto, PaginatedAdminsResponse,
    StaffFilterParams, UpdateAdminDto, resolve_permissions,
};
use crate::metrics::track_registration;
use crate::modules::auth::service::{AuthService, normalize_email};
use crate::utils::db::{begin, commit, unique_violation};

const EMAIL_TAKEN: &str = "A user with this email already exists.";

fn check_permissions(map: Option<&serde_json::Value>) -> Result<(), AppError> {
    if let Some(map) = map
        && let Some(invalid) = permissions::find_invalid(map)
    {
        return Err(AppError::field(
            "permissions",
            format!("Unknown or non-boolean permission: {}", invalid),
        ));
    }
    Ok(())
}

pub struct AdminService;

impl AdminService {
    #[instrument(skip(db))]
    pub async fn list_admins(
        db: &PgPool,
        filters: StaffFilterParams,
    ) -> Result<PaginatedAdminsResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (u.first_name ILIKE ${p} OR u.last_name ILIKE ${p} OR u.email ILIKE ${p})",
                p = param_count
            ));
            search = Some(format!("%{}%", term));
        }
        if filters.is_active.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND a.is_active = ${}", param_count));
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM admins a JOIN users u ON u.id = a.user_id{}",
            where_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(s) = &search {
            count_query = count_query.bind(s);
        }
        if let Some(active) = filters.is_active {
            count_query = count_query.bind(active);
        }
        let total = count_query
            .fetch_one(db)
            .await
            .context("Failed to count admins")
            .map_err(AppError::database)?;

        let data_sql = format!(
            "{}{} ORDER BY a.created_at DESC LIMIT {} OFFSET {}",
            ADMIN_SELECT,
            where_clause,
            filters.pagination.limit(),
            filters.pagination.offset()
        );
        let mut data_query = sqlx::query_as::<_, AdminWithUser>(&data_sql);
        if let Some(s) = &search {
            data_query = data_query.bind(s);
        }
        if let Some(active) = filters.is_active {
            data_query = data_query.bind(active);
        }
        let data = data_query
            .fetch_all(db)
            .await
            .context("Failed to fetch admins")
            .map_err(AppError::database)?;

        Ok(PaginatedAdminsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_admin(db: &PgPool, dto: CreateAdminDto) -> Result<AdminWithUser, AppError> {
        check_permissions(dto.permissions.as_ref())?;
        if AuthService::email_taken(db, &dto.email).await? {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }

        let level = dto.admin_level.unwrap_or(AdminLevel::Admin);
        let perms = resolve_permissions(level, dto.permissions);
        let password_hash = hash_password_async(&dto.password).await?;

        let mut tx = begin(db).await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (email, password, first_name, last_name, phone_number, user_type,
                                  is_active, is_email_verified, must_change_password, is_superuser)
               VALUES ($1, $2, $3, $4, $5, 'admin', true, true, true, $6)
               RETURNING id"#,
        )
        .bind(normalize_email(&dto.email))
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.phone_number)
        .bind(level == AdminLevel::SuperAdmin)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "email", EMAIL_TAKEN, "Failed to create admin user"))?;

        let admin_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO admins (user_id, admin_level, permissions)
               VALUES ($1, $2, $3)
               RETURNING id"#,
        )
        .bind(user_id)
        .bind(level)
        .bind(&perms)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create admin profile")
        .map_err(AppError::database)?;

        commit(tx).await?;
        track_registration("admin");

        Self::get_admin(db, admin_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_admin(db: &PgPool, id: Uuid) -> Result<AdminWithUser, AppError> {
        sqlx::query_as::<_, AdminWithUser>(&format!("{} WHERE a.id = $1", ADMIN_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch admin")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Admin not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_admin(
        db: &PgPool,
        id: Uuid,
        caller_user_id: Uuid,
        dto: UpdateAdminDto,
    ) -> Result<AdminWithUser, AppError> {
        check_permissions(dto.permissions.as_ref())?;
        let existing = Self::get_admin(db, id).await?;

        if existing.user_id == caller_user_id && dto.is_active == Some(false) {
            return Err(AppError::bad_request(anyhow!(
                "You cannot deactivate your own account."
            )));
        }

        let new_email = dto
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|email| *email != existing.email);
        if let Some(email) = &new_email
            && AuthService::email_taken(db, email).await?
        {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }

        let permissions = match (dto.admin_level, dto.permissions) {
            (Some(level), explicit) if level != existing.admin_level || explicit.is_some() => {
                Some(resolve_permissions(level, explicit))
            }
            (None, Some(explicit)) => Some(resolve_permissions(existing.admin_level, Some(explicit))),
            _ => None,
        };

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name = COALESCE($3, last_name),
                   phone_number = COALESCE($4, phone_number),
                   email = COALESCE($5, email),
                   is_email_verified = CASE WHEN $5::text IS NULL THEN is_email_verified ELSE false END,
                   is_active = COALESCE($6, is_active),
                   is_superuser = COALESCE($7, is_superuser),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(existing.user_id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.phone_number)
        .bind(&new_email)
        .bind(dto.is_active)
        .bind(dto.admin_level.map(|level| level == AdminLevel::SuperAdmin))
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "email", EMAIL_TAKEN, "Failed to update admin user"))?;

        sqlx::query(
            r#"UPDATE admins
               SET admin_level = COALESCE($2, admin_level),
                   permissions = COALESCE($3, permissions),
                   is_active = COALESCE($4, is_active),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.admin_level)
        .bind(&permissions)
        .bind(dto.is_active)
        .execute(&mut *tx)
        .await
        .context("Failed to update admin profile")
        .map_err(AppError::database)?;

        commit(tx).await?;

        Self::get_admin(db, id).await
    }

    /// Soft delete of another admin's profile and account.
    #[instrument(skip(db))]
    pub async fn delete_admin(db: &PgPool, id: Uuid, caller_user_id: Uuid) -> Result<(), AppError> {
        let admin = Self::get_admin(db, id).await?;
        if admin.user_id == caller_user_id {
            return Err(AppError::bad_request(anyhow!(
                "You cannot deactivate your own account."
            )));
        }

        let mut tx = begin(db).await?;

        sqlx::query("UPDATE admins SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate admin")
            .map_err(AppError::database)?;

        sqlx::query("UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(admin.user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate admin user")
            .map_err(AppError::database)?;

        commit(tx).await
    }

    #[instrument(skip(db, dto))]
    pub async fn reset_password(
        db: &PgPool,
        id: Uuid,
        dto: AdminResetPasswordDto,
    ) -> Result<AdminWithUser, AppError> {
        let admin = Self::get_admin(db, id).await?;
        let password_hash = hash_password_async(&dto.new_password).await?;

        sqlx::query(
            "UPDATE users SET password = $2, must_change_password = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(admin.user_id)
        .bind(&password_hash)
        .execute(db)
        .await
        .context("Failed to reset admin password")
        .map_err(AppError::database)?;

        Ok(admin)
    }
}
