use anyhow::{Context, anyhow};
use chrono::Utc;
use nursery_core::{AppError, PaginationMeta, hash_password_async};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AdminResetPasswordDto, CreateTeacherDto, PaginatedTeachersResponse, StaffFilterParams,
    TEACHER_SELECT, TeacherClassInfo, TeacherDetail, TeacherWithUser, UpdateTeacherDto,
};
use crate::metrics::track_registration;
use crate::modules::auth::service::{AuthService, normalize_email};
use crate::utils::codes::next_employee_id;
use crate::utils::db::{begin, commit, unique_violation};

const EMAIL_TAKEN: &str = "A user with this email already exists.";
const EMPLOYEE_ID_TAKEN: &str = "A teacher with this employee ID already exists.";

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db))]
    pub async fn list_teachers(
        db: &PgPool,
        filters: StaffFilterParams,
    ) -> Result<PaginatedTeachersResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let mut is_active: Option<bool> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (u.first_name ILIKE ${p} OR u.last_name ILIKE ${p} OR u.email ILIKE ${p} \
                 OR t.employee_id ILIKE ${p} OR (u.first_name || ' ' || u.last_name) ILIKE ${p})",
                p = param_count
            ));
            search = Some(format!("%{}%", term));
        }
        if let Some(active) = filters.is_active {
            param_count += 1;
            where_clause.push_str(&format!(" AND t.is_active = ${}", param_count));
            is_active = Some(active);
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM teachers t JOIN users u ON u.id = t.user_id{}",
            where_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(s) = &search {
            count_query = count_query.bind(s);
        }
        if let Some(a) = is_active {
            count_query = count_query.bind(a);
        }
        let total = count_query
            .fetch_one(db)
            .await
            .context("Failed to count teachers")
            .map_err(AppError::database)?;

        let data_sql = format!(
            "{}{} ORDER BY u.last_name, u.first_name LIMIT {} OFFSET {}",
            TEACHER_SELECT,
            where_clause,
            filters.pagination.limit(),
            filters.pagination.offset()
        );
        let mut data_query = sqlx::query_as::<_, TeacherWithUser>(&data_sql);
        if let Some(s) = &search {
            data_query = data_query.bind(s);
        }
        if let Some(a) = is_active {
            data_query = data_query.bind(a);
        }
        let data = data_query
            .fetch_all(db)
            .await
            .context("Failed to fetch teachers")
            .map_err(AppError::database)?;

        Ok(PaginatedTeachersResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    async fn employee_id_taken(
        db: &PgPool,
        employee_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teachers WHERE employee_id = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(employee_id)
        .bind(exclude)
        .fetch_one(db)
        .await
        .context("Failed to check employee id")
        .map_err(AppError::database)
    }

    /// Active, verified teacher account. The password must be changed on
    /// first login.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_teacher(
        db: &PgPool,
        dto: CreateTeacherDto,
    ) -> Result<TeacherWithUser, AppError> {
        if AuthService::email_taken(db, &dto.email).await? {
            return Err(AppError::field("email", EMAIL_TAKEN));
        }

        let employee_id = match dto.employee_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                if Self::employee_id_taken(db, id, None).await? {
                    return Err(AppError::field("employee_id", EMPLOYEE_ID_TAKEN));
                }
                id.to_string()
            }
            _ => next_employee_id(db).await?,
        };

        let password_hash = hash_password_async(&dto.password).await?;
        let hire_date = dto.hire_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = begin(db).await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (email, password, first_name, last_name, phone_number, user_type,
                                  is_active, is_email_verified, must_change_password)
               VALUES ($1, $2, $3, $4, $5, 'teacher', true, true, true)
               RETURNING id"#,
        )
        .bind(normalize_email(&dto.email))
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.phone_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "email", EMAIL_TAKEN, "Failed to create teacher user"))?;

        let teacher_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO teachers (user_id, employee_id, subjects, qualification, experience_years,
                                     hire_date, password_change_required)
               VALUES ($1, $2, COALESCE($3, 'General'), $4, $5, $6, true)
               RETURNING id"#,
        )
        .bind(user_id)
        .bind(&employee_id)
        .bind(&dto.subjects)
        .bind(&dto.qualification)
        .bind(dto.experience_years.unwrap_or(0))
        .bind(hire_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation(e, "employee_id", EMPLOYEE_ID_TAKEN, "Failed to create teacher profile")
        })?;

        commit(tx).await?;
        track_registration("teacher");

        Self::get_teacher_row(db, teacher_id).await
    }

    async fn get_teacher_row(db: &PgPool, id: Uuid) -> Result<TeacherWithUser, AppError> {
        sqlx::query_as::<_, TeacherWithUser>(&format!("{} WHERE t.id = $1", TEACHER_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch teacher")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Teacher not found")))
    }

    pub async fn classes_for_teacher(
        db: &PgPool,
        teacher_id: Uuid,
    ) -> Result<Vec<TeacherClassInfo>, AppError> {
        sqlx::query_as::<_, TeacherClassInfo>(
            r#"SELECT a.id AS assignment_id, c.id AS class_id, c.class_name, c.class_code,
                      a.role, a.assigned_date
               FROM class_teacher_assignments a
               JOIN classes c ON c.id = a.class_id
               WHERE a.teacher_id = $1 AND a.is_active = true
               ORDER BY c.class_name"#,
        )
        .bind(teacher_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch teacher classes")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(db: &PgPool, id: Uuid) -> Result<TeacherDetail, AppError> {
        let teacher = Self::get_teacher_row(db, id).await?;
        let classes = Self::classes_for_teacher(db, id).await?;
        Ok(TeacherDetail { teacher, classes })
    }

    /// Changing the email marks the account unverified. `is_active` applies
    /// to both the profile and the user account.
    #[instrument(skip(db, dto))]
    pub async fn update_teacher(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTeacherDto,
    ) -> Result<TeacherWithUser, AppError> {
        let existing = Self::get_teacher_row(db, id).await?;

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

        let employee_id = dto
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|e| *e != existing.employee_id);
        if let Some(employee_id) = employee_id
            && Self::employee_id_taken(db, employee_id, Some(id)).await?
        {
            return Err(AppError::field("employee_id", EMPLOYEE_ID_TAKEN));
        }

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name = COALESCE($3, last_name),
                   phone_number = COALESCE($4, phone_number),
                   email = COALESCE($5, email),
                   is_email_verified = CASE WHEN $5::text IS NULL THEN is_email_verified ELSE false END,
                   is_active = COALESCE($6, is_active),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(existing.user_id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(&dto.phone_number)
        .bind(&new_email)
        .bind(dto.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "email", EMAIL_TAKEN, "Failed to update teacher user"))?;

        sqlx::query(
            r#"UPDATE teachers
               SET employee_id = COALESCE($2, employee_id),
                   subjects = COALESCE($3, subjects),
                   qualification = COALESCE($4, qualification),
                   experience_years = COALESCE($5, experience_years),
                   hire_date = COALESCE($6, hire_date),
                   is_active = COALESCE($7, is_active),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(employee_id)
        .bind(&dto.subjects)
        .bind(&dto.qualification)
        .bind(dto.experience_years)
        .bind(dto.hire_date)
        .bind(dto.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation(e, "employee_id", EMPLOYEE_ID_TAKEN, "Failed to update teacher profile")
        })?;

        commit(tx).await?;

        Self::get_teacher_row(db, id).await
    }

    /// Soft delete: deactivates the profile and the user account.
    #[instrument(skip(db))]
    pub async fn delete_teacher(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let teacher = Self::get_teacher_row(db, id).await?;

        let mut tx = begin(db).await?;

        sqlx::query("UPDATE teachers SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate teacher")
            .map_err(AppError::database)?;

        sqlx::query("UPDATE users SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(teacher.user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate teacher user")
            .map_err(AppError::database)?;

        commit(tx).await
    }

    #[instrument(skip(db, dto))]
    pub async fn reset_password(
        db: &PgPool,
        id: Uuid,
        dto: AdminResetPasswordDto,
    ) -> Result<TeacherWithUser, AppError> {
        let teacher = Self::get_teacher_row(db, id).await?;
        let password_hash = hash_password_async(&dto.new_password).await?;

        let mut tx = begin(db).await?;

        sqlx::query(
            "UPDATE users SET password = $2, must_change_password = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(teacher.user_id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .context("Failed to reset teacher password")
        .map_err(AppError::database)?;

        sqlx::query(
            "UPDATE teachers SET password_change_required = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to flag teacher password change")
        .map_err(AppError::database)?;

        commit(tx).await?;
        Ok(teacher)
    }
}
