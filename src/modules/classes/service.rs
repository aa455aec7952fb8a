use anyhow::{Context, anyhow};
use nursery_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    BulkUnassignResponse, CLASS_STATS_SELECT, ClassDetail, ClassFilterParams, ClassStudentInfo,
    ClassTeacherInfo, ClassWithStats, CreateClassDto, DEFAULT_CAPACITY, PaginatedClassesResponse,
    UpdateClassDto,
};
use crate::utils::db::unique_violation;

const CLASS_CODE_TAKEN: &str = "A class with this code already exists.";

fn normalize_class_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db))]
    pub async fn list_classes(
        db: &PgPool,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (c.class_name ILIKE ${p} OR c.class_code ILIKE ${p} OR c.age_group ILIKE ${p})",
                p = param_count
            ));
            search = Some(format!("%{}%", term));
        }
        if filters.is_active.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND c.is_active = ${}", param_count));
        }

        let count_sql = format!("SELECT COUNT(*) FROM classes c{}", where_clause);
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
            .context("Failed to count classes")
            .map_err(AppError::database)?;

        let data_sql = format!(
            "{}{} ORDER BY c.class_name ASC LIMIT {} OFFSET {}",
            CLASS_STATS_SELECT,
            where_clause,
            filters.pagination.limit(),
            filters.pagination.offset()
        );
        let mut data_query = sqlx::query_as::<_, ClassWithStats>(&data_sql);
        if let Some(s) = &search {
            data_query = data_query.bind(s);
        }
        if let Some(active) = filters.is_active {
            data_query = data_query.bind(active);
        }
        let data = data_query
            .fetch_all(db)
            .await
            .context("Failed to fetch classes")
            .map_err(AppError::database)?;

        Ok(PaginatedClassesResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(class_code = %dto.class_code))]
    pub async fn create_class(db: &PgPool, dto: CreateClassDto) -> Result<ClassWithStats, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO classes (class_name, class_code, age_group, capacity, room_number, academic_year)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(dto.class_name.trim())
        .bind(normalize_class_code(&dto.class_code))
        .bind(&dto.age_group)
        .bind(dto.capacity.unwrap_or(DEFAULT_CAPACITY))
        .bind(&dto.room_number)
        .bind(&dto.academic_year)
        .fetch_one(db)
        .await
        .map_err(|e| unique_violation(e, "class_code", CLASS_CODE_TAKEN, "Failed to create class"))?;

        info!(class_id = %id, "Class created");
        Self::get_class_with_stats(db, id).await
    }

    pub async fn get_class_with_stats(db: &PgPool, id: Uuid) -> Result<ClassWithStats, AppError> {
        sqlx::query_as::<_, ClassWithStats>(&format!("{} WHERE c.id = $1", CLASS_STATS_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch class")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))
    }

    /// Active, enrolled students of a class ordered by name.
    pub async fn class_students(db: &PgPool, class_id: Uuid) -> Result<Vec<ClassStudentInfo>, AppError> {
        sqlx::query_as::<_, ClassStudentInfo>(
            r#"SELECT s.id, s.student_name, s.student_code, s.date_of_birth, s.gender, s.avatar_url,
                      e.enrollment_date
               FROM class_student_enrollments e
               JOIN students s ON s.id = e.student_id
               WHERE e.class_id = $1 AND e.is_active = true AND s.is_active = true
               ORDER BY s.student_name ASC"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch class students")
        .map_err(AppError::database)
    }

    pub async fn class_teachers(db: &PgPool, class_id: Uuid) -> Result<Vec<ClassTeacherInfo>, AppError> {
        sqlx::query_as::<_, ClassTeacherInfo>(
            r#"SELECT t.id, u.first_name, u.last_name, u.email, u.phone_number, t.employee_id,
                      a.role, a.assigned_date
               FROM class_teacher_assignments a
               JOIN teachers t ON t.id = a.teacher_id
               JOIN users u ON u.id = t.user_id
               WHERE a.class_id = $1 AND a.is_active = true
               ORDER BY a.role ASC, u.first_name ASC"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch class teachers")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get_class(db: &PgPool, id: Uuid) -> Result<ClassDetail, AppError> {
        let class = Self::get_class_with_stats(db, id).await?;
        let students = Self::class_students(db, id).await?;
        let teachers = Self::class_teachers(db, id).await?;

        Ok(ClassDetail {
            class,
            students,
            teachers,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_class(
        db: &PgPool,
        id: Uuid,
        dto: UpdateClassDto,
    ) -> Result<ClassWithStats, AppError> {
        let existing = Self::get_class_with_stats(db, id).await?;

        if let Some(capacity) = dto.capacity
            && i64::from(capacity) < existing.student_count
        {
            return Err(AppError::field(
                "capacity",
                format!(
                    "Capacity cannot be lower than the {} students currently enrolled.",
                    existing.student_count
                ),
            ));
        }

        sqlx::query(
            r#"UPDATE classes
               SET class_name = COALESCE($2, class_name),
                   class_code = COALESCE($3, class_code),
                   age_group = COALESCE($4, age_group),
                   capacity = COALESCE($5, capacity),
                   room_number = COALESCE($6, room_number),
                   academic_year = COALESCE($7, academic_year),
                   is_active = COALESCE($8, is_active),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.class_name.as_deref().map(str::trim))
        .bind(dto.class_code.as_deref().map(normalize_class_code))
        .bind(&dto.age_group)
        .bind(dto.capacity)
        .bind(&dto.room_number)
        .bind(&dto.academic_year)
        .bind(dto.is_active)
        .execute(db)
        .await
        .map_err(|e| unique_violation(e, "class_code", CLASS_CODE_TAKEN, "Failed to update class"))?;

        Self::get_class_with_stats(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_class(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE classes SET is_active = false, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(db)
                .await
                .context("Failed to deactivate class")
                .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn unassign_all_students(
        db: &PgPool,
        id: Uuid,
    ) -> Result<BulkUnassignResponse, AppError> {
        let class = Self::get_class_with_stats(db, id).await?;

        let result = sqlx::query(
            r#"UPDATE class_student_enrollments
               SET is_active = false, updated_at = NOW()
               WHERE class_id = $1 AND is_active = true"#,
        )
        .bind(id)
        .execute(db)
        .await
        .context("Failed to unassign students")
        .map_err(AppError::database)?;

        let count = result.rows_affected();
        info!(class_id = %id, count, "Unassigned all students");

        Ok(BulkUnassignResponse {
            message: format!("Unassigned {} student(s) from {}", count, class.class_name),
            count,
        })
    }

    #[instrument(skip(db))]
    pub async fn unassign_all_teachers(
        db: &PgPool,
        id: Uuid,
    ) -> Result<BulkUnassignResponse, AppError> {
        let class = Self::get_class_with_stats(db, id).await?;

        let result = sqlx::query(
            r#"UPDATE class_teacher_assignments
               SET is_active = false, updated_at = NOW()
               WHERE class_id = $1 AND is_active = true"#,
        )
        .bind(id)
        .execute(db)
        .await
        .context("Failed to unassign teachers")
        .map_err(AppError::database)?;

        let count = result.rows_affected();
        info!(class_id = %id, count, "Unassigned all teachers");

        Ok(BulkUnassignResponse {
            message: format!("Unassigned {} teacher(s) from {}", count, class.class_name),
            count,
        })
    }
}
