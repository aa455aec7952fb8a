use anyhow::{Context, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use nursery_core::validation::title_case;
use nursery_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    CreateStudentDto, EnrollmentStatusFilter, PARENT_CONTACT_COLUMNS, PARENT_CONTACT_JOINS,
    PaginatedStudentsResponse, ParentContact, STUDENT_COLUMNS, STUDENT_WITH_CLASS_SELECT, Student,
    StudentDetail, StudentFilterParams, StudentWithClass, UpdateStudentDto,
};
use crate::utils::codes::next_student_code;
use crate::utils::db::{begin, commit, unique_violation};

const STUDENT_CODE_TAKEN: &str = "A student with this code already exists.";

fn check_birth_date(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date_of_birth > today {
        return Err(AppError::field(
            "date_of_birth",
            "Date of birth cannot be in the future.",
        ));
    }
    Ok(())
}

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (s.student_name ILIKE ${p} OR s.student_code ILIKE ${p})",
                p = param_count
            ));
            search = Some(format!("%{}%", term));
        }
        if filters.class_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND e.class_id = ${}", param_count));
        }
        if filters.is_active.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND s.is_active = ${}", param_count));
        }
        match filters.enrollment_status {
            Some(EnrollmentStatusFilter::Enrolled) => where_clause.push_str(" AND e.id IS NOT NULL"),
            Some(EnrollmentStatusFilter::Unassigned) => where_clause.push_str(" AND e.id IS NULL"),
            None => {}
        }

        let count_sql = format!(
            r#"SELECT COUNT(*) FROM students s
               LEFT JOIN class_student_enrollments e ON e.student_id = s.id AND e.is_active = true{}"#,
            where_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(s) = &search {
            count_query = count_query.bind(s);
        }
        if let Some(class_id) = filters.class_id {
            count_query = count_query.bind(class_id);
        }
        if let Some(active) = filters.is_active {
            count_query = count_query.bind(active);
        }
        let total = count_query
            .fetch_one(db)
            .await
            .context("Failed to count students")
            .map_err(AppError::database)?;

        let data_sql = format!(
            "{}{} ORDER BY s.student_name ASC LIMIT {} OFFSET {}",
            STUDENT_WITH_CLASS_SELECT,
            where_clause,
            filters.pagination.limit(),
            filters.pagination.offset()
        );
        let mut data_query = sqlx::query_as::<_, StudentWithClass>(&data_sql);
        if let Some(s) = &search {
            data_query = data_query.bind(s);
        }
        if let Some(class_id) = filters.class_id {
            data_query = data_query.bind(class_id);
        }
        if let Some(active) = filters.is_active {
            data_query = data_query.bind(active);
        }
        let data = data_query
            .fetch_all(db)
            .await
            .context("Failed to fetch students")
            .map_err(AppError::database)?;

        Ok(PaginatedStudentsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<StudentDetail, AppError> {
        let today = Local::now().date_naive();
        check_birth_date(dto.date_of_birth, today)?;

        let mut tx = begin(db).await?;

        let student_code = match dto.student_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_uppercase(),
            _ => next_student_code(&mut *tx, today.year()).await?,
        };

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO students (student_name, student_code, date_of_birth, gender, avatar_url, medical_conditions)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(title_case(&dto.student_name))
        .bind(&student_code)
        .bind(dto.date_of_birth)
        .bind(dto.gender)
        .bind(&dto.avatar_url)
        .bind(&dto.medical_conditions)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation(e, "student_code", STUDENT_CODE_TAKEN, "Failed to create student")
        })?;

        commit(tx).await?;
        info!(student_id = %id, student_code = %student_code, "Student created");

        Self::get_student(db, id).await
    }

    pub async fn get_student_row(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students s WHERE s.id = $1",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Student not found")))
    }

    pub async fn student_parents(db: &PgPool, student_id: Uuid) -> Result<Vec<ParentContact>, AppError> {
        sqlx::query_as::<_, ParentContact>(&format!(
            "SELECT {} {} WHERE r.student_id = $1 ORDER BY r.is_primary_contact DESC, u.first_name ASC",
            PARENT_CONTACT_COLUMNS, PARENT_CONTACT_JOINS
        ))
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student parents")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: Uuid) -> Result<StudentDetail, AppError> {
        let student = Self::get_student_row(db, id).await?;

        let current_class = sqlx::query_as::<_, StudentWithClass>(&format!(
            "{} WHERE s.id = $1",
            STUDENT_WITH_CLASS_SELECT
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student enrollment")
        .map_err(AppError::database)?
        .and_then(|row| row.current_class());

        let parents = Self::student_parents(db, id).await?;

        Ok(StudentDetail {
            student,
            current_class,
            parents,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<StudentDetail, AppError> {
        Self::get_student_row(db, id).await?;
        if let Some(date_of_birth) = dto.date_of_birth {
            check_birth_date(date_of_birth, Local::now().date_naive())?;
        }

        sqlx::query(
            r#"UPDATE students
               SET student_name = COALESCE($2, student_name),
                   student_code = COALESCE($3, student_code),
                   date_of_birth = COALESCE($4, date_of_birth),
                   gender = COALESCE($5, gender),
                   avatar_url = COALESCE($6, avatar_url),
                   medical_conditions = COALESCE($7, medical_conditions),
                   is_active = COALESCE($8, is_active),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.student_name.as_deref().map(title_case))
        .bind(dto.student_code.as_deref().map(|code| code.trim().to_uppercase()))
        .bind(dto.date_of_birth)
        .bind(dto.gender)
        .bind(&dto.avatar_url)
        .bind(&dto.medical_conditions)
        .bind(dto.is_active)
        .execute(db)
        .await
        .map_err(|e| {
            unique_violation(e, "student_code", STUDENT_CODE_TAKEN, "Failed to update student")
        })?;

        Self::get_student(db, id).await
    }

    /// Soft delete that also ends the active enrollment.
    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        Self::get_student_row(db, id).await?;

        let mut tx = begin(db).await?;

        sqlx::query("UPDATE students SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate student")
            .map_err(AppError::database)?;

        sqlx::query(
            r#"UPDATE class_student_enrollments
               SET is_active = false, updated_at = NOW()
               WHERE student_id = $1 AND is_active = true"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to deactivate student enrollment")
        .map_err(AppError::database)?;

        commit(tx).await
    }
}
