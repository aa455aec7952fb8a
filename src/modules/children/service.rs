use anyhow::{Context, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use nursery_core::AppError;
use nursery_core::validation::title_case;
use nursery_models::AttendanceStatus;
use nursery_models::assignments::EnrollmentRequest;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    AddChildDto, AvailableClass, CHILD_SELECT, Child, ChildRow, ChildrenSummary,
    MonthlyAttendance, MonthlyLearningHours, RequestEnrollmentDto, UpdateChildDto, YearQuery,
    monthly_attendance, monthly_learning_hours, parse_gender,
};
use crate::modules::classes::model::CLASS_STATS_SELECT;
use crate::utils::auth_helpers::parent_id_for_user;
use crate::utils::codes::next_student_code;
use crate::utils::db::{begin, commit};

const REQUEST_PENDING: &str = "An enrollment request for this class is already pending.";

fn invalid_gender() -> AppError {
    AppError::field("gender", "Gender must be one of: male, female, other.")
}

/// `[Jan 1 of year, Jan 1 of year + 1)`.
pub(crate) fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::field("year", "Year is out of range.")),
    }
}

fn resolve_year(query: &YearQuery) -> Result<i32, AppError> {
    query
        .resolve(Local::now().year())
        .ok_or_else(|| AppError::field("year", "Year must be a four-digit number."))
}

pub struct ChildrenService;

impl ChildrenService {
    #[instrument(skip(db))]
    pub async fn list_children(db: &PgPool, user_id: Uuid) -> Result<Vec<Child>, AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;
        Self::children_for_parent(db, parent_id).await
    }

    async fn children_for_parent(db: &PgPool, parent_id: Uuid) -> Result<Vec<Child>, AppError> {
        let today = Local::now().date_naive();
        let rows = sqlx::query_as::<_, ChildRow>(&format!("{} ORDER BY s.student_name", CHILD_SELECT))
            .bind(parent_id)
            .fetch_all(db)
            .await
            .context("Failed to fetch children")
            .map_err(AppError::database)?;

        Ok(rows.into_iter().map(|row| row.into_child(today)).collect())
    }

    async fn child_for_parent(db: &PgPool, parent_id: Uuid, child_id: Uuid) -> Result<Child, AppError> {
        sqlx::query_as::<_, ChildRow>(&format!("{} AND s.id = $2", CHILD_SELECT))
            .bind(parent_id)
            .bind(child_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch child")
            .map_err(AppError::database)?
            .map(|row| row.into_child(Local::now().date_naive()))
            .ok_or_else(|| AppError::not_found(anyhow!("Child not found")))
    }

    /// Creates the student record and links it to the parent. A child with
    /// the same name and birth date already linked to this parent is rejected.
    #[instrument(skip(db, dto))]
    pub async fn add_child(db: &PgPool, user_id: Uuid, dto: AddChildDto) -> Result<Child, AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;
        let student_name = title_case(&dto.student_name);
        let gender = parse_gender(&dto.gender).ok_or_else(invalid_gender)?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM parent_student_relationships r
                   JOIN students s ON s.id = r.student_id
                   WHERE r.parent_id = $1 AND LOWER(s.student_name) = LOWER($2)
                     AND s.date_of_birth = $3 AND s.is_active = true
               )"#,
        )
        .bind(parent_id)
        .bind(&student_name)
        .bind(dto.date_of_birth)
        .fetch_one(db)
        .await
        .context("Failed to check for duplicate child")
        .map_err(AppError::database)?;
        if duplicate {
            return Err(AppError::bad_request(anyhow!(
                "You have already added a child named {} with this date of birth.",
                student_name
            )));
        }

        let mut tx = begin(db).await?;

        let student_code = next_student_code(&mut *tx, Local::now().year()).await?;
        let student_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO students (student_name, student_code, date_of_birth, gender, avatar_url, medical_conditions)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(&student_name)
        .bind(&student_code)
        .bind(dto.date_of_birth)
        .bind(gender)
        .bind(&dto.avatar_url)
        .bind(&dto.medical_conditions)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create student")
        .map_err(AppError::database)?;

        sqlx::query(
            r#"INSERT INTO parent_student_relationships
                   (parent_id, student_id, relationship_type, is_primary_contact, pickup_authorized)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(parent_id)
        .bind(student_id)
        .bind(dto.relationship_type)
        .bind(dto.is_primary_contact.unwrap_or(false))
        .bind(dto.pickup_authorized.unwrap_or(true))
        .execute(&mut *tx)
        .await
        .context("Failed to link child to parent")
        .map_err(AppError::database)?;

        commit(tx).await?;
        info!(student_id = %student_id, student_code = %student_code, "Child added");

        Self::child_for_parent(db, parent_id, student_id).await
    }

    #[instrument(skip(db))]
    pub async fn summary(db: &PgPool, user_id: Uuid) -> Result<ChildrenSummary, AppError> {
        let children = Self::list_children(db, user_id).await?;
        Ok(ChildrenSummary::from_children(children))
    }

    #[instrument(skip(db))]
    pub async fn get_child(db: &PgPool, user_id: Uuid, child_id: Uuid) -> Result<Child, AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;
        Self::child_for_parent(db, parent_id, child_id).await
    }

    /// Partial update of the student record and of this parent's relationship.
    #[instrument(skip(db, dto))]
    pub async fn update_child(
        db: &PgPool,
        user_id: Uuid,
        child_id: Uuid,
        dto: UpdateChildDto,
    ) -> Result<Child, AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;
        Self::child_for_parent(db, parent_id, child_id).await?;

        let gender = match dto.gender.as_deref() {
            Some(raw) => Some(parse_gender(raw).ok_or_else(invalid_gender)?),
            None => None,
        };

        let mut tx = begin(db).await?;

        sqlx::query(
            r#"UPDATE students
               SET student_name = COALESCE($2, student_name),
                   date_of_birth = COALESCE($3, date_of_birth),
                   gender = COALESCE($4, gender),
                   medical_conditions = COALESCE($5, medical_conditions),
                   avatar_url = COALESCE($6, avatar_url),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(child_id)
        .bind(dto.student_name.as_deref().map(title_case))
        .bind(dto.date_of_birth)
        .bind(gender)
        .bind(&dto.medical_conditions)
        .bind(&dto.avatar_url)
        .execute(&mut *tx)
        .await
        .context("Failed to update child")
        .map_err(AppError::database)?;

        sqlx::query(
            r#"UPDATE parent_student_relationships
               SET relationship_type = COALESCE($3, relationship_type),
                   is_primary_contact = COALESCE($4, is_primary_contact),
                   pickup_authorized = COALESCE($5, pickup_authorized),
                   updated_at = NOW()
               WHERE parent_id = $1 AND student_id = $2"#,
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(dto.relationship_type)
        .bind(dto.is_primary_contact)
        .bind(dto.pickup_authorized)
        .execute(&mut *tx)
        .await
        .context("Failed to update relationship")
        .map_err(AppError::database)?;

        commit(tx).await?;

        Self::child_for_parent(db, parent_id, child_id).await
    }

    /// Unlinks the child from this parent. The student record is kept.
    #[instrument(skip(db))]
    pub async fn remove_child(db: &PgPool, user_id: Uuid, child_id: Uuid) -> Result<(), AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;

        let result = sqlx::query(
            "DELETE FROM parent_student_relationships WHERE parent_id = $1 AND student_id = $2",
        )
        .bind(parent_id)
        .bind(child_id)
        .execute(db)
        .await
        .context("Failed to remove child relationship")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Child not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn available_classes(db: &PgPool) -> Result<Vec<AvailableClass>, AppError> {
        sqlx::query_as::<_, AvailableClass>(&format!(
            "{} WHERE c.is_active = true AND c.capacity > COALESCE(s.student_count, 0) ORDER BY c.class_name",
            CLASS_STATS_SELECT
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch available classes")
        .map_err(AppError::database)
    }

    /// Files a pending enrollment request for one of the caller's children.
    ///
    /// # Errors
    ///
    /// 404 when the child is not linked to the caller or the class is unknown.
    /// 400 when the child is already in the class, the class is full, or a
    /// request is already pending.
    #[instrument(skip(db, dto), fields(class_id = %dto.class_id))]
    pub async fn request_enrollment(
        db: &PgPool,
        user_id: Uuid,
        child_id: Uuid,
        dto: RequestEnrollmentDto,
    ) -> Result<EnrollmentRequest, AppError> {
        let parent_id = parent_id_for_user(db, user_id).await?;
        let child = Self::child_for_parent(db, parent_id, child_id).await?;

        let class = sqlx::query_as::<_, AvailableClass>(&format!(
            "{} WHERE c.id = $1 AND c.is_active = true",
            CLASS_STATS_SELECT
        ))
        .bind(dto.class_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch class")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

        if child.current_class.as_ref().is_some_and(|c| c.id == dto.class_id) {
            return Err(AppError::bad_request(anyhow!(
                "{} is already enrolled in {}.",
                child.student_name,
                class.class_name
            )));
        }
        if class.available_spots <= 0 {
            return Err(AppError::bad_request(anyhow!(
                "{} is full.",
                class.class_name
            )));
        }

        let pending = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM enrollment_requests
                   WHERE student_id = $1 AND class_id = $2 AND status = 'pending'
               )"#,
        )
        .bind(child_id)
        .bind(dto.class_id)
        .fetch_one(db)
        .await
        .context("Failed to check pending requests")
        .map_err(AppError::database)?;
        if pending {
            return Err(AppError::bad_request(anyhow!(REQUEST_PENDING)));
        }

        let request = sqlx::query_as::<_, EnrollmentRequest>(
            r#"INSERT INTO enrollment_requests (parent_id, student_id, class_id, notes)
               VALUES ($1, $2, $3, $4)
               RETURNING id, parent_id, student_id, class_id, status, notes, reviewed_by,
                         reviewed_at, created_at"#,
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(dto.class_id)
        .bind(&dto.notes)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::bad_request(anyhow!(REQUEST_PENDING))
            }
            _ => AppError::database(anyhow!(e).context("Failed to create enrollment request")),
        })?;

        info!(request_id = %request.id, "Enrollment requested");
        Ok(request)
    }

    /// Hours of sessions the child attended, per month of `year`.
    #[instrument(skip(db))]
    pub async fn learning_activities(
        db: &PgPool,
        user_id: Uuid,
        child_id: Uuid,
        query: YearQuery,
    ) -> Result<Vec<MonthlyLearningHours>, AppError> {
        let year = resolve_year(&query)?;
        let parent_id = parent_id_for_user(db, user_id).await?;
        Self::child_for_parent(db, parent_id, child_id).await?;
        let (start, end) = year_bounds(year)?;

        let rows = sqlx::query_as::<_, (i32, i64)>(
            r#"SELECT EXTRACT(MONTH FROM ls.session_date)::INT AS month,
                      COALESCE(SUM(ls.duration_minutes), 0)::BIGINT AS minutes
               FROM student_learning_records r
               JOIN class_learning_sessions ls ON ls.id = r.session_id
               WHERE r.student_id = $1 AND r.was_present = true
                 AND ls.session_date >= $2 AND ls.session_date < $3
               GROUP BY 1"#,
        )
        .bind(child_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await
        .context("Failed to aggregate learning hours")
        .map_err(AppError::database)?;

        Ok(monthly_learning_hours(&rows))
    }

    /// Twelve monthly buckets of present, absent and late days for `query.year`.
    #[instrument(skip(db))]
    pub async fn attendance(
        db: &PgPool,
        user_id: Uuid,
        child_id: Uuid,
        query: YearQuery,
    ) -> Result<Vec<MonthlyAttendance>, AppError> {
        let year = resolve_year(&query)?;
        let parent_id = parent_id_for_user(db, user_id).await?;
        Self::child_for_parent(db, parent_id, child_id).await?;
        let (start, end) = year_bounds(year)?;

        let rows = sqlx::query_as::<_, (i32, AttendanceStatus, i64)>(
            r#"SELECT EXTRACT(MONTH FROM attendance_date)::INT AS month, status, COUNT(*) AS count
               FROM daily_attendance
               WHERE student_id = $1 AND attendance_date >= $2 AND attendance_date < $3
               GROUP BY 1, 2"#,
        )
        .bind(child_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await
        .context("Failed to aggregate attendance")
        .map_err(AppError::database)?;

        Ok(monthly_attendance(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2025).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_resolve_year_rejects_garbage() {
        let err = resolve_year(&YearQuery {
            year: Some("20x5".into()),
        })
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);

        let year = resolve_year(&YearQuery {
            year: Some("2024".into()),
        })
        .unwrap();
        assert_eq!(year, 2024);
    }
}
