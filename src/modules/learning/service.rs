use anyhow::{Context, anyhow};
use nursery_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    ACTIVITY_COLUMNS, ActivityFilterParams, CreateLearningActivityDto, DEFAULT_ACTIVITY_MINUTES,
    LearningActivity, LearningSession, LearningSessionDetail, RecordSessionDto, SESSION_SELECT,
    SessionFilterParams, StudentLearningRecord, StudentRecordInput, UpdateLearningActivityDto,
};
use crate::metrics::track_learning_session_recorded;
use crate::modules::attendance::service::find_duplicate;
use crate::utils::auth_helpers::{ensure_teacher_assigned, is_teacher_assigned, teacher_id_for_user};
use crate::utils::db::{begin, commit};

/// Number of records marked present.
pub(crate) fn present_count(records: &[StudentRecordInput]) -> i32 {
    records.iter().filter(|r| r.was_present).count() as i32
}

pub struct LearningService;

impl LearningService {
    #[instrument(skip(db))]
    pub async fn list_activities(
        db: &PgPool,
        filters: ActivityFilterParams,
    ) -> Result<Vec<LearningActivity>, AppError> {
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(" AND activity_name ILIKE ${}", param_count));
            search = Some(format!("%{}%", term));
        }
        if filters.category.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND category = ${}", param_count));
        }
        if filters.is_active.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND is_active = ${}", param_count));
        }

        let sql = format!(
            "SELECT {} FROM learning_activities{} ORDER BY category, activity_name",
            ACTIVITY_COLUMNS, where_clause
        );
        let mut query = sqlx::query_as::<_, LearningActivity>(&sql);
        if let Some(s) = &search {
            query = query.bind(s);
        }
        if let Some(category) = filters.category {
            query = query.bind(category);
        }
        if let Some(active) = filters.is_active {
            query = query.bind(active);
        }

        query
            .fetch_all(db)
            .await
            .context("Failed to fetch learning activities")
            .map_err(AppError::database)
    }

    /// Active catalog entries offered to teachers.
    pub async fn activity_catalog(db: &PgPool) -> Result<Vec<LearningActivity>, AppError> {
        Self::list_activities(
            db,
            ActivityFilterParams {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(db, dto), fields(activity_name = %dto.activity_name))]
    pub async fn create_activity(
        db: &PgPool,
        dto: CreateLearningActivityDto,
    ) -> Result<LearningActivity, AppError> {
        sqlx::query_as::<_, LearningActivity>(&format!(
            r#"INSERT INTO learning_activities (activity_name, description, category, age_group, duration_minutes)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            ACTIVITY_COLUMNS
        ))
        .bind(dto.activity_name.trim())
        .bind(&dto.description)
        .bind(dto.category)
        .bind(&dto.age_group)
        .bind(dto.duration_minutes.unwrap_or(DEFAULT_ACTIVITY_MINUTES))
        .fetch_one(db)
        .await
        .context("Failed to create learning activity")
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_activity(
        db: &PgPool,
        id: Uuid,
        dto: UpdateLearningActivityDto,
    ) -> Result<LearningActivity, AppError> {
        sqlx::query_as::<_, LearningActivity>(&format!(
            r#"UPDATE learning_activities
               SET activity_name = COALESCE($2, activity_name),
                   description = COALESCE($3, description),
                   category = COALESCE($4, category),
                   age_group = COALESCE($5, age_group),
                   duration_minutes = COALESCE($6, duration_minutes),
                   is_active = COALESCE($7, is_active),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            ACTIVITY_COLUMNS
        ))
        .bind(id)
        .bind(dto.activity_name.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.category)
        .bind(&dto.age_group)
        .bind(dto.duration_minutes)
        .bind(dto.is_active)
        .fetch_optional(db)
        .await
        .context("Failed to update learning activity")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Learning activity not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_activity(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE learning_activities SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await
        .context("Failed to deactivate learning activity")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Learning activity not found")));
        }
        Ok(())
    }

    /// Logs a session and its per-student records in one transaction.
    /// An inline `title` + `category` adds a catalog entry first.
    ///
    /// `attendance_count` is the number of records marked present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::forbidden` when the caller is not assigned to the
    /// class, and a 400 when a student is listed twice or is not enrolled.
    #[instrument(skip(db, dto), fields(class_id = %dto.class_id, date = %dto.session_date))]
    pub async fn record_session(
        db: &PgPool,
        user_id: Uuid,
        dto: RecordSessionDto,
    ) -> Result<LearningSessionDetail, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, dto.class_id).await?;

        if let Some(activity_id) = dto.activity_id {
            let active = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM learning_activities WHERE id = $1 AND is_active = true)",
            )
            .bind(activity_id)
            .fetch_one(db)
            .await
            .context("Failed to check learning activity")
            .map_err(AppError::database)?;
            if !active {
                return Err(AppError::not_found(anyhow!("Learning activity not found")));
            }
        }

        if let Some(duplicate) = find_duplicate(dto.student_records.iter().map(|r| r.student_id)) {
            return Err(AppError::field(
                "student_records",
                format!("Student {} appears more than once.", duplicate),
            ));
        }

        let student_ids: Vec<Uuid> = dto.student_records.iter().map(|r| r.student_id).collect();
        if !student_ids.is_empty() {
            let enrolled = sqlx::query_scalar::<_, i64>(
                r#"SELECT COUNT(*) FROM class_student_enrollments
                   WHERE class_id = $1 AND student_id = ANY($2) AND is_active = true"#,
            )
            .bind(dto.class_id)
            .bind(&student_ids)
            .fetch_one(db)
            .await
            .context("Failed to check enrollments")
            .map_err(AppError::database)?;

            if enrolled != student_ids.len() as i64 {
                return Err(AppError::bad_request(anyhow!(
                    "One or more students are not enrolled in this class."
                )));
            }
        }

        let mut tx = begin(db).await?;

        let activity_id = match dto.activity_id {
            Some(id) => id,
            None => {
                let title = dto.title.as_deref().map(str::trim).unwrap_or_default();
                let category = dto
                    .category
                    .ok_or_else(|| AppError::field("category", "A category is required."))?;
                sqlx::query_scalar::<_, Uuid>(
                    r#"INSERT INTO learning_activities (activity_name, category, duration_minutes)
                       VALUES ($1, $2, $3)
                       RETURNING id"#,
                )
                .bind(title)
                .bind(category)
                .bind(dto.duration_minutes)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to create learning activity")
                .map_err(AppError::database)?
            }
        };

        let session_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO class_learning_sessions
                   (class_id, teacher_id, activity_id, session_date, start_time, end_time,
                    duration_minutes, learning_objectives, materials_used, notes, attendance_count)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING id"#,
        )
        .bind(dto.class_id)
        .bind(teacher_id)
        .bind(activity_id)
        .bind(dto.session_date)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(dto.duration_minutes)
        .bind(&dto.learning_objectives)
        .bind(&dto.materials_used)
        .bind(&dto.notes)
        .bind(present_count(&dto.student_records))
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create learning session")
        .map_err(AppError::database)?;

        for record in &dto.student_records {
            sqlx::query(
                r#"INSERT INTO student_learning_records
                       (session_id, student_id, was_present, participation_level, individual_notes)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(session_id)
            .bind(record.student_id)
            .bind(record.was_present)
            .bind(record.participation_level)
            .bind(&record.individual_notes)
            .execute(&mut *tx)
            .await
            .context("Failed to create student learning record")
            .map_err(AppError::database)?;
        }

        commit(tx).await?;
        track_learning_session_recorded();
        info!(session_id = %session_id, records = dto.student_records.len(), "Learning session recorded");

        Self::session_detail(db, session_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_sessions(
        db: &PgPool,
        user_id: Uuid,
        filters: SessionFilterParams,
    ) -> Result<Vec<LearningSession>, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;

        let mut where_clause = String::from(" WHERE ls.teacher_id = $1");
        let mut param_count = 1;
        if filters.date.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND ls.session_date = ${}", param_count));
        }
        if filters.class_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND ls.class_id = ${}", param_count));
        }

        let sql = format!(
            "{}{} ORDER BY ls.session_date DESC, ls.created_at DESC",
            SESSION_SELECT, where_clause
        );
        let mut query = sqlx::query_as::<_, LearningSession>(&sql).bind(teacher_id);
        if let Some(date) = filters.date {
            query = query.bind(date);
        }
        if let Some(class_id) = filters.class_id {
            query = query.bind(class_id);
        }

        query
            .fetch_all(db)
            .await
            .context("Failed to fetch learning sessions")
            .map_err(AppError::database)
    }

    async fn session_detail(db: &PgPool, id: Uuid) -> Result<LearningSessionDetail, AppError> {
        let session = sqlx::query_as::<_, LearningSession>(&format!("{} WHERE ls.id = $1", SESSION_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch learning session")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Learning session not found")))?;

        let student_records = sqlx::query_as::<_, StudentLearningRecord>(
            r#"SELECT r.id, r.session_id, r.student_id, s.student_name, r.was_present,
                      r.participation_level, r.individual_notes
               FROM student_learning_records r
               JOIN students s ON s.id = r.student_id
               WHERE r.session_id = $1
               ORDER BY s.student_name"#,
        )
        .bind(id)
        .fetch_all(db)
        .await
        .context("Failed to fetch student learning records")
        .map_err(AppError::database)?;

        Ok(LearningSessionDetail {
            session,
            student_records,
        })
    }

    /// Visible to the teacher who logged it and to teachers of the class.
    #[instrument(skip(db))]
    pub async fn get_session(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<LearningSessionDetail, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        let detail = Self::session_detail(db, id).await?;

        if detail.session.teacher_id != teacher_id
            && !is_teacher_assigned(db, teacher_id, detail.session.class_id).await?
        {
            return Err(AppError::forbidden(
                "You do not have access to this learning session.",
            ));
        }
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(was_present: bool) -> StudentRecordInput {
        StudentRecordInput {
            student_id: Uuid::new_v4(),
            was_present,
            participation_level: None,
            individual_notes: None,
        }
    }

    #[test]
    fn test_present_count() {
        assert_eq!(present_count(&[]), 0);
        assert_eq!(present_count(&[record(true), record(false), record(true)]), 2);
    }
}
