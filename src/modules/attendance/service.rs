use std::collections::{HashMap, HashSet};

use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate, NaiveTime};
use nursery_core::AppError;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    ATTENDANCE_SELECT, AttendanceFilterParams, AttendanceRecord, MarkAttendanceDto,
    MarkAttendanceResponse, UpdateAttendanceDto, check_out_not_before_check_in,
};
use crate::metrics::track_attendance_marked;
use crate::utils::auth_helpers::{ensure_teacher_assigned, is_teacher_assigned, teacher_id_for_user};
use crate::utils::db::{begin, commit};

#[derive(Debug, FromRow)]
struct StudentEnrollment {
    id: Uuid,
    student_name: String,
    is_enrolled: bool,
}

#[derive(Debug, FromRow)]
struct AttendanceOwner {
    class_id: Uuid,
    check_in_time: Option<NaiveTime>,
    check_out_time: Option<NaiveTime>,
}

fn already_marked(date: NaiveDate) -> AppError {
    AppError::bad_request(anyhow!(
        "Attendance for this class on {} has already been marked.",
        date
    ))
}

pub(crate) fn check_attendance_date(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date > today {
        return Err(AppError::field(
            "attendance_date",
            "Attendance cannot be marked for a future date.",
        ));
    }
    Ok(())
}

/// First student id that appears more than once.
pub(crate) fn find_duplicate(ids: impl IntoIterator<Item = Uuid>) -> Option<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}

pub struct AttendanceService;

impl AttendanceService {
    /// Inserts one row per record in a single transaction. Every student must
    /// be actively enrolled in the class and the date must not be marked yet.
    #[instrument(skip(db, dto), fields(class_id = %dto.class_id, date = %dto.attendance_date))]
    pub async fn mark_attendance(
        db: &PgPool,
        user_id: Uuid,
        dto: MarkAttendanceDto,
    ) -> Result<MarkAttendanceResponse, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, dto.class_id).await?;
        check_attendance_date(dto.attendance_date, Local::now().date_naive())?;

        if let Some(duplicate) = find_duplicate(dto.attendance_records.iter().map(|r| r.student_id)) {
            return Err(AppError::field(
                "attendance_records",
                format!("Student {} appears more than once.", duplicate),
            ));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM daily_attendance WHERE class_id = $1 AND attendance_date = $2)",
        )
        .bind(dto.class_id)
        .bind(dto.attendance_date)
        .fetch_one(db)
        .await
        .context("Failed to check existing attendance")
        .map_err(AppError::database)?;
        if exists {
            return Err(already_marked(dto.attendance_date));
        }

        let student_ids: Vec<Uuid> = dto.attendance_records.iter().map(|r| r.student_id).collect();
        let students: HashMap<Uuid, StudentEnrollment> = sqlx::query_as::<_, StudentEnrollment>(
            r#"SELECT s.id, s.student_name,
                      EXISTS(SELECT 1 FROM class_student_enrollments e
                             WHERE e.student_id = s.id AND e.class_id = $2 AND e.is_active = true) AS is_enrolled
               FROM students s
               WHERE s.id = ANY($1)"#,
        )
        .bind(&student_ids)
        .bind(dto.class_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch students")
        .map_err(AppError::database)?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

        for record in &dto.attendance_records {
            match students.get(&record.student_id) {
                None => {
                    return Err(AppError::not_found(anyhow!(
                        "Student {} not found",
                        record.student_id
                    )));
                }
                Some(student) if !student.is_enrolled => {
                    return Err(AppError::bad_request(anyhow!(
                        "{} is not enrolled in this class.",
                        student.student_name
                    )));
                }
                Some(_) => {}
            }
        }

        let mut tx = begin(db).await?;

        for record in &dto.attendance_records {
            sqlx::query(
                r#"INSERT INTO daily_attendance
                       (class_id, student_id, attendance_date, status, check_in_time, check_out_time,
                        marked_by_teacher_id, notes)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            )
            .bind(dto.class_id)
            .bind(record.student_id)
            .bind(dto.attendance_date)
            .bind(record.status)
            .bind(record.check_in_time)
            .bind(record.check_out_time)
            .bind(teacher_id)
            .bind(&record.notes)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    already_marked(dto.attendance_date)
                }
                _ => AppError::database(anyhow!(e).context("Failed to insert attendance")),
            })?;
        }

        commit(tx).await?;
        track_attendance_marked(dto.attendance_records.len());
        info!(count = dto.attendance_records.len(), "Attendance marked");

        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "{} WHERE a.class_id = $1 AND a.attendance_date = $2 ORDER BY s.student_name",
            ATTENDANCE_SELECT
        ))
        .bind(dto.class_id)
        .bind(dto.attendance_date)
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance")
        .map_err(AppError::database)?;

        Ok(MarkAttendanceResponse {
            message: format!("Attendance marked for {} student(s)", records.len()),
            class_id: dto.class_id,
            attendance_date: dto.attendance_date,
            records,
        })
    }

    #[instrument(skip(db))]
    pub async fn list_attendance(
        db: &PgPool,
        user_id: Uuid,
        filters: AttendanceFilterParams,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let class_id = filters
            .class_id
            .ok_or_else(|| AppError::field("class_id", "class_id is required."))?;
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, class_id).await?;

        let mut where_clause = String::from(" WHERE a.class_id = $1");
        let mut param_count = 1;

        if filters.student_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND a.student_id = ${}", param_count));
        }
        if filters.attendance_date.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND a.attendance_date = ${}", param_count));
        }
        if filters.start_date.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND a.attendance_date >= ${}", param_count));
        }
        if filters.end_date.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND a.attendance_date <= ${}", param_count));
        }

        let sql = format!(
            "{}{} ORDER BY a.attendance_date DESC, s.student_name ASC",
            ATTENDANCE_SELECT, where_clause
        );
        let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(class_id);
        if let Some(student_id) = filters.student_id {
            query = query.bind(student_id);
        }
        if let Some(date) = filters.attendance_date {
            query = query.bind(date);
        }
        if let Some(start) = filters.start_date {
            query = query.bind(start);
        }
        if let Some(end) = filters.end_date {
            query = query.bind(end);
        }

        query
            .fetch_all(db)
            .await
            .context("Failed to fetch attendance")
            .map_err(AppError::database)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_attendance(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateAttendanceDto,
    ) -> Result<AttendanceRecord, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;

        let existing = sqlx::query_as::<_, AttendanceOwner>(
            "SELECT class_id, check_in_time, check_out_time FROM daily_attendance WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch attendance record")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Attendance record not found")))?;

        if !is_teacher_assigned(db, teacher_id, existing.class_id).await? {
            return Err(AppError::forbidden(
                "You can only update attendance for your own classes.",
            ));
        }

        check_out_not_before_check_in(
            dto.check_in_time.or(existing.check_in_time),
            dto.check_out_time.or(existing.check_out_time),
        )
        .map_err(|_| {
            AppError::field(
                "check_out_time",
                "Check-out time cannot be before check-in time.",
            )
        })?;

        sqlx::query(
            r#"UPDATE daily_attendance
               SET status = COALESCE($2, status),
                   notes = COALESCE($3, notes),
                   check_in_time = COALESCE($4, check_in_time),
                   check_out_time = COALESCE($5, check_out_time),
                   marked_by_teacher_id = $6,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.status)
        .bind(&dto.notes)
        .bind(dto.check_in_time)
        .bind(dto.check_out_time)
        .bind(teacher_id)
        .execute(db)
        .await
        .context("Failed to update attendance")
        .map_err(AppError::database)?;

        sqlx::query_as::<_, AttendanceRecord>(&format!("{} WHERE a.id = $1", ATTENDANCE_SELECT))
            .bind(id)
            .fetch_one(db)
            .await
            .context("Failed to fetch attendance record")
            .map_err(AppError::database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_attendance_date_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(check_attendance_date(today, today).is_ok());
        assert!(check_attendance_date(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(), today).is_ok());

        let err =
            check_attendance_date(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(), today).unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.details.unwrap().contains_key("attendance_date"));
    }

    #[test]
    fn test_find_duplicate_student() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(find_duplicate([a, b]), None);
        assert_eq!(find_duplicate([a, b, a]), Some(a));
    }

    #[test]
    fn test_already_marked_message() {
        let err = already_marked(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.message().contains("2025-03-10"));
    }
}
