use std::collections::{HashMap, HashSet};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use nursery_core::AppError;
use nursery_models::{EnrollmentRequestStatus, TeacherRole};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use super::model::{
    ASSIGNMENT_COLUMNS, AssignStudentsDto, AssignTeacherDto, AssignTeacherResponse,
    AssignmentFilterParams, AssignmentStatusFilter, ClassUtilization, DashboardStats,
    ENROLLMENT_REQUEST_SELECT, EnrollmentRequest, EnrollmentRequestFilterParams,
    EnrollmentRequestView, EnrollmentResult, ReassignStudentsDto, TeacherAssignment,
    TeacherAssignmentSummary, TeacherClassInfo, utilization_percent,
};
use crate::utils::db::{begin, commit};

#[derive(Debug, FromRow)]
pub(crate) struct ClassCapacity {
    pub class_name: String,
    pub capacity: i32,
}

#[derive(Debug, FromRow)]
struct TeacherRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    employee_id: String,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct AssignedClassRow {
    teacher_id: Uuid,
    assignment_id: Uuid,
    class_id: Uuid,
    class_name: String,
    class_code: String,
    role: TeacherRole,
    assigned_date: NaiveDate,
}

#[derive(Debug, FromRow)]
struct Totals {
    total_classes: i64,
    total_students: i64,
    total_teachers: i64,
    total_parents: i64,
    enrolled_students: i64,
    pending_enrollment_requests: i64,
}

/// Deduplicated ids, first occurrence wins.
fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Fails when `current + incoming` would exceed `capacity`.
pub(crate) fn check_capacity(
    class_name: &str,
    capacity: i32,
    current: i64,
    incoming: i64,
) -> Result<(), AppError> {
    let available = i64::from(capacity) - current;
    if incoming > available {
        return Err(AppError::bad_request(anyhow!(
            "{} has {} of {} places available; cannot enroll {} more student(s).",
            class_name,
            available.max(0),
            capacity,
            incoming
        )));
    }
    Ok(())
}

/// Locks an active class row for the rest of the transaction.
pub(crate) async fn lock_active_class(
    conn: &mut PgConnection,
    class_id: Uuid,
) -> Result<ClassCapacity, AppError> {
    sqlx::query_as::<_, ClassCapacity>(
        "SELECT class_name, capacity FROM classes WHERE id = $1 AND is_active = true FOR UPDATE",
    )
    .bind(class_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to lock class")
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))
}

/// Capacity check for `student_ids` joining `class_id`. Students already
/// enrolled there do not take a new place.
pub(crate) async fn ensure_capacity(
    conn: &mut PgConnection,
    class_id: Uuid,
    class: &ClassCapacity,
    student_ids: &[Uuid],
) -> Result<(), AppError> {
    let current = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM class_student_enrollments e
           JOIN students s ON s.id = e.student_id
           WHERE e.class_id = $1 AND e.is_active = true AND s.is_active = true"#,
    )
    .bind(class_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to count class enrollments")
    .map_err(AppError::database)?;

    let already_there = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM class_student_enrollments
           WHERE class_id = $1 AND student_id = ANY($2) AND is_active = true"#,
    )
    .bind(class_id)
    .bind(student_ids)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to count existing enrollments")
    .map_err(AppError::database)?;

    let incoming = student_ids.len() as i64 - already_there;
    check_capacity(&class.class_name, class.capacity, current, incoming)
}

async fn ensure_students_active(conn: &mut PgConnection, student_ids: &[Uuid]) -> Result<(), AppError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM students WHERE id = ANY($1) AND is_active = true",
    )
    .bind(student_ids)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to check students")
    .map_err(AppError::database)?;

    if found != student_ids.len() as i64 {
        return Err(AppError::not_found(anyhow!(
            "One or more students were not found or are inactive."
        )));
    }
    Ok(())
}

/// Moves every student into `class_id`: other active enrollments are
/// deactivated and the class enrollment is upserted as active from today.
/// Returns how many students left another class.
pub(crate) async fn enroll_students(
    conn: &mut PgConnection,
    class_id: Uuid,
    student_ids: &[Uuid],
) -> Result<u64, AppError> {
    let moved = sqlx::query(
        r#"UPDATE class_student_enrollments
           SET is_active = false, updated_at = NOW()
           WHERE student_id = ANY($1) AND class_id <> $2 AND is_active = true"#,
    )
    .bind(student_ids)
    .bind(class_id)
    .execute(&mut *conn)
    .await
    .context("Failed to deactivate previous enrollments")
    .map_err(AppError::database)?
    .rows_affected();

    for student_id in student_ids {
        sqlx::query(
            r#"INSERT INTO class_student_enrollments (class_id, student_id, enrollment_date, is_active)
               VALUES ($1, $2, CURRENT_DATE, true)
               ON CONFLICT (class_id, student_id)
               DO UPDATE SET is_active = true, enrollment_date = CURRENT_DATE, updated_at = NOW()"#,
        )
        .bind(class_id)
        .bind(student_id)
        .execute(&mut *conn)
        .await
        .context("Failed to upsert enrollment")
        .map_err(AppError::database)?;
    }

    Ok(moved)
}

async fn ensure_teacher_active(db: &PgPool, teacher_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM teachers WHERE id = $1 AND is_active = true)",
    )
    .bind(teacher_id)
    .fetch_one(db)
    .await
    .context("Failed to check teacher")
    .map_err(AppError::database)?;

    if !exists {
        return Err(AppError::not_found(anyhow!("Teacher not found")));
    }
    Ok(())
}

pub struct AssignmentService;

impl AssignmentService {
    #[instrument(skip(db))]
    pub async fn list_teacher_assignments(
        db: &PgPool,
        filters: AssignmentFilterParams,
    ) -> Result<Vec<TeacherAssignmentSummary>, AppError> {
        let mut where_clause = String::from(" WHERE t.is_active = true");
        let mut search: Option<String> = None;
        let mut param_count = 0;

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (u.first_name ILIKE ${p} OR u.last_name ILIKE ${p} OR u.email ILIKE ${p} OR t.employee_id ILIKE ${p})",
                p = param_count
            ));
            search = Some(format!("%{}%", term));
        }
        if filters.class_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM class_teacher_assignments a WHERE a.teacher_id = t.id AND a.is_active = true AND a.class_id = ${})",
                param_count
            ));
        }
        match filters.assignment_status {
            Some(AssignmentStatusFilter::Assigned) => where_clause.push_str(
                " AND EXISTS (SELECT 1 FROM class_teacher_assignments a WHERE a.teacher_id = t.id AND a.is_active = true)",
            ),
            Some(AssignmentStatusFilter::Unassigned) => where_clause.push_str(
                " AND NOT EXISTS (SELECT 1 FROM class_teacher_assignments a WHERE a.teacher_id = t.id AND a.is_active = true)",
            ),
            None => {}
        }

        let sql = format!(
            r#"SELECT t.id, u.first_name, u.last_name, u.email, t.employee_id, t.is_active
               FROM teachers t
               JOIN users u ON u.id = t.user_id{}
               ORDER BY u.first_name, u.last_name"#,
            where_clause
        );
        let mut query = sqlx::query_as::<_, TeacherRow>(&sql);
        if let Some(s) = &search {
            query = query.bind(s);
        }
        if let Some(class_id) = filters.class_id {
            query = query.bind(class_id);
        }
        let teachers = query
            .fetch_all(db)
            .await
            .context("Failed to fetch teachers")
            .map_err(AppError::database)?;

        let teacher_ids: Vec<Uuid> = teachers.iter().map(|t| t.id).collect();
        let rows = sqlx::query_as::<_, AssignedClassRow>(
            r#"SELECT a.teacher_id, a.id AS assignment_id, c.id AS class_id, c.class_name,
                      c.class_code, a.role, a.assigned_date
               FROM class_teacher_assignments a
               JOIN classes c ON c.id = a.class_id
               WHERE a.teacher_id = ANY($1) AND a.is_active = true
               ORDER BY c.class_name"#,
        )
        .bind(&teacher_ids)
        .fetch_all(db)
        .await
        .context("Failed to fetch teacher assignments")
        .map_err(AppError::database)?;

        let mut classes: HashMap<Uuid, Vec<TeacherClassInfo>> = HashMap::new();
        for row in rows {
            classes.entry(row.teacher_id).or_default().push(TeacherClassInfo {
                assignment_id: row.assignment_id,
                class_id: row.class_id,
                class_name: row.class_name,
                class_code: row.class_code,
                role: row.role,
                assigned_date: row.assigned_date,
            });
        }

        Ok(teachers
            .into_iter()
            .map(|t| TeacherAssignmentSummary {
                classes: classes.remove(&t.id).unwrap_or_default(),
                teacher_id: t.id,
                first_name: t.first_name,
                last_name: t.last_name,
                email: t.email,
                employee_id: t.employee_id,
                is_active: t.is_active,
            })
            .collect())
    }

    /// Assigns the teacher to the class and enrolls every student there,
    /// all in one transaction.
    ///
    /// # Errors
    ///
    /// 404 when the class, teacher or a student is unknown or inactive, and
    /// 400 when the class does not have room for the students not already
    /// in it.
    #[instrument(skip(db, dto), fields(class_id = %dto.class_id, students = dto.student_ids.len()))]
    pub async fn assign_students(
        db: &PgPool,
        dto: AssignStudentsDto,
    ) -> Result<EnrollmentResult, AppError> {
        ensure_teacher_active(db, dto.teacher_id).await?;
        let student_ids = unique_ids(&dto.student_ids);
        let role = dto.role.unwrap_or(TeacherRole::Primary);

        let mut tx = begin(db).await?;

        let class = lock_active_class(&mut tx, dto.class_id).await?;
        ensure_students_active(&mut tx, &student_ids).await?;
        ensure_capacity(&mut tx, dto.class_id, &class, &student_ids).await?;

        sqlx::query(
            r#"INSERT INTO class_teacher_assignments (class_id, teacher_id, role, assigned_date, is_active)
               VALUES ($1, $2, $3, CURRENT_DATE, true)
               ON CONFLICT (class_id, teacher_id, role)
               DO UPDATE SET is_active = true, updated_at = NOW()"#,
        )
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .bind(role)
        .execute(&mut *tx)
        .await
        .context("Failed to assign teacher")
        .map_err(AppError::database)?;

        let moved = enroll_students(&mut tx, dto.class_id, &student_ids).await?;
        commit(tx).await?;

        info!(moved, "Students assigned");
        Ok(EnrollmentResult {
            message: format!(
                "Successfully assigned {} student(s) to {}",
                student_ids.len(),
                class.class_name
            ),
            class_id: dto.class_id,
            enrolled_count: student_ids.len(),
            moved_count: moved as usize,
            student_ids,
        })
    }

    /// Moves students into `to_class_id`, deactivating their other enrollments.
    ///
    /// # Arguments
    ///
    /// * `dto` - Students, destination class and an optional source class.
    ///   With a source class, every student must be actively enrolled there.
    ///
    /// # Errors
    ///
    /// 400 when source and destination are equal, a student is missing from
    /// the source class, or the destination lacks room. 404 for an unknown
    /// class or student.
    #[instrument(skip(db, dto), fields(to_class_id = %dto.to_class_id))]
    pub async fn reassign_students(
        db: &PgPool,
        dto: ReassignStudentsDto,
    ) -> Result<EnrollmentResult, AppError> {
        let student_ids = unique_ids(&dto.student_ids);
        if dto.from_class_id == Some(dto.to_class_id) {
            return Err(AppError::field(
                "to_class_id",
                "Source and destination classes must differ.",
            ));
        }

        let mut tx = begin(db).await?;

        if let Some(from_class_id) = dto.from_class_id {
            let enrolled = sqlx::query_scalar::<_, i64>(
                r#"SELECT COUNT(*) FROM class_student_enrollments
                   WHERE class_id = $1 AND student_id = ANY($2) AND is_active = true"#,
            )
            .bind(from_class_id)
            .bind(&student_ids)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to check source enrollments")
            .map_err(AppError::database)?;

            if enrolled != student_ids.len() as i64 {
                return Err(AppError::bad_request(anyhow!(
                    "One or more students are not enrolled in the source class."
                )));
            }
        }

        let class = lock_active_class(&mut tx, dto.to_class_id).await?;
        ensure_students_active(&mut tx, &student_ids).await?;
        ensure_capacity(&mut tx, dto.to_class_id, &class, &student_ids).await?;

        let moved = enroll_students(&mut tx, dto.to_class_id, &student_ids).await?;
        commit(tx).await?;

        Ok(EnrollmentResult {
            message: format!(
                "Successfully reassigned {} student(s) to {}",
                student_ids.len(),
                class.class_name
            ),
            class_id: dto.to_class_id,
            enrolled_count: student_ids.len(),
            moved_count: moved as usize,
            student_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn remove_student_assignment(db: &PgPool, student_id: Uuid) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(student_id)
            .fetch_one(db)
            .await
            .context("Failed to check student")
            .map_err(AppError::database)?;
        if !exists {
            return Err(AppError::not_found(anyhow!("Student not found")));
        }

        let result = sqlx::query(
            r#"UPDATE class_student_enrollments
               SET is_active = false, updated_at = NOW()
               WHERE student_id = $1 AND is_active = true"#,
        )
        .bind(student_id)
        .execute(db)
        .await
        .context("Failed to remove student enrollment")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::bad_request(anyhow!(
                "Student is not assigned to any class."
            )));
        }
        Ok(())
    }

    /// `created` is false when an inactive assignment was reactivated.
    #[instrument(skip(db, dto))]
    pub async fn assign_teacher_to_class(
        db: &PgPool,
        dto: AssignTeacherDto,
    ) -> Result<AssignTeacherResponse, AppError> {
        ensure_teacher_active(db, dto.teacher_id).await?;
        let class_active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1 AND is_active = true)",
        )
        .bind(dto.class_id)
        .fetch_one(db)
        .await
        .context("Failed to check class")
        .map_err(AppError::database)?;
        if !class_active {
            return Err(AppError::not_found(anyhow!("Class not found")));
        }

        let role = dto.role.unwrap_or(TeacherRole::Primary);

        let existing = sqlx::query_as::<_, TeacherAssignment>(&format!(
            "SELECT {} FROM class_teacher_assignments WHERE class_id = $1 AND teacher_id = $2 AND role = $3",
            ASSIGNMENT_COLUMNS
        ))
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .bind(role)
        .fetch_optional(db)
        .await
        .context("Failed to fetch teacher assignment")
        .map_err(AppError::database)?;

        match existing {
            Some(assignment) if assignment.is_active => Err(AppError::bad_request(anyhow!(
                "Teacher is already assigned to this class as {}.",
                role
            ))),
            Some(assignment) => {
                let assignment = sqlx::query_as::<_, TeacherAssignment>(&format!(
                    r#"UPDATE class_teacher_assignments
                       SET is_active = true, assigned_date = CURRENT_DATE, updated_at = NOW()
                       WHERE id = $1
                       RETURNING {}"#,
                    ASSIGNMENT_COLUMNS
                ))
                .bind(assignment.id)
                .fetch_one(db)
                .await
                .context("Failed to reactivate teacher assignment")
                .map_err(AppError::database)?;

                Ok(AssignTeacherResponse {
                    message: "Teacher assignment reactivated".to_string(),
                    assignment,
                    created: false,
                })
            }
            None => {
                let assignment = sqlx::query_as::<_, TeacherAssignment>(&format!(
                    r#"INSERT INTO class_teacher_assignments (class_id, teacher_id, role)
                       VALUES ($1, $2, $3)
                       RETURNING {}"#,
                    ASSIGNMENT_COLUMNS
                ))
                .bind(dto.class_id)
                .bind(dto.teacher_id)
                .bind(role)
                .fetch_one(db)
                .await
                .context("Failed to create teacher assignment")
                .map_err(AppError::database)?;

                Ok(AssignTeacherResponse {
                    message: "Teacher assigned to class successfully".to_string(),
                    assignment,
                    created: true,
                })
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn remove_teacher_from_class(
        db: &PgPool,
        teacher_id: Uuid,
        class_id: Uuid,
    ) -> Result<u64, AppError> {
        let removed = sqlx::query(
            r#"UPDATE class_teacher_assignments
               SET is_active = false, updated_at = NOW()
               WHERE teacher_id = $1 AND class_id = $2 AND is_active = true"#,
        )
        .bind(teacher_id)
        .bind(class_id)
        .execute(db)
        .await
        .context("Failed to remove teacher from class")
        .map_err(AppError::database)?
        .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found(anyhow!(
                "No active assignment found for this teacher and class."
            )));
        }
        Ok(removed)
    }

    #[instrument(skip(db))]
    pub async fn dashboard_stats(db: &PgPool) -> Result<DashboardStats, AppError> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"SELECT
                   (SELECT COUNT(*) FROM classes WHERE is_active = true) AS total_classes,
                   (SELECT COUNT(*) FROM students WHERE is_active = true) AS total_students,
                   (SELECT COUNT(*) FROM teachers WHERE is_active = true) AS total_teachers,
                   (SELECT COUNT(*) FROM parents WHERE is_active = true) AS total_parents,
                   (SELECT COUNT(DISTINCT e.student_id)
                      FROM class_student_enrollments e
                      JOIN students s ON s.id = e.student_id
                      WHERE e.is_active = true AND s.is_active = true) AS enrolled_students,
                   (SELECT COUNT(*) FROM enrollment_requests WHERE status = 'pending') AS pending_enrollment_requests"#,
        )
        .fetch_one(db)
        .await
        .context("Failed to compute dashboard totals")
        .map_err(AppError::database)?;

        let mut class_utilization = sqlx::query_as::<_, ClassUtilization>(
            r#"SELECT c.id AS class_id, c.class_name, c.class_code, c.capacity,
                      (SELECT COUNT(*) FROM class_student_enrollments e
                         JOIN students s ON s.id = e.student_id
                         WHERE e.class_id = c.id AND e.is_active = true AND s.is_active = true) AS student_count,
                      0::FLOAT8 AS utilization
               FROM classes c
               WHERE c.is_active = true
               ORDER BY c.class_name"#,
        )
        .fetch_all(db)
        .await
        .context("Failed to compute class utilization")
        .map_err(AppError::database)?;

        for class in &mut class_utilization {
            class.utilization = utilization_percent(class.student_count, class.capacity);
        }

        Ok(DashboardStats {
            total_classes: totals.total_classes,
            total_students: totals.total_students,
            total_teachers: totals.total_teachers,
            total_parents: totals.total_parents,
            enrolled_students: totals.enrolled_students,
            unassigned_students: (totals.total_students - totals.enrolled_students).max(0),
            pending_enrollment_requests: totals.pending_enrollment_requests,
            class_utilization,
        })
    }

    #[instrument(skip(db))]
    pub async fn list_enrollment_requests(
        db: &PgPool,
        filters: EnrollmentRequestFilterParams,
    ) -> Result<Vec<EnrollmentRequestView>, AppError> {
        let sql = match filters.status {
            Some(_) => format!("{} WHERE r.status = $1 ORDER BY r.created_at DESC", ENROLLMENT_REQUEST_SELECT),
            None => format!("{} ORDER BY r.created_at DESC", ENROLLMENT_REQUEST_SELECT),
        };
        let mut query = sqlx::query_as::<_, EnrollmentRequestView>(&sql);
        if let Some(status) = filters.status {
            query = query.bind(status);
        }
        query
            .fetch_all(db)
            .await
            .context("Failed to fetch enrollment requests")
            .map_err(AppError::database)
    }

    async fn get_enrollment_request(db: &PgPool, id: Uuid) -> Result<EnrollmentRequestView, AppError> {
        sqlx::query_as::<_, EnrollmentRequestView>(&format!("{} WHERE r.id = $1", ENROLLMENT_REQUEST_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch enrollment request")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Enrollment request not found")))
    }

    async fn lock_pending_request(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<EnrollmentRequest, AppError> {
        let request = sqlx::query_as::<_, EnrollmentRequest>(
            r#"SELECT id, parent_id, student_id, class_id, status, notes, reviewed_by, reviewed_at, created_at
               FROM enrollment_requests
               WHERE id = $1
               FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch enrollment request")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Enrollment request not found")))?;

        if request.status != EnrollmentRequestStatus::Pending {
            return Err(AppError::bad_request(anyhow!(
                "This enrollment request has already been {}.",
                request.status
            )));
        }
        Ok(request)
    }

    async fn mark_reviewed(
        conn: &mut PgConnection,
        id: Uuid,
        status: EnrollmentRequestStatus,
        reviewer_user_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"UPDATE enrollment_requests
               SET status = $2, reviewed_by = $3, reviewed_at = NOW(), updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewer_user_id)
        .execute(&mut *conn)
        .await
        .context("Failed to update enrollment request")
        .map_err(AppError::database)?;
        Ok(())
    }

    /// Enrolls the child after re-checking capacity, then marks the request
    /// approved.
    #[instrument(skip(db))]
    pub async fn approve_enrollment_request(
        db: &PgPool,
        id: Uuid,
        reviewer_user_id: Uuid,
    ) -> Result<EnrollmentRequestView, AppError> {
        let mut tx = begin(db).await?;

        let request = Self::lock_pending_request(&mut tx, id).await?;
        let class = lock_active_class(&mut tx, request.class_id).await?;
        let student_ids = [request.student_id];
        ensure_students_active(&mut tx, &student_ids).await?;
        ensure_capacity(&mut tx, request.class_id, &class, &student_ids).await?;
        enroll_students(&mut tx, request.class_id, &student_ids).await?;
        Self::mark_reviewed(&mut tx, id, EnrollmentRequestStatus::Approved, reviewer_user_id).await?;

        commit(tx).await?;
        info!(request_id = %id, "Enrollment request approved");

        Self::get_enrollment_request(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn reject_enrollment_request(
        db: &PgPool,
        id: Uuid,
        reviewer_user_id: Uuid,
    ) -> Result<EnrollmentRequestView, AppError> {
        let mut tx = begin(db).await?;

        Self::lock_pending_request(&mut tx, id).await?;
        Self::mark_reviewed(&mut tx, id, EnrollmentRequestStatus::Rejected, reviewer_user_id).await?;

        commit(tx).await?;
        info!(request_id = %id, "Enrollment request rejected");

        Self::get_enrollment_request(db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_keeps_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_ids(&[a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn test_check_capacity() {
        assert!(check_capacity("Sunflowers", 20, 18, 2).is_ok());
        assert!(check_capacity("Sunflowers", 20, 0, 0).is_ok());

        let err = check_capacity("Sunflowers", 20, 19, 2).unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.message().contains("1 of 20"));
    }

    #[test]
    fn test_check_capacity_over_full_class() {
        let err = check_capacity("Sunflowers", 10, 12, 1).unwrap_err();
        assert!(err.message().contains("0 of 10"));
    }
}
