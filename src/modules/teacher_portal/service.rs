use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use nursery_core::AppError;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use super::model::{ClassStudentInfo, MarkedDatesResponse, MyClass, ParentContact, StudentWithParents};
use crate::modules::classes::service::ClassService;
use crate::modules::students::model::{PARENT_CONTACT_COLUMNS, PARENT_CONTACT_JOINS};
use crate::utils::auth_helpers::{ensure_teacher_assigned, teacher_id_for_user};

#[derive(Debug, FromRow)]
struct StudentParentRow {
    student_id: Uuid,
    #[sqlx(flatten)]
    contact: ParentContact,
}

#[derive(Debug, FromRow)]
struct MedicalRow {
    id: Uuid,
    medical_conditions: Option<String>,
}

pub struct TeacherPortalService;

impl TeacherPortalService {
    #[instrument(skip(db))]
    pub async fn my_classes(db: &PgPool, user_id: Uuid) -> Result<Vec<MyClass>, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;

        sqlx::query_as::<_, MyClass>(
            r#"SELECT c.id, c.class_name, c.class_code, c.age_group, c.capacity, c.room_number,
                      c.academic_year, a.role, a.assigned_date,
                      (SELECT COUNT(*) FROM class_student_enrollments e
                         JOIN students s ON s.id = e.student_id
                         WHERE e.class_id = c.id AND e.is_active = true AND s.is_active = true) AS student_count
               FROM class_teacher_assignments a
               JOIN classes c ON c.id = a.class_id
               WHERE a.teacher_id = $1 AND a.is_active = true AND c.is_active = true
               ORDER BY c.class_name"#,
        )
        .bind(teacher_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch teacher classes")
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn class_students(
        db: &PgPool,
        user_id: Uuid,
        class_id: Uuid,
    ) -> Result<Vec<ClassStudentInfo>, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, class_id).await?;
        ClassService::class_students(db, class_id).await
    }

    /// Roster with each child's parent contacts and medical notes.
    #[instrument(skip(db))]
    pub async fn class_students_with_parents(
        db: &PgPool,
        user_id: Uuid,
        class_id: Uuid,
    ) -> Result<Vec<StudentWithParents>, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, class_id).await?;

        let students = ClassService::class_students(db, class_id).await?;
        let student_ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();

        let medical: HashMap<Uuid, Option<String>> = sqlx::query_as::<_, MedicalRow>(
            "SELECT id, medical_conditions FROM students WHERE id = ANY($1)",
        )
        .bind(&student_ids)
        .fetch_all(db)
        .await
        .context("Failed to fetch medical conditions")
        .map_err(AppError::database)?
        .into_iter()
        .map(|row| (row.id, row.medical_conditions))
        .collect();

        let rows = sqlx::query_as::<_, StudentParentRow>(&format!(
            "SELECT r.student_id, {} {} WHERE r.student_id = ANY($1) ORDER BY r.is_primary_contact DESC, u.first_name",
            PARENT_CONTACT_COLUMNS, PARENT_CONTACT_JOINS
        ))
        .bind(&student_ids)
        .fetch_all(db)
        .await
        .context("Failed to fetch parent contacts")
        .map_err(AppError::database)?;

        let mut parents: HashMap<Uuid, Vec<ParentContact>> = HashMap::new();
        for row in rows {
            parents.entry(row.student_id).or_default().push(row.contact);
        }

        Ok(students
            .into_iter()
            .map(|student| StudentWithParents {
                medical_conditions: medical.get(&student.id).cloned().flatten(),
                parents: parents.remove(&student.id).unwrap_or_default(),
                student,
            })
            .collect())
    }

    /// Distinct dates with attendance recorded for the class, newest first.
    #[instrument(skip(db))]
    pub async fn class_marked_dates(
        db: &PgPool,
        user_id: Uuid,
        class_id: Uuid,
    ) -> Result<MarkedDatesResponse, AppError> {
        let teacher_id = teacher_id_for_user(db, user_id).await?;
        ensure_teacher_assigned(db, teacher_id, class_id).await?;

        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"SELECT DISTINCT attendance_date FROM daily_attendance
               WHERE class_id = $1
               ORDER BY attendance_date DESC"#,
        )
        .bind(class_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch marked dates")
        .map_err(AppError::database)?;

        Ok(MarkedDatesResponse { class_id, dates })
    }
}
