//! Teacher-to-class assignments, student enrollments, enrollment requests
//! and the admin dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::enums::{EnrollmentRequestStatus, TeacherRole};
use crate::staff::TeacherClassInfo;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TeacherAssignment {
    pub id: Uuid,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
    pub role: TeacherRole,
    pub assigned_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A teacher with all of their active class assignments.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherAssignmentSummary {
    pub teacher_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub employee_id: String,
    pub is_active: bool,
    pub classes: Vec<TeacherClassInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatusFilter {
    Assigned,
    Unassigned,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterParams {
    /// Matches teacher name, email or employee id
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    pub assignment_status: Option<AssignmentStatusFilter>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignStudentsDto {
    pub teacher_id: Uuid,
    pub class_id: Uuid,
    #[validate(length(min = 1, message = "Select at least one student."))]
    pub student_ids: Vec<Uuid>,
    /// Role of the teacher in the class, defaults to `primary`
    pub role: Option<TeacherRole>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReassignStudentsDto {
    #[validate(length(min = 1, message = "Select at least one student."))]
    pub student_ids: Vec<Uuid>,
    /// When set, every student must currently be enrolled here
    pub from_class_id: Option<Uuid>,
    pub to_class_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentResult {
    pub message: String,
    pub class_id: Uuid,
    pub student_ids: Vec<Uuid>,
    pub enrolled_count: usize,
    /// Students that moved out of another class
    pub moved_count: usize,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignTeacherDto {
    pub teacher_id: Uuid,
    pub class_id: Uuid,
    pub role: Option<TeacherRole>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignTeacherResponse {
    pub message: String,
    pub assignment: TeacherAssignment,
    /// `false` when an earlier assignment was reactivated
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassUtilization {
    pub class_id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub capacity: i32,
    pub student_count: i64,
    /// Percent of capacity in use, one decimal place
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_classes: i64,
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_parents: i64,
    pub enrolled_students: i64,
    pub unassigned_students: i64,
    pub pending_enrollment_requests: i64,
    pub class_utilization: Vec<ClassUtilization>,
}

/// Rounds `count / capacity` as a percentage to one decimal place.
pub fn utilization_percent(count: i64, capacity: i32) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    let pct = count as f64 * 100.0 / f64::from(capacity);
    (pct * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EnrollmentRequest {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: EnrollmentRequestStatus,
    pub notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Enrollment request joined with the names an admin needs to review it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EnrollmentRequestView {
    pub id: Uuid,
    pub status: EnrollmentRequestStatus,
    pub notes: Option<String>,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub parent_id: Uuid,
    pub parent_name: String,
    pub parent_email: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnrollmentRequestFilterParams {
    pub status: Option<EnrollmentRequestStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_percent_rounding() {
        assert_eq!(utilization_percent(18, 20), 90.0);
        assert_eq!(utilization_percent(1, 3), 33.3);
        assert_eq!(utilization_percent(2, 3), 66.7);
        assert_eq!(utilization_percent(0, 20), 0.0);
        assert_eq!(utilization_percent(5, 0), 0.0);
    }

    #[test]
    fn test_assign_students_requires_students() {
        let dto = AssignStudentsDto {
            teacher_id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            student_ids: vec![],
            role: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_assignment_filter_parses_status() {
        let params: AssignmentFilterParams =
            serde_json::from_str(r#"{"assignment_status":"unassigned"}"#).unwrap();
        assert_eq!(
            params.assignment_status,
            Some(AssignmentStatusFilter::Unassigned)
        );
    }
}
