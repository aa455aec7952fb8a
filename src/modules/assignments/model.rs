pub use nursery_models::assignments::{
    AssignStudentsDto, AssignTeacherDto, AssignTeacherResponse, AssignmentFilterParams,
    AssignmentStatusFilter, ClassUtilization, DashboardStats, EnrollmentRequest,
    EnrollmentRequestFilterParams, EnrollmentRequestView, EnrollmentResult, ReassignStudentsDto,
    TeacherAssignment, TeacherAssignmentSummary, utilization_percent,
};
pub use nursery_models::staff::TeacherClassInfo;

pub(crate) const ENROLLMENT_REQUEST_SELECT: &str = r#"SELECT r.id, r.status, r.notes, r.student_id, s.student_name, s.student_code,
       r.class_id, c.class_name, r.parent_id, u.first_name || ' ' || u.last_name AS parent_name,
       u.email AS parent_email, r.reviewed_at, r.created_at
FROM enrollment_requests r
JOIN students s ON s.id = r.student_id
JOIN classes c ON c.id = r.class_id
JOIN parents p ON p.id = r.parent_id
JOIN users u ON u.id = p.user_id"#;

pub(crate) const ASSIGNMENT_COLUMNS: &str =
    "id, class_id, teacher_id, role, assigned_date, is_active, created_at, updated_at";
