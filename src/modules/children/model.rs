pub use nursery_models::attendance::MonthlyAttendance;
pub use nursery_models::children::{
    AddChildDto, AddChildResponse, AvailableClass, Child, ChildRow, ChildrenSummary, ClassGroup,
    RequestEnrollmentDto, RequestEnrollmentResponse, UpdateChildDto, YearQuery,
    monthly_attendance, monthly_learning_hours, parse_gender,
};
pub use nursery_models::learning::MonthlyLearningHours;

/// A parent's linked, active children with relationship and enrollment.
pub(crate) const CHILD_SELECT: &str = r#"SELECT s.id, s.student_name, s.student_code, s.date_of_birth, s.gender,
       s.avatar_url, s.medical_conditions, r.relationship_type, r.is_primary_contact,
       r.pickup_authorized, c.id AS class_id, c.class_name, c.class_code, e.enrollment_date,
       s.created_at
FROM parent_student_relationships r
JOIN students s ON s.id = r.student_id
LEFT JOIN class_student_enrollments e ON e.student_id = s.id AND e.is_active = true
LEFT JOIN classes c ON c.id = e.class_id
WHERE r.parent_id = $1 AND s.is_active = true"#;
