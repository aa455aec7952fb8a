pub use nursery_models::classes::ParentContact;
pub use nursery_models::students::{
    CreateStudentDto, CurrentClass, EnrollmentStatusFilter, PaginatedStudentsResponse, Student,
    StudentDetail, StudentFilterParams, StudentWithClass, UpdateStudentDto,
};

pub(crate) const STUDENT_COLUMNS: &str = "s.id, s.student_name, s.student_code, s.date_of_birth, s.gender, s.avatar_url, \
     s.medical_conditions, s.is_active, s.created_at, s.updated_at";

/// Students left-joined to their active enrollment and its class.
pub(crate) const STUDENT_WITH_CLASS_SELECT: &str = r#"SELECT s.id, s.student_name, s.student_code, s.date_of_birth, s.gender,
       s.avatar_url, s.medical_conditions, s.is_active,
       c.id AS class_id, c.class_name, c.class_code, e.enrollment_date, s.created_at
FROM students s
LEFT JOIN class_student_enrollments e ON e.student_id = s.id AND e.is_active = true
LEFT JOIN classes c ON c.id = e.class_id"#;

pub(crate) const PARENT_CONTACT_COLUMNS: &str = "p.id AS parent_id, u.first_name, u.last_name, u.email, u.phone_number, \
     p.emergency_contact, r.relationship_type, r.is_primary_contact, r.pickup_authorized";

pub(crate) const PARENT_CONTACT_JOINS: &str = r#"FROM parent_student_relationships r
JOIN parents p ON p.id = r.parent_id
JOIN users u ON u.id = p.user_id"#;
