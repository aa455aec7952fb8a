pub use nursery_models::staff::{
    AdminResetPasswordDto, CreateTeacherDto, PaginatedTeachersResponse, StaffFilterParams,
    TeacherClassInfo, TeacherDetail, TeacherWithUser, UpdateTeacherDto,
};

pub(crate) const TEACHER_SELECT: &str = r#"SELECT t.id, t.user_id, t.employee_id, u.first_name, u.last_name, u.email,
       u.phone_number, t.subjects, t.qualification, t.experience_years, t.hire_date,
       t.is_active, t.password_change_required, u.is_email_verified, u.last_login, t.created_at
FROM teachers t
JOIN users u ON u.id = t.user_id"#;
