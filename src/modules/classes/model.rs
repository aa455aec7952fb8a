pub use nursery_models::classes::{
    BulkUnassignResponse, Class, ClassDetail, ClassFilterParams, ClassStudentInfo,
    ClassTeacherInfo, ClassWithStats, CreateClassDto, PaginatedClassesResponse, UpdateClassDto,
};

pub const DEFAULT_CAPACITY: i32 = 20;

/// Classes joined with live counts of active, enrolled students and
/// distinct active teachers. `available_spots` never goes below zero.
pub(crate) const CLASS_STATS_SELECT: &str = r#"SELECT c.id, c.class_name, c.class_code, c.age_group, c.capacity,
       c.room_number, c.academic_year, c.is_active,
       COALESCE(s.student_count, 0)::BIGINT AS student_count,
       COALESCE(t.teacher_count, 0)::BIGINT AS teacher_count,
       GREATEST(c.capacity - COALESCE(s.student_count, 0), 0)::BIGINT AS available_spots,
       c.created_at, c.updated_at
FROM classes c
LEFT JOIN (
    SELECT e.class_id, COUNT(*) AS student_count
    FROM class_student_enrollments e
    JOIN students st ON st.id = e.student_id
    WHERE e.is_active = true AND st.is_active = true
    GROUP BY e.class_id
) s ON s.class_id = c.id
LEFT JOIN (
    SELECT class_id, COUNT(DISTINCT teacher_id) AS teacher_count
    FROM class_teacher_assignments
    WHERE is_active = true
    GROUP BY class_id
) t ON t.class_id = c.id"#;
