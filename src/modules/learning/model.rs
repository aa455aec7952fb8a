pub use nursery_models::learning::{
    ActivityFilterParams, CreateLearningActivityDto, LearningActivity, LearningSession,
    LearningSessionDetail, RecordSessionDto, SessionFilterParams, StudentLearningRecord,
    StudentRecordInput, UpdateLearningActivityDto,
};

pub const DEFAULT_ACTIVITY_MINUTES: i32 = 30;

pub(crate) const ACTIVITY_COLUMNS: &str = "id, activity_name, description, category, age_group, duration_minutes, \
     is_active, created_at, updated_at";

pub(crate) const SESSION_SELECT: &str = r#"SELECT ls.id, ls.class_id, c.class_name, ls.teacher_id, ls.activity_id,
       la.activity_name, la.category, ls.session_date, ls.start_time, ls.end_time,
       ls.duration_minutes, ls.learning_objectives, ls.materials_used, ls.notes,
       ls.attendance_count, ls.created_at
FROM class_learning_sessions ls
JOIN classes c ON c.id = ls.class_id
JOIN learning_activities la ON la.id = ls.activity_id"#;
