pub use nursery_models::attendance::{
    AttendanceFilterParams, AttendanceRecord, AttendanceRecordInput, MarkAttendanceDto,
    MarkAttendanceResponse, UpdateAttendanceDto, check_out_not_before_check_in,
};

pub(crate) const ATTENDANCE_SELECT: &str = r#"SELECT a.id, a.class_id, a.student_id, s.student_name, s.student_code,
       a.attendance_date, a.status, a.check_in_time, a.check_out_time,
       a.marked_by_teacher_id, a.notes, a.created_at, a.updated_at
FROM daily_attendance a
JOIN students s ON s.id = a.student_id"#;
