//! Daily attendance marked by teachers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nursery_core::serde::{deserialize_optional_date, deserialize_optional_uuid};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::enums::AttendanceStatus;

/// Attendance row joined with the student's name and code.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub attendance_date: NaiveDate,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, example = "08:15:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "12:30:00")]
    pub check_out_time: Option<NaiveTime>,
    pub marked_by_teacher_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_times(record: &AttendanceRecordInput) -> Result<(), ValidationError> {
    check_out_not_before_check_in(record.check_in_time, record.check_out_time)
}

pub fn check_out_not_before_check_in(
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
) -> Result<(), ValidationError> {
    match (check_in, check_out) {
        (Some(i), Some(o)) if o < i => {
            let mut err = ValidationError::new("check_out_before_check_in");
            err.message = Some("Check-out time cannot be before check-in time.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_times", skip_on_field_errors = false))]
pub struct AttendanceRecordInput {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, example = "08:15:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "12:30:00")]
    pub check_out_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub class_id: Uuid,
    /// `YYYY-MM-DD`, not in the future
    pub attendance_date: NaiveDate,
    #[validate(
        length(min = 1, message = "At least one attendance record is required."),
        nested
    )]
    pub attendance_records: Vec<AttendanceRecordInput>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub message: String,
    pub class_id: Uuid,
    pub attendance_date: NaiveDate,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_times"))]
pub struct UpdateAttendanceDto {
    pub status: Option<AttendanceStatus>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[schema(value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
}

fn validate_update_times(dto: &UpdateAttendanceDto) -> Result<(), ValidationError> {
    check_out_not_before_check_in(dto.check_in_time, dto.check_out_time)
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilterParams {
    /// Required
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub attendance_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
}

/// Per-month attendance totals for one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyAttendance {
    #[schema(example = "Jan")]
    pub month: String,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_mark_attendance_requires_records() {
        let dto = MarkAttendanceDto {
            class_id: Uuid::new_v4(),
            attendance_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            attendance_records: vec![],
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.errors().contains_key("attendance_records"));
    }

    #[test]
    fn test_record_rejects_check_out_before_check_in() {
        let record = AttendanceRecordInput {
            student_id: Uuid::new_v4(),
            status: AttendanceStatus::Present,
            notes: None,
            check_in_time: Some(time(9, 0)),
            check_out_time: Some(time(8, 0)),
        };
        assert!(record.validate().is_err());

        let ok = AttendanceRecordInput {
            check_out_time: Some(time(12, 0)),
            ..record
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_record_parses_wire_format() {
        let record: AttendanceRecordInput = serde_json::from_str(
            r#"{"student_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","status":"early_departure","check_in_time":"08:15:00"}"#,
        )
        .unwrap();
        assert_eq!(record.status, AttendanceStatus::EarlyDeparture);
        assert_eq!(record.check_in_time, Some(time(8, 15)));
    }

    #[test]
    fn test_filter_parses_dates() {
        let params: AttendanceFilterParams = serde_json::from_str(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","start_date":"2025-03-01","end_date":""}"#,
        )
        .unwrap();
        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(params.end_date.is_none());
    }
}
