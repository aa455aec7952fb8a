//! Learning-activity catalog, recorded class sessions and per-student
//! participation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nursery_core::serde::{deserialize_optional_bool, deserialize_optional_date, deserialize_optional_uuid};
use nursery_core::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::enums::{ActivityCategory, ParticipationLevel};

pub const MAX_SESSION_MINUTES: i32 = 480;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LearningActivity {
    pub id: Uuid,
    pub activity_name: String,
    pub description: Option<String>,
    pub category: ActivityCategory,
    pub age_group: Option<String>,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLearningActivityDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub activity_name: String,
    pub description: Option<String>,
    pub category: ActivityCategory,
    #[validate(length(max = 50))]
    pub age_group: Option<String>,
    /// Defaults to 30
    #[validate(range(min = 1, max = 480))]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLearningActivityDto {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub activity_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ActivityCategory>,
    #[validate(length(max = 50))]
    pub age_group: Option<String>,
    #[validate(range(min = 1, max = 480))]
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityFilterParams {
    /// Matches activity name
    pub search: Option<String>,
    pub category: Option<ActivityCategory>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
}

fn default_present() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StudentRecordInput {
    pub student_id: Uuid,
    #[serde(default = "default_present")]
    pub was_present: bool,
    pub participation_level: Option<ParticipationLevel>,
    #[validate(length(max = 1000))]
    pub individual_notes: Option<String>,
}

fn validate_activity_source(dto: &RecordSessionDto) -> Result<(), ValidationError> {
    let has_inline = dto.title.as_deref().is_some_and(|t| !t.trim().is_empty());
    if dto.activity_id.is_none() && !has_inline {
        let mut err = ValidationError::new("activity_required");
        err.message = Some("Provide an activity_id or a title and category.".into());
        return Err(err);
    }
    if dto.activity_id.is_none() && dto.category.is_none() {
        let mut err = ValidationError::new("category_required");
        err.message = Some("A category is required when creating a new activity.".into());
        return Err(err);
    }
    if let (Some(start), Some(end)) = (dto.start_time, dto.end_time)
        && end <= start
    {
        let mut err = ValidationError::new("end_before_start");
        err.message = Some("End time must be after start time.".into());
        return Err(err);
    }
    Ok(())
}

/// A class session to log. Either references a catalog entry through
/// `activity_id` or creates one from `title` + `category`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_activity_source"))]
pub struct RecordSessionDto {
    pub class_id: Uuid,
    pub session_date: NaiveDate,
    pub activity_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub category: Option<ActivityCategory>,
    #[validate(range(min = 1, max = 480, message = "Duration must be between 1 and 480 minutes."))]
    pub duration_minutes: i32,
    #[schema(value_type = Option<String>, example = "09:30:00")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "10:15:00")]
    pub end_time: Option<NaiveTime>,
    pub learning_objectives: Option<String>,
    pub materials_used: Option<String>,
    pub notes: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub student_records: Vec<StudentRecordInput>,
}

/// Session row joined with class and activity names.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LearningSession {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub teacher_id: Uuid,
    pub activity_id: Uuid,
    pub activity_name: String,
    pub category: ActivityCategory,
    pub session_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: i32,
    pub learning_objectives: Option<String>,
    pub materials_used: Option<String>,
    pub notes: Option<String>,
    pub attendance_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentLearningRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub was_present: bool,
    pub participation_level: Option<ParticipationLevel>,
    pub individual_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LearningSessionDetail {
    #[serde(flatten)]
    pub session: LearningSession,
    pub student_records: Vec<StudentLearningRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
}

/// Learning hours for one month of a child's year.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyLearningHours {
    #[schema(example = "Jan")]
    pub month: String,
    pub hours: f64,
}

/// Converts minutes to hours rounded to one decimal place.
pub fn minutes_to_hours(minutes: i64) -> f64 {
    ((minutes as f64 / 60.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_dto(json: &str) -> RecordSessionDto {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minutes_to_hours() {
        assert_eq!(minutes_to_hours(0), 0.0);
        assert_eq!(minutes_to_hours(90), 1.5);
        assert_eq!(minutes_to_hours(100), 1.7);
        assert_eq!(minutes_to_hours(45), 0.8);
    }

    #[test]
    fn test_record_session_with_catalog_activity() {
        let dto = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03",
                "activity_id":"3f0f4c1e-2b6a-4c8e-8d9a-7f5e9b2c1a00","duration_minutes":45,
                "student_records":[{"student_id":"1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9"}]}"#,
        );
        assert!(dto.validate().is_ok());
        assert!(dto.student_records[0].was_present);
    }

    #[test]
    fn test_record_session_needs_activity_or_title() {
        let dto = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03","duration_minutes":45}"#,
        );
        assert!(dto.validate().is_err());

        let inline = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03",
                "title":"Finger painting","category":"art","duration_minutes":45}"#,
        );
        assert!(inline.validate().is_ok());

        let no_category = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03",
                "title":"Finger painting","duration_minutes":45}"#,
        );
        assert!(no_category.validate().is_err());
    }

    #[test]
    fn test_record_session_end_must_follow_start() {
        let dto = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03",
                "title":"Story time","category":"language","duration_minutes":30,
                "start_time":"10:00:00","end_time":"09:30:00"}"#,
        );
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_record_session_duration_bounds() {
        let dto = record_dto(
            r#"{"class_id":"8a1c4a5e-3c0f-4b55-9d0e-1b1f7c1b2a10","session_date":"2025-03-03",
                "title":"Nap","category":"other","duration_minutes":481}"#,
        );
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("duration_minutes"));
    }
}
