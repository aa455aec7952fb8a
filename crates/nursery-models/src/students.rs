//! Student records managed by administrators.

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use nursery_core::validation::validate_child_name;
use nursery_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::classes::ParentContact;
use crate::enums::Gender;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal reference to the class a student is enrolled in.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CurrentClass {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub enrollment_date: NaiveDate,
}

/// Student row joined with the active enrollment, if any.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentWithClass {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
    pub is_active: bool,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub class_code: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl StudentWithClass {
    pub fn current_class(&self) -> Option<CurrentClass> {
        match (&self.class_id, &self.class_name, &self.class_code, self.enrollment_date) {
            (Some(id), Some(name), Some(code), Some(date)) => Some(CurrentClass {
                id: *id,
                class_name: name.clone(),
                class_code: code.clone(),
                enrollment_date: date,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub current_class: Option<CurrentClass>,
    pub parents: Vec<ParentContact>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(custom(function = "validate_child_name"))]
    pub student_name: String,
    /// Generated as `STU{year}{nnnn}` when omitted
    #[validate(length(min = 1, max = 50))]
    pub student_code: Option<String>,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(custom(function = "validate_child_name"))]
    pub student_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub student_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatusFilter {
    Enrolled,
    Unassigned,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    /// Matches student name or code
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    pub enrollment_status: Option<EnrollmentStatusFilter>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<StudentWithClass>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_class_requires_all_columns() {
        let mut row = StudentWithClass {
            id: Uuid::new_v4(),
            student_name: "Sasha Perera".into(),
            student_code: "STU20250001".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
            gender: Gender::Female,
            avatar_url: None,
            medical_conditions: None,
            is_active: true,
            class_id: None,
            class_name: None,
            class_code: None,
            enrollment_date: None,
            created_at: Utc::now(),
        };
        assert!(row.current_class().is_none());

        row.class_id = Some(Uuid::new_v4());
        row.class_name = Some("Butterflies".into());
        row.class_code = Some("BUT-1".into());
        row.enrollment_date = NaiveDate::from_ymd_opt(2025, 1, 6);
        assert_eq!(row.current_class().unwrap().class_code, "BUT-1");
    }

    #[test]
    fn test_filter_enrollment_status() {
        let params: StudentFilterParams =
            serde_json::from_str(r#"{"enrollment_status":"unassigned","class_id":""}"#).unwrap();
        assert_eq!(
            params.enrollment_status,
            Some(EnrollmentStatusFilter::Unassigned)
        );
        assert!(params.class_id.is_none());
    }

    #[test]
    fn test_create_student_rejects_bad_name() {
        let dto: CreateStudentDto = serde_json::from_str(
            r#"{"student_name":"X","date_of_birth":"2021-01-01","gender":"male"}"#,
        )
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
