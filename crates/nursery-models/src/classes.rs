//! Classes, their rosters and the teacher portal views over them.

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::serde::deserialize_optional_bool;
use nursery_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::enums::{Gender, RelationshipType, TeacherRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub age_group: Option<String>,
    pub capacity: i32,
    pub room_number: Option<String>,
    pub academic_year: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A class with live enrollment counts.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassWithStats {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub age_group: Option<String>,
    pub capacity: i32,
    pub room_number: Option<String>,
    pub academic_year: Option<String>,
    pub is_active: bool,
    pub student_count: i64,
    pub teacher_count: i64,
    pub available_spots: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassStudentInfo {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub avatar_url: Option<String>,
    pub enrollment_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassTeacherInfo {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub employee_id: String,
    pub role: TeacherRole,
    pub assigned_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: ClassWithStats,
    pub students: Vec<ClassStudentInfo>,
    pub teachers: Vec<ClassTeacherInfo>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 100, message = "Class name is required."))]
    pub class_name: String,
    #[validate(length(min = 1, max = 20, message = "Class code must be 1-20 characters."))]
    pub class_code: String,
    #[validate(length(max = 50))]
    pub age_group: Option<String>,
    /// Defaults to 20
    #[validate(range(min = 1, max = 500, message = "Capacity must be at least 1."))]
    pub capacity: Option<i32>,
    #[validate(length(max = 20))]
    pub room_number: Option<String>,
    #[validate(length(max = 20))]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub class_name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub class_code: Option<String>,
    #[validate(length(max = 50))]
    pub age_group: Option<String>,
    #[validate(range(min = 1, max = 500, message = "Capacity must be at least 1."))]
    pub capacity: Option<i32>,
    #[validate(length(max = 20))]
    pub room_number: Option<String>,
    #[validate(length(max = 20))]
    pub academic_year: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassFilterParams {
    /// Matches class name, code or age group
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub data: Vec<ClassWithStats>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUnassignResponse {
    pub message: String,
    pub count: u64,
}

/// A class as seen by one of its teachers.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MyClass {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub age_group: Option<String>,
    pub capacity: i32,
    pub room_number: Option<String>,
    pub academic_year: Option<String>,
    pub role: TeacherRole,
    pub assigned_date: NaiveDate,
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ParentContact {
    pub parent_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub relationship_type: RelationshipType,
    pub is_primary_contact: bool,
    pub pickup_authorized: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentWithParents {
    #[serde(flatten)]
    pub student: ClassStudentInfo,
    pub medical_conditions: Option<String>,
    pub parents: Vec<ParentContact>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkedDatesResponse {
    pub class_id: Uuid,
    /// Newest first
    pub dates: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_class_capacity_must_be_positive() {
        let dto: CreateClassDto =
            serde_json::from_str(r#"{"class_name":"Sunflowers","class_code":"SUN-A","capacity":0}"#)
                .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("capacity"));
    }

    #[test]
    fn test_create_class_defaults_are_optional() {
        let dto: CreateClassDto =
            serde_json::from_str(r#"{"class_name":"Sunflowers","class_code":"SUN-A"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert!(dto.capacity.is_none());
    }

    #[test]
    fn test_class_detail_flattens_class_fields() {
        let now = Utc::now();
        let detail = ClassDetail {
            class: ClassWithStats {
                id: Uuid::new_v4(),
                class_name: "Sunflowers".into(),
                class_code: "SUN-A".into(),
                age_group: Some("3-4".into()),
                capacity: 20,
                room_number: None,
                academic_year: None,
                is_active: true,
                student_count: 18,
                teacher_count: 2,
                available_spots: 2,
                created_at: now,
                updated_at: now,
            },
            students: vec![],
            teachers: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["class_code"], "SUN-A");
        assert_eq!(json["available_spots"], 2);
        assert!(json["students"].as_array().unwrap().is_empty());
    }
}
