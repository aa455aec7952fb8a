//! Teacher and admin account management (admin-facing).

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::serde::deserialize_optional_bool;
use nursery_core::validation::{
    validate_person_name, validate_phone_number, validate_strong_password,
};
use nursery_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::enums::{AdminLevel, TeacherRole};

/// Teacher profile joined with its user account.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TeacherWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub subjects: String,
    pub qualification: Option<String>,
    pub experience_years: i32,
    pub hire_date: NaiveDate,
    pub is_active: bool,
    pub password_change_required: bool,
    pub is_email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A class a teacher is actively assigned to.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TeacherClassInfo {
    pub assignment_id: Uuid,
    pub class_id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub role: TeacherRole,
    pub assigned_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherDetail {
    #[serde(flatten)]
    pub teacher: TeacherWithUser,
    pub classes: Vec<TeacherClassInfo>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTeacherDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: String,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(custom(function = "validate_strong_password"))]
    pub password: String,
    /// Generated as `TCH0001`, `TCH0002`, ... when omitted
    #[validate(length(min = 1, max = 50))]
    pub employee_id: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub subjects: Option<String>,
    pub qualification: Option<String>,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: Option<i32>,
    /// Defaults to today
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTeacherDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: Option<String>,
    /// Changing the email marks the account unverified
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_id: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub subjects: Option<String>,
    pub qualification: Option<String>,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: Option<i32>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaffFilterParams {
    /// Matches name, email or employee id (teachers)
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedTeachersResponse {
    pub data: Vec<TeacherWithUser>,
    pub meta: PaginationMeta,
}

/// Admin profile joined with its user account.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub admin_level: AdminLevel,
    #[schema(value_type = Object)]
    pub permissions: serde_json::Value,
    pub is_active: bool,
    pub is_superuser: bool,
    pub must_change_password: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdminDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: String,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(custom(function = "validate_strong_password"))]
    pub password: String,
    /// Defaults to `admin`
    pub admin_level: Option<AdminLevel>,
    /// Defaults to the standard set for the chosen level
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAdminDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    pub admin_level: Option<AdminLevel>,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedAdminsResponse {
    pub data: Vec<AdminWithUser>,
    pub meta: PaginationMeta,
}

/// Password set by an administrator on someone else's account.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AdminResetPasswordDto {
    #[validate(custom(function = "validate_strong_password"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_teacher_minimal() {
        let dto: CreateTeacherDto = serde_json::from_str(
            r#"{"first_name":"Kamal","last_name":"Fernando","email":"kamal@example.com","password":"Teach#2024x"}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());
        assert!(dto.employee_id.is_none());
    }

    #[test]
    fn test_create_teacher_rejects_negative_experience() {
        let dto: CreateTeacherDto = serde_json::from_str(
            r#"{"first_name":"Kamal","last_name":"Fernando","email":"kamal@example.com","password":"Teach#2024x","experience_years":-1}"#,
        )
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("experience_years"));
    }

    #[test]
    fn test_staff_filter_from_query_strings() {
        let params: StaffFilterParams =
            serde_json::from_str(r#"{"search":"kam","is_active":"true","page":"2"}"#).unwrap();
        assert_eq!(params.is_active, Some(true));
        assert_eq!(params.pagination.page(), 2);
    }

    #[test]
    fn test_create_admin_level() {
        let dto: CreateAdminDto = serde_json::from_str(
            r#"{"first_name":"Ruwan","last_name":"Jayasuriya","email":"ruwan@example.com","password":"Admin#2024x","admin_level":"moderator"}"#,
        )
        .unwrap();
        assert_eq!(dto.admin_level, Some(AdminLevel::Moderator));
    }
}
