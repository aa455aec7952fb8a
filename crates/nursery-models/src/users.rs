//! Users and their role profiles.
//!
//! Every account is one `users` row plus exactly one profile row matching its
//! [`UserType`]: `teachers`, `parents` or `admins`.

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::validation::{validate_person_name, validate_phone_number};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::enums::{AdminLevel, UserType};

/// Full `users` row, including credentials and one-shot tokens.
/// Never serialized; convert to [`UserResponse`] for output.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub email_verification_token: Option<Uuid>,
    pub email_verification_sent_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<Uuid>,
    pub password_reset_sent_at: Option<DateTime<Utc>>,
    pub must_change_password: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub must_change_password: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            user_type: row.user_type,
            is_active: row.is_active,
            is_email_verified: row.is_email_verified,
            must_change_password: row.must_change_password,
            last_login: row.last_login,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub employee_id: String,
    pub subjects: String,
    pub qualification: Option<String>,
    pub experience_years: i32,
    pub hire_date: NaiveDate,
    pub is_active: bool,
    pub password_change_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub occupation: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_level: AdminLevel,
    /// Map of permission key to boolean
    #[schema(value_type = Object)]
    pub permissions: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's account with whichever profile matches their user type.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_profile: Option<TeacherProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_profile: Option<ParentProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_profile: Option<AdminProfile>,
}

/// Self-service profile update. Fields that do not apply to the caller's
/// user type are ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(custom(function = "validate_person_name"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "validate_person_name"))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    /// Teachers only
    #[validate(length(min = 1, max = 255))]
    pub subjects: Option<String>,
    /// Teachers only
    pub qualification: Option<String>,
    /// Parents only
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    /// Parents only
    #[validate(custom(function = "validate_phone_number"))]
    pub emergency_contact: Option<String>,
    /// Parents only
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_validation() {
        let dto = UpdateProfileDto {
            first_name: Some("Amaya".into()),
            phone_number: Some("0771234567".into()),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());

        let bad_phone = UpdateProfileDto {
            phone_number: Some("12345".into()),
            ..Default::default()
        };
        let errors = bad_phone.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone_number"));

        let bad_name = UpdateProfileDto {
            last_name: Some("P3rera".into()),
            ..Default::default()
        };
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_user_response_hides_credentials() {
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "parent@example.com".into(),
            password: "$2b$12$hash".into(),
            first_name: "Nimal".into(),
            last_name: "Perera".into(),
            phone_number: None,
            user_type: UserType::Parent,
            is_active: true,
            is_email_verified: true,
            email_verification_token: Some(Uuid::new_v4()),
            email_verification_sent_at: Some(now),
            password_reset_token: None,
            password_reset_sent_at: None,
            must_change_password: false,
            is_superuser: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(row.full_name(), "Nimal Perera");

        let json = serde_json::to_value(UserResponse::from(row)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("email_verification_token").is_none());
        assert_eq!(json["user_type"], "parent");
    }
}
