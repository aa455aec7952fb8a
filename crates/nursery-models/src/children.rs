//! The parent portal: a parent's linked children, their enrollment
//! requests and yearly progress.

use chrono::{DateTime, NaiveDate, Utc};
use nursery_core::validation::{age_in_years, validate_child_birth_date, validate_child_name};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::assignments::EnrollmentRequest;
use crate::attendance::MonthlyAttendance;
use crate::enums::{AttendanceStatus, Gender, RelationshipType};
use crate::learning::{MonthlyLearningHours, minutes_to_hours};
use crate::students::CurrentClass;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Accepts any casing of a [`Gender`] value.
pub fn validate_gender(value: &str) -> Result<(), ValidationError> {
    parse_gender(value).map(|_| ()).ok_or_else(|| {
        let mut err = ValidationError::new("gender");
        err.message = Some("Gender must be one of: male, female, other.".into());
        err
    })
}

pub fn parse_gender(value: &str) -> Option<Gender> {
    value.trim().to_lowercase().parse().ok()
}

/// Student row joined with the parent relationship and active enrollment.
#[derive(Debug, Clone, FromRow)]
pub struct ChildRow {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
    pub relationship_type: RelationshipType,
    pub is_primary_contact: bool,
    pub pickup_authorized: bool,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub class_code: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Child {
    pub id: Uuid,
    pub student_name: String,
    pub student_code: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub gender: Gender,
    pub avatar_url: Option<String>,
    pub medical_conditions: Option<String>,
    pub relationship_type: RelationshipType,
    pub is_primary_contact: bool,
    pub pickup_authorized: bool,
    pub current_class: Option<CurrentClass>,
    pub created_at: DateTime<Utc>,
}

impl ChildRow {
    pub fn into_child(self, today: NaiveDate) -> Child {
        let current_class = match (self.class_id, self.class_name, self.class_code, self.enrollment_date) {
            (Some(id), Some(class_name), Some(class_code), Some(enrollment_date)) => {
                Some(CurrentClass {
                    id,
                    class_name,
                    class_code,
                    enrollment_date,
                })
            }
            _ => None,
        };

        Child {
            id: self.id,
            age: age_in_years(self.date_of_birth, today),
            student_name: self.student_name,
            student_code: self.student_code,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            avatar_url: self.avatar_url,
            medical_conditions: self.medical_conditions,
            relationship_type: self.relationship_type,
            is_primary_contact: self.is_primary_contact,
            pickup_authorized: self.pickup_authorized,
            current_class,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddChildDto {
    #[validate(custom(function = "validate_child_name"))]
    pub student_name: String,
    #[validate(custom(function = "validate_child_birth_date"))]
    pub date_of_birth: NaiveDate,
    #[validate(custom(function = "validate_gender"))]
    #[schema(example = "female")]
    pub gender: String,
    pub medical_conditions: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub relationship_type: RelationshipType,
    /// Defaults to `false`
    pub is_primary_contact: Option<bool>,
    /// Defaults to `true`
    pub pickup_authorized: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddChildResponse {
    pub message: String,
    pub child: Child,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateChildDto {
    #[validate(custom(function = "validate_child_name"))]
    pub student_name: Option<String>,
    #[validate(custom(function = "validate_child_birth_date"))]
    pub date_of_birth: Option<NaiveDate>,
    #[validate(custom(function = "validate_gender"))]
    pub gender: Option<String>,
    pub medical_conditions: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub relationship_type: Option<RelationshipType>,
    pub is_primary_contact: Option<bool>,
    pub pickup_authorized: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassGroup {
    pub class_id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChildrenSummary {
    pub total_children: usize,
    pub enrolled: usize,
    pub unenrolled: usize,
    pub by_class: Vec<ClassGroup>,
    pub unassigned: Vec<Child>,
}

impl ChildrenSummary {
    /// Groups children by their current class, keeping first-seen class order.
    pub fn from_children(children: Vec<Child>) -> Self {
        let total_children = children.len();
        let mut by_class: Vec<ClassGroup> = Vec::new();
        let mut unassigned = Vec::new();

        for child in children {
            let Some(class) = child.current_class.clone() else {
                unassigned.push(child);
                continue;
            };
            match by_class.iter_mut().find(|g| g.class_id == class.id) {
                Some(group) => group.children.push(child),
                None => by_class.push(ClassGroup {
                    class_id: class.id,
                    class_name: class.class_name,
                    class_code: class.class_code,
                    children: vec![child],
                }),
            }
        }

        Self {
            total_children,
            enrolled: total_children - unassigned.len(),
            unenrolled: unassigned.len(),
            by_class,
            unassigned,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AvailableClass {
    pub id: Uuid,
    pub class_name: String,
    pub class_code: String,
    pub age_group: Option<String>,
    pub capacity: i32,
    pub room_number: Option<String>,
    pub academic_year: Option<String>,
    pub student_count: i64,
    pub available_spots: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RequestEnrollmentDto {
    pub class_id: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestEnrollmentResponse {
    pub message: String,
    pub request: EnrollmentRequest,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Four-digit year, defaults to the current year
    pub year: Option<String>,
}

impl YearQuery {
    /// `None` when the supplied year is not a four-digit number.
    pub fn resolve(&self, current_year: i32) -> Option<i32> {
        match self.year.as_deref().map(str::trim) {
            None | Some("") => Some(current_year),
            Some(raw) if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) => {
                raw.parse().ok()
            }
            Some(_) => None,
        }
    }
}

/// Twelve monthly buckets from `(month, minutes)` pairs, months 1-based.
pub fn monthly_learning_hours(rows: &[(i32, i64)]) -> Vec<MonthlyLearningHours> {
    let mut minutes = [0i64; 12];
    for &(month, total) in rows {
        if (1..=12).contains(&month) {
            minutes[(month - 1) as usize] += total;
        }
    }
    MONTH_NAMES
        .iter()
        .zip(minutes)
        .map(|(name, total)| MonthlyLearningHours {
            month: (*name).to_string(),
            hours: minutes_to_hours(total),
        })
        .collect()
}

/// Twelve monthly buckets from `(month, status, count)` rows. Early
/// departures land in no bucket.
pub fn monthly_attendance(rows: &[(i32, AttendanceStatus, i64)]) -> Vec<MonthlyAttendance> {
    let mut buckets: Vec<MonthlyAttendance> = MONTH_NAMES
        .iter()
        .map(|name| MonthlyAttendance {
            month: (*name).to_string(),
            present: 0,
            absent: 0,
            late: 0,
        })
        .collect();

    for &(month, status, count) in rows {
        let Some(bucket) = usize::try_from(month - 1)
            .ok()
            .and_then(|i| buckets.get_mut(i))
        else {
            continue;
        };
        match status {
            AttendanceStatus::Present => bucket.present += count,
            AttendanceStatus::Absent => bucket.absent += count,
            AttendanceStatus::Late => bucket.late += count,
            AttendanceStatus::EarlyDeparture => {}
        }
    }
    buckets
}
