//! # Nursery Models
//!
//! Database rows, request/response DTOs and validation schemas shared by the
//! API and the CLI.
//!
//! # Modules
//!
//! - [`enums`]: text-backed vocabularies (user types, statuses, categories)
//! - [`users`]: users and their teacher, parent and admin profiles
//! - [`auth`]: registration, login, tokens and password flows
//! - [`staff`]: admin management of teachers and admins
//! - [`classes`]: classes, rosters and teacher portal views
//! - [`students`]: student records
//! - [`assignments`]: teacher assignments, enrollments and requests
//! - [`attendance`]: daily attendance
//! - [`learning`]: learning activities and sessions
//! - [`children`]: the parent portal
//! - [`stories`]: the newsfeed

pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod children;
pub mod classes;
pub mod enums;
pub mod learning;
pub mod staff;
pub mod stories;
pub mod students;
pub mod users;

pub use enums::{
    ActivityCategory, AdminLevel, AttendanceStatus, EnrollmentRequestStatus, Gender,
    ParticipationLevel, RelationshipType, StoryType, TeacherRole, UserType,
};

pub use auth::{
    ChangePasswordRequest, ForgotPasswordRequest, HealthResponse, LoginRequest, LoginResponse,
    MessageResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterParentDto,
    RegisterResponse, ResendVerificationRequest, ResetPasswordRequest, ValidateResetTokenResponse,
    VerifyEmailRequest,
};

pub use users::{
    AdminProfile, ParentProfile, ProfileResponse, TeacherProfile, UpdateProfileDto, UserResponse,
    UserRow,
};
