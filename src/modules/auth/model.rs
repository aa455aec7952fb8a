pub use nursery_models::auth::{
    ChangePasswordRequest, ForgotPasswordRequest, HealthResponse, LoginRequest, LoginResponse,
    MessageResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterParentDto,
    RegisterResponse, ResendVerificationRequest, ResetPasswordRequest, ValidateResetTokenResponse,
    VerifyEmailRequest,
};
pub use nursery_models::users::{
    AdminProfile, ParentProfile, ProfileResponse, TeacherProfile, UpdateProfileDto, UserResponse,
    UserRow,
};

pub const VERIFICATION_SENT_MESSAGE: &str =
    "Registration successful. Please check your email to verify your account.";
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with this email exists, you will receive a password reset link shortly.";
pub const INVALID_VERIFICATION_TOKEN: &str = "Invalid or expired verification token";
pub const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
