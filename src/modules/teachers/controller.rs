use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AdminResetPasswordDto, CreateTeacherDto, PaginatedTeachersResponse, StaffFilterParams,
    TeacherDetail, TeacherWithUser, UpdateTeacherDto,
};
use super::service::TeacherService;
use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/teachers",
    params(StaffFilterParams),
    responses(
        (status = 200, description = "Teachers", body = PaginatedTeachersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_teachers(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<StaffFilterParams>,
) -> Result<Json<PaginatedTeachersResponse>, AppError> {
    let teachers = TeacherService::list_teachers(&state.db, filters).await?;
    Ok(Json(teachers))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/teachers",
    request_body = CreateTeacherDto,
    responses(
        (status = 201, description = "Teacher created", body = TeacherWithUser),
        (status = 400, description = "Validation error, email or employee ID taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_teacher(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateTeacherDto>,
) -> Result<(StatusCode, Json<TeacherWithUser>), AppError> {
    let temporary_password = dto.password.clone();
    let teacher = TeacherService::create_teacher(&state.db, dto).await?;

    let email_service = state.email_service();
    let content = email_service.account_created_email(
        &format!("{} {}", teacher.first_name, teacher.last_name),
        &teacher.email,
        &temporary_password,
        "teacher",
    );
    email_service
        .send_or_log("account_created", &teacher.email, content)
        .await;

    Ok((StatusCode::CREATED, Json(teacher)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher profile ID")),
    responses(
        (status = 200, description = "Teacher with assigned classes", body = TeacherDetail),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_teacher(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<TeacherDetail>, AppError> {
    let teacher = TeacherService::get_teacher(&state.db, id).await?;
    Ok(Json(teacher))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher profile ID")),
    request_body = UpdateTeacherDto,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherWithUser),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTeacherDto>,
) -> Result<Json<TeacherWithUser>, AppError> {
    let teacher = TeacherService::update_teacher(&state.db, id, dto).await?;
    Ok(Json(teacher))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher profile ID")),
    responses(
        (status = 200, description = "Teacher deactivated", body = MessageResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_teacher(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    TeacherService::delete_teacher(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Teacher deactivated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/teachers/{id}/reset-password",
    params(("id" = Uuid, Path, description = "Teacher profile ID")),
    request_body = AdminResetPasswordDto,
    responses(
        (status = 200, description = "Password reset, change required at next login", body = MessageResponse),
        (status = 400, description = "Weak password", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn reset_teacher_password(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AdminResetPasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let teacher = TeacherService::reset_password(&state.db, id, dto).await?;
    Ok(Json(MessageResponse::new(format!(
        "Password reset for {} {}. They must change it at next login.",
        teacher.first_name, teacher.last_name
    ))))
}
