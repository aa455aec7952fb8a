use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    CreateStudentDto, PaginatedStudentsResponse, StudentDetail, StudentFilterParams,
    UpdateStudentDto,
};
use super::service::StudentService;
use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Students with their current class", body = PaginatedStudentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_students(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let students = StudentService::list_students(&state.db, filters).await?;
    Ok(Json(students))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created", body = StudentDetail),
        (status = 400, description = "Validation error or student code taken", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_student(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<StudentDetail>), AppError> {
    let student = StudentService::create_student(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student with class and parents", body = StudentDetail),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_student(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentDetail>, AppError> {
    let student = StudentService::get_student(&state.db, id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = StudentDetail),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<StudentDetail>, AppError> {
    let student = StudentService::update_student(&state.db, id, dto).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deactivated", body = MessageResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_student(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    StudentService::delete_student(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Student deactivated successfully")))
}
