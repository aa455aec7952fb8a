use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    BulkUnassignResponse, ClassDetail, ClassFilterParams, ClassWithStats, CreateClassDto,
    PaginatedClassesResponse, UpdateClassDto,
};
use super::service::ClassService;
use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/classes",
    params(ClassFilterParams),
    responses(
        (status = 200, description = "Classes with enrollment counts", body = PaginatedClassesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_classes(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let classes = ClassService::list_classes(&state.db, filters).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = ClassWithStats),
        (status = 400, description = "Validation error or class code taken", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<ClassWithStats>), AppError> {
    let class = ClassService::create_class(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class with students and teachers", body = ClassDetail),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassDetail>, AppError> {
    let class = ClassService::get_class(&state.db, id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = ClassWithStats),
        (status = 400, description = "Validation error or class code taken", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<ClassWithStats>, AppError> {
    let class = ClassService::update_class(&state.db, id, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class deactivated", body = MessageResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::delete_class(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Class deactivated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/classes/{id}/unassign-all-students",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Enrollments deactivated", body = BulkUnassignResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn unassign_all_students(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkUnassignResponse>, AppError> {
    let response = ClassService::unassign_all_students(&state.db, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/classes/{id}/unassign-all-teachers",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Teacher assignments deactivated", body = BulkUnassignResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn unassign_all_teachers(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkUnassignResponse>, AppError> {
    let response = ClassService::unassign_all_teachers(&state.db, id).await?;
    Ok(Json(response))
}
