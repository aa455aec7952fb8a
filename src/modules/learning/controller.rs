use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    ActivityFilterParams, CreateLearningActivityDto, LearningActivity, LearningSession,
    LearningSessionDetail, RecordSessionDto, SessionFilterParams, UpdateLearningActivityDto,
};
use super::service::LearningService;
use crate::middleware::auth::{RequireAdmin, RequireTeacher};
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/learning-activities",
    params(ActivityFilterParams),
    responses(
        (status = 200, description = "Activity catalog", body = Vec<LearningActivity>),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_activities(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<ActivityFilterParams>,
) -> Result<Json<Vec<LearningActivity>>, AppError> {
    let activities = LearningService::list_activities(&state.db, filters).await?;
    Ok(Json(activities))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/learning-activities",
    request_body = CreateLearningActivityDto,
    responses(
        (status = 201, description = "Activity created", body = LearningActivity),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_activity(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateLearningActivityDto>,
) -> Result<(StatusCode, Json<LearningActivity>), AppError> {
    let activity = LearningService::create_activity(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/learning-activities/{id}",
    params(("id" = Uuid, Path, description = "Learning activity ID")),
    request_body = UpdateLearningActivityDto,
    responses(
        (status = 200, description = "Activity updated", body = LearningActivity),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn update_activity(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateLearningActivityDto>,
) -> Result<Json<LearningActivity>, AppError> {
    let activity = LearningService::update_activity(&state.db, id, dto).await?;
    Ok(Json(activity))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/learning-activities/{id}",
    params(("id" = Uuid, Path, description = "Learning activity ID")),
    responses(
        (status = 200, description = "Activity deactivated", body = MessageResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_activity(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    LearningService::delete_activity(&state.db, id).await?;
    Ok(Json(MessageResponse::new(
        "Learning activity deactivated successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/learning-activities/catalog",
    responses(
        (status = 200, description = "Active activities", body = Vec<LearningActivity>),
        (status = 403, description = "Teachers only", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _teacher))]
pub async fn activity_catalog(
    State(state): State<AppState>,
    _teacher: RequireTeacher,
) -> Result<Json<Vec<LearningActivity>>, AppError> {
    let activities = LearningService::activity_catalog(&state.db).await?;
    Ok(Json(activities))
}

#[utoipa::path(
    post,
    path = "/api/v1/teacher/learning-activities/record",
    request_body = RecordSessionDto,
    responses(
        (status = 201, description = "Session recorded", body = LearningSessionDetail),
        (status = 400, description = "Validation error or student not enrolled", body = ErrorResponse),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse),
        (status = 404, description = "Class or activity not found", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher, dto))]
pub async fn record_session(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<RecordSessionDto>,
) -> Result<(StatusCode, Json<LearningSessionDetail>), AppError> {
    let session = LearningService::record_session(&state.db, teacher.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/learning-activities",
    params(SessionFilterParams),
    responses(
        (status = 200, description = "Sessions logged by the caller", body = Vec<LearningSession>),
        (status = 403, description = "Teachers only", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn list_sessions(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Query(filters): Query<SessionFilterParams>,
) -> Result<Json<Vec<LearningSession>>, AppError> {
    let sessions = LearningService::list_sessions(&state.db, teacher.user_id()?, filters).await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/learning-activities/{id}",
    params(("id" = Uuid, Path, description = "Learning session ID")),
    responses(
        (status = 200, description = "Session with student records", body = LearningSessionDetail),
        (status = 403, description = "Session belongs to another class", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "Learning",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn get_session(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<LearningSessionDetail>, AppError> {
    let session = LearningService::get_session(&state.db, teacher.user_id()?, id).await?;
    Ok(Json(session))
}
