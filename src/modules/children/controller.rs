use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AddChildDto, AddChildResponse, AvailableClass, Child, ChildrenSummary, MonthlyAttendance,
    MonthlyLearningHours, RequestEnrollmentDto, RequestEnrollmentResponse, UpdateChildDto,
    YearQuery,
};
use super::service::ChildrenService;
use crate::middleware::auth::RequireParent;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/parent/children",
    responses(
        (status = 200, description = "Linked children", body = Vec<Child>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Parents only", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn list_children(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
) -> Result<Json<Vec<Child>>, AppError> {
    let children = ChildrenService::list_children(&state.db, parent.user_id()?).await?;
    Ok(Json(children))
}

#[utoipa::path(
    post,
    path = "/api/v1/parent/children",
    request_body = AddChildDto,
    responses(
        (status = 201, description = "Child added", body = AddChildResponse),
        (status = 400, description = "Validation error or duplicate child", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent, dto))]
pub async fn add_child(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    ValidatedJson(dto): ValidatedJson<AddChildDto>,
) -> Result<(StatusCode, Json<AddChildResponse>), AppError> {
    let child = ChildrenService::add_child(&state.db, parent.user_id()?, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddChildResponse {
            message: "Child added successfully".to_string(),
            child,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/parent/children/summary",
    responses(
        (status = 200, description = "Children grouped by class", body = ChildrenSummary)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn children_summary(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
) -> Result<Json<ChildrenSummary>, AppError> {
    let summary = ChildrenService::summary(&state.db, parent.user_id()?).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/parent/children/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Child", body = Child),
        (status = 404, description = "Child not linked to the caller", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn get_child(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
) -> Result<Json<Child>, AppError> {
    let child = ChildrenService::get_child(&state.db, parent.user_id()?, id).await?;
    Ok(Json(child))
}

#[utoipa::path(
    put,
    path = "/api/v1/parent/children/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateChildDto,
    responses(
        (status = 200, description = "Child updated", body = Child),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Child not linked to the caller", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent, dto))]
pub async fn update_child(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateChildDto>,
) -> Result<Json<Child>, AppError> {
    let child = ChildrenService::update_child(&state.db, parent.user_id()?, id, dto).await?;
    Ok(Json(child))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parent/children/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Relationship removed", body = MessageResponse),
        (status = 404, description = "Child not linked to the caller", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn remove_child(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ChildrenService::remove_child(&state.db, parent.user_id()?, id).await?;
    Ok(Json(MessageResponse::new(
        "Child removed from your account successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/parent/available-classes",
    responses(
        (status = 200, description = "Active classes with free places", body = Vec<AvailableClass>)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _parent))]
pub async fn available_classes(
    State(state): State<AppState>,
    _parent: RequireParent,
) -> Result<Json<Vec<AvailableClass>>, AppError> {
    let classes = ChildrenService::available_classes(&state.db).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/api/v1/parent/children/{id}/request-enrollment",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = RequestEnrollmentDto,
    responses(
        (status = 201, description = "Request submitted", body = RequestEnrollmentResponse),
        (status = 400, description = "Already enrolled, class full, or request pending", body = ErrorResponse),
        (status = 404, description = "Child or class not found", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent, dto))]
pub async fn request_enrollment(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RequestEnrollmentDto>,
) -> Result<(StatusCode, Json<RequestEnrollmentResponse>), AppError> {
    let request = ChildrenService::request_enrollment(&state.db, parent.user_id()?, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequestEnrollmentResponse {
            message: "Enrollment request submitted. An administrator will review it shortly."
                .to_string(),
            request,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/parent/children/{id}/learning-activities",
    params(("id" = Uuid, Path, description = "Student ID"), YearQuery),
    responses(
        (status = 200, description = "Twelve monthly buckets of learning hours", body = Vec<MonthlyLearningHours>),
        (status = 400, description = "Invalid year", body = ErrorResponse),
        (status = 404, description = "Child not linked to the caller", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn child_learning_activities(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<MonthlyLearningHours>>, AppError> {
    let months =
        ChildrenService::learning_activities(&state.db, parent.user_id()?, id, query).await?;
    Ok(Json(months))
}

#[utoipa::path(
    get,
    path = "/api/v1/parent/children/{id}/attendance",
    params(("id" = Uuid, Path, description = "Student ID"), YearQuery),
    responses(
        (status = 200, description = "Twelve monthly attendance buckets", body = Vec<MonthlyAttendance>),
        (status = 400, description = "Invalid year", body = ErrorResponse),
        (status = 404, description = "Child not linked to the caller", body = ErrorResponse)
    ),
    tag = "Children",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, parent))]
pub async fn child_attendance(
    State(state): State<AppState>,
    RequireParent(parent): RequireParent,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<MonthlyAttendance>>, AppError> {
    let months = ChildrenService::attendance(&state.db, parent.user_id()?, id, query).await?;
    Ok(Json(months))
}
