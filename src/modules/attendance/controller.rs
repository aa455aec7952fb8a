use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AttendanceFilterParams, AttendanceRecord, MarkAttendanceDto, MarkAttendanceResponse,
    UpdateAttendanceDto,
};
use super::service::AttendanceService;
use crate::middleware::auth::RequireTeacher;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/v1/teacher/attendance/mark",
    request_body = MarkAttendanceDto,
    responses(
        (status = 201, description = "Attendance recorded", body = MarkAttendanceResponse),
        (status = 400, description = "Future date, already marked, or student not enrolled", body = ErrorResponse),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse),
        (status = 404, description = "Class or student not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher, dto))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<(StatusCode, Json<MarkAttendanceResponse>), AppError> {
    let response = AttendanceService::mark_attendance(&state.db, teacher.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/attendance",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "Attendance, newest date first", body = Vec<AttendanceRecord>),
        (status = 400, description = "class_id missing", body = ErrorResponse),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn list_attendance(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = AttendanceService::list_attendance(&state.db, teacher.user_id()?, filters).await?;
    Ok(Json(records))
}

#[utoipa::path(
    put,
    path = "/api/v1/teacher/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 403, description = "Record belongs to another teacher's class", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher, dto))]
pub async fn update_attendance(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record =
        AttendanceService::update_attendance(&state.db, teacher.user_id()?, id, dto).await?;
    Ok(Json(record))
}
