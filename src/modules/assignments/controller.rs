use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AssignStudentsDto, AssignTeacherDto, AssignTeacherResponse, AssignmentFilterParams,
    DashboardStats, EnrollmentRequestFilterParams, EnrollmentRequestView, EnrollmentResult,
    ReassignStudentsDto, TeacherAssignmentSummary,
};
use super::service::AssignmentService;
use crate::middleware::auth::RequireAdmin;
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/v1/admin/teacher-assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "Teachers with their active class assignments", body = Vec<TeacherAssignmentSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_teacher_assignments(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<Vec<TeacherAssignmentSummary>>, AppError> {
    let teachers = AssignmentService::list_teacher_assignments(&state.db, filters).await?;
    Ok(Json(teachers))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/assign-students",
    request_body = AssignStudentsDto,
    responses(
        (status = 200, description = "Students enrolled and teacher assigned", body = EnrollmentResult),
        (status = 400, description = "Validation error or class capacity exceeded", body = ErrorResponse),
        (status = 404, description = "Teacher, class or student not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn assign_students(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<AssignStudentsDto>,
) -> Result<Json<EnrollmentResult>, AppError> {
    let result = AssignmentService::assign_students(&state.db, dto).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/reassign-students",
    request_body = ReassignStudentsDto,
    responses(
        (status = 200, description = "Students moved to the destination class", body = EnrollmentResult),
        (status = 400, description = "Students not in source class or capacity exceeded", body = ErrorResponse),
        (status = 404, description = "Class or student not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn reassign_students(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<ReassignStudentsDto>,
) -> Result<Json<EnrollmentResult>, AppError> {
    let result = AssignmentService::reassign_students(&state.db, dto).await?;
    Ok(Json(result))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/remove-student-assignment/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Enrollment deactivated", body = MessageResponse),
        (status = 400, description = "Student is not assigned", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_student_assignment(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(student_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    AssignmentService::remove_student_assignment(&state.db, student_id).await?;
    Ok(Json(MessageResponse::new(
        "Student removed from class successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/assign-teacher-to-class",
    request_body = AssignTeacherDto,
    responses(
        (status = 201, description = "Assignment created", body = AssignTeacherResponse),
        (status = 200, description = "Previous assignment reactivated", body = AssignTeacherResponse),
        (status = 400, description = "Already assigned with this role", body = ErrorResponse),
        (status = 404, description = "Teacher or class not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn assign_teacher_to_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<AssignTeacherDto>,
) -> Result<(StatusCode, Json<AssignTeacherResponse>), AppError> {
    let response = AssignmentService::assign_teacher_to_class(&state.db, dto).await?;
    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/remove-teacher-from-class/{teacher_id}/{class_id}",
    params(
        ("teacher_id" = Uuid, Path, description = "Teacher profile ID"),
        ("class_id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Assignments deactivated", body = MessageResponse),
        (status = 404, description = "No active assignment", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_teacher_from_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((teacher_id, class_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed =
        AssignmentService::remove_teacher_from_class(&state.db, teacher_id, class_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed {} assignment(s) for this teacher from the class",
        removed
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard-stats",
    responses(
        (status = 200, description = "Totals and class utilization", body = DashboardStats),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = AssignmentService::dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/enrollment-requests",
    params(EnrollmentRequestFilterParams),
    responses(
        (status = 200, description = "Enrollment requests, newest first", body = Vec<EnrollmentRequestView>),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_enrollment_requests(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(filters): Query<EnrollmentRequestFilterParams>,
) -> Result<Json<Vec<EnrollmentRequestView>>, AppError> {
    let requests = AssignmentService::list_enrollment_requests(&state.db, filters).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/enrollment-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Enrollment request ID")),
    responses(
        (status = 200, description = "Request approved and child enrolled", body = EnrollmentRequestView),
        (status = 400, description = "Already reviewed or class full", body = ErrorResponse),
        (status = 404, description = "Request or class not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin))]
pub async fn approve_enrollment_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentRequestView>, AppError> {
    let request =
        AssignmentService::approve_enrollment_request(&state.db, id, admin.user_id()?).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/enrollment-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Enrollment request ID")),
    responses(
        (status = 200, description = "Request rejected", body = EnrollmentRequestView),
        (status = 400, description = "Already reviewed", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin))]
pub async fn reject_enrollment_request(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentRequestView>, AppError> {
    let request =
        AssignmentService::reject_enrollment_request(&state.db, id, admin.user_id()?).await?;
    Ok(Json(request))
}
