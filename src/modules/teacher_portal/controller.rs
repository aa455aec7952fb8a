use axum::{
    Json,
    extract::{Path, State},
};
use nursery_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use super::model::{ClassStudentInfo, MarkedDatesResponse, MyClass, StudentWithParents};
use super::service::TeacherPortalService;
use crate::middleware::auth::RequireTeacher;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/teacher/my-classes",
    responses(
        (status = 200, description = "Active classes assigned to the caller", body = Vec<MyClass>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Teachers only", body = ErrorResponse)
    ),
    tag = "Teacher Portal",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn my_classes(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
) -> Result<Json<Vec<MyClass>>, AppError> {
    let classes = TeacherPortalService::my_classes(&state.db, teacher.user_id()?).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/classes/{class_id}/students",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Enrolled students", body = Vec<ClassStudentInfo>),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Teacher Portal",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn class_students(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<ClassStudentInfo>>, AppError> {
    let students =
        TeacherPortalService::class_students(&state.db, teacher.user_id()?, class_id).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/classes/{class_id}/students-with-parents",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Students with parent contacts", body = Vec<StudentWithParents>),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Teacher Portal",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn class_students_with_parents(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<StudentWithParents>>, AppError> {
    let students =
        TeacherPortalService::class_students_with_parents(&state.db, teacher.user_id()?, class_id)
            .await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/classes/{class_id}/marked-dates",
    params(("class_id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Dates with attendance, newest first", body = MarkedDatesResponse),
        (status = 403, description = "Not assigned to this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Teacher Portal",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, teacher))]
pub async fn class_marked_dates(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    Path(class_id): Path<Uuid>,
) -> Result<Json<MarkedDatesResponse>, AppError> {
    let dates =
        TeacherPortalService::class_marked_dates(&state.db, teacher.user_id()?, class_id).await?;
    Ok(Json(dates))
}
