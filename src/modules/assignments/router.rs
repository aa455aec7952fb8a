use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    approve_enrollment_request, assign_students, assign_teacher_to_class, dashboard_stats,
    list_enrollment_requests, list_teacher_assignments, reassign_students,
    reject_enrollment_request, remove_student_assignment, remove_teacher_from_class,
};

pub fn init_assignments_router() -> Router<AppState> {
    Router::new()
        .route("/teacher-assignments", get(list_teacher_assignments))
        .route("/assign-students", post(assign_students))
        .route("/reassign-students", post(reassign_students))
        .route(
            "/remove-student-assignment/{student_id}",
            delete(remove_student_assignment),
        )
        .route("/assign-teacher-to-class", post(assign_teacher_to_class))
        .route(
            "/remove-teacher-from-class/{teacher_id}/{class_id}",
            delete(remove_teacher_from_class),
        )
        .route("/dashboard-stats", get(dashboard_stats))
        .route("/enrollment-requests", get(list_enrollment_requests))
        .route(
            "/enrollment-requests/{id}/approve",
            post(approve_enrollment_request),
        )
        .route(
            "/enrollment-requests/{id}/reject",
            post(reject_enrollment_request),
        )
}
