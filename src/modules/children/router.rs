use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    add_child, available_classes, child_attendance, child_learning_activities, children_summary,
    get_child, list_children, remove_child, request_enrollment, update_child,
};

pub fn init_children_router() -> Router<AppState> {
    Router::new()
        .route("/children", get(list_children).post(add_child))
        .route("/children/summary", get(children_summary))
        .route(
            "/children/{id}",
            get(get_child).put(update_child).delete(remove_child),
        )
        .route("/children/{id}/request-enrollment", post(request_enrollment))
        .route(
            "/children/{id}/learning-activities",
            get(child_learning_activities),
        )
        .route("/children/{id}/attendance", get(child_attendance))
        .route("/available-classes", get(available_classes))
}
