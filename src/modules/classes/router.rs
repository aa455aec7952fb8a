use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_class, delete_class, get_class, list_classes, unassign_all_students,
    unassign_all_teachers, update_class,
};

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class).get(list_classes))
        .route("/{id}", get(get_class).put(update_class).delete(delete_class))
        .route("/{id}/unassign-all-students", post(unassign_all_students))
        .route("/{id}/unassign-all-teachers", post(unassign_all_teachers))
}
