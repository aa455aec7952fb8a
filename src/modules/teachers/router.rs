use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_teacher, delete_teacher, get_teacher, list_teachers, reset_teacher_password,
    update_teacher,
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_teacher).get(list_teachers))
        .route(
            "/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route("/{id}/reset-password", post(reset_teacher_password))
}
