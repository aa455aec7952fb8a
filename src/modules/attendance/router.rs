use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{list_attendance, mark_attendance, update_attendance};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance))
        .route("/mark", post(mark_attendance))
        .route("/{id}", put(update_attendance))
}
