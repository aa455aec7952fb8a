use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    activity_catalog, create_activity, delete_activity, get_session, list_activities,
    list_sessions, record_session, update_activity,
};

/// Mounted under `/admin/learning-activities`.
pub fn init_activity_catalog_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_activity).get(list_activities))
        .route("/{id}", put(update_activity).delete(delete_activity))
}

/// Mounted under `/teacher/learning-activities`.
pub fn init_learning_sessions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/catalog", get(activity_catalog))
        .route("/record", post(record_session))
        .route("/{id}", get(get_session))
}
