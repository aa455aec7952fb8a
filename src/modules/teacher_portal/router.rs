use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{class_marked_dates, class_students, class_students_with_parents, my_classes};

pub fn init_teacher_portal_router() -> Router<AppState> {
    Router::new()
        .route("/my-classes", get(my_classes))
        .route("/classes/{class_id}/students", get(class_students))
        .route(
            "/classes/{class_id}/students-with-parents",
            get(class_students_with_parents),
        )
        .route("/classes/{class_id}/marked-dates", get(class_marked_dates))
}
