use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use nursery_core::file_storage::{MAX_ATTACHMENTS_PER_STORY, MAX_VIDEO_BYTES};

use crate::state::AppState;

use super::controller::{
    create_comment, create_story, delete_attachment, delete_comment, delete_story, get_story,
    list_comments, list_stories, toggle_like, update_comment, update_story, upload_attachments,
};

/// Room for a full batch of the largest attachments plus form overhead.
const MAX_UPLOAD_BODY_BYTES: usize =
    MAX_ATTACHMENTS_PER_STORY as usize * MAX_VIDEO_BYTES + 1024 * 1024;

pub fn init_stories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stories).post(create_story))
        .route(
            "/comments/{comment_id}",
            put(update_comment).delete(delete_comment),
        )
        .route(
            "/{id}",
            get(get_story).put(update_story).delete(delete_story),
        )
        .route(
            "/{id}/attachments",
            post(upload_attachments).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        .route(
            "/{id}/attachments/{attachment_id}",
            delete(delete_attachment),
        )
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", get(list_comments).post(create_comment))
}
