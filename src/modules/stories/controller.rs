use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use nursery_core::AppError;
use nursery_core::file_storage::MAX_ATTACHMENTS_PER_STORY;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    ATTACHMENT_FIELD, AttachmentUploadForm, CommentDto, CreateStoryDto, LikeResponse,
    PaginatedStoriesResponse, StoryComment, StoryFilterParams, StoryResponse, UpdateStoryDto,
    UploadAttachmentsResponse, UploadedFile,
};
use super::service::StoryService;
use crate::middleware::auth::{AuthUser, RequireStaff};
use crate::modules::auth::MessageResponse;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::bad_request(anyhow!("Invalid upload: {}", e.body_text()))
}

/// Reads at most `slots` file parts. The part past the limit is rejected
/// before its body is buffered.
async fn read_files(mut multipart: Multipart, slots: usize) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(ATTACHMENT_FIELD) {
            continue;
        }
        if files.len() == slots {
            return Err(AppError::field(
                "files",
                format!("Maximum {} files can be attached.", MAX_ATTACHMENTS_PER_STORY),
            ));
        }
        let file_name = field.file_name().unwrap_or("attachment").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        files.push(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

#[utoipa::path(
    get,
    path = "/api/v1/stories",
    params(StoryFilterParams),
    responses(
        (status = 200, description = "Newest stories first", body = PaginatedStoriesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn list_stories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<StoryFilterParams>,
) -> Result<Json<PaginatedStoriesResponse>, AppError> {
    let stories =
        StoryService::list_stories(&state.db, state.storage.as_ref(), user.user_id()?, filters)
            .await?;
    Ok(Json(stories))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories",
    request_body = CreateStoryDto,
    responses(
        (status = 201, description = "Story created", body = StoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, staff, dto))]
pub async fn create_story(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateStoryDto>,
) -> Result<(StatusCode, Json<StoryResponse>), AppError> {
    let story =
        StoryService::create_story(&state.db, state.storage.as_ref(), staff.user_id()?, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(story)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stories/{id}",
    params(("id" = Uuid, Path, description = "Story ID")),
    responses(
        (status = 200, description = "Story", body = StoryResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_story(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StoryResponse>, AppError> {
    let story =
        StoryService::get_story(&state.db, state.storage.as_ref(), user.user_id()?, id).await?;
    Ok(Json(story))
}

#[utoipa::path(
    put,
    path = "/api/v1/stories/{id}",
    params(("id" = Uuid, Path, description = "Story ID")),
    request_body = UpdateStoryDto,
    responses(
        (status = 200, description = "Story updated", body = StoryResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, dto))]
pub async fn update_story(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStoryDto>,
) -> Result<Json<StoryResponse>, AppError> {
    let story =
        StoryService::update_story(&state.db, state.storage.as_ref(), &user, id, dto).await?;
    Ok(Json(story))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stories/{id}",
    params(("id" = Uuid, Path, description = "Story ID")),
    responses(
        (status = 200, description = "Story deleted", body = MessageResponse),
        (status = 403, description = "Not the author or an admin", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_story(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    StoryService::delete_story(&state.db, state.storage.as_ref(), &user, id).await?;
    Ok(Json(MessageResponse::new("Story deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories/{id}/attachments",
    params(("id" = Uuid, Path, description = "Story ID")),
    request_body(content = AttachmentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files attached", body = UploadAttachmentsResponse),
        (status = 400, description = "Too many files, file too large, or type not allowed", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, multipart))]
pub async fn upload_attachments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAttachmentsResponse>), AppError> {
    let user_id = user.user_id()?;
    let slots = StoryService::upload_slots(&state.db, user_id, id).await?;
    let files = read_files(multipart, slots).await?;
    let attachments = StoryService::upload_attachments(
        &state.db,
        state.storage.as_ref(),
        user_id,
        id,
        files,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadAttachmentsResponse {
            message: format!("{} file(s) attached successfully", attachments.len()),
            attachments,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stories/{id}/attachments/{attachment_id}",
    params(
        ("id" = Uuid, Path, description = "Story ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment removed", body = MessageResponse),
        (status = 403, description = "Not the author or an admin", body = ErrorResponse),
        (status = 404, description = "Story or attachment not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_attachment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    StoryService::delete_attachment(&state.db, state.storage.as_ref(), &user, id, attachment_id)
        .await?;
    Ok(Json(MessageResponse::new("Attachment deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories/{id}/like",
    params(("id" = Uuid, Path, description = "Story ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, AppError> {
    let response = StoryService::toggle_like(&state.db, user.user_id()?, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/stories/{id}/comments",
    params(("id" = Uuid, Path, description = "Story ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<StoryComment>),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _user))]
pub async fn list_comments(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoryComment>>, AppError> {
    let comments = StoryService::list_comments(&state.db, id).await?;
    Ok(Json(comments))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories/{id}/comments",
    params(("id" = Uuid, Path, description = "Story ID")),
    request_body = CommentDto,
    responses(
        (status = 201, description = "Comment added", body = StoryComment),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Story not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, dto))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CommentDto>,
) -> Result<(StatusCode, Json<StoryComment>), AppError> {
    let comment = StoryService::create_comment(&state.db, user.user_id()?, id, dto).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[utoipa::path(
    put,
    path = "/api/v1/stories/comments/{comment_id}",
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    request_body = CommentDto,
    responses(
        (status = 200, description = "Comment updated", body = StoryComment),
        (status = 403, description = "Not the comment author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user, dto))]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CommentDto>,
) -> Result<Json<StoryComment>, AppError> {
    let comment =
        StoryService::update_comment(&state.db, user.user_id()?, comment_id, dto).await?;
    Ok(Json(comment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stories/comments/{comment_id}",
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 403, description = "Not the comment author or an admin", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tag = "Stories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    StoryService::delete_comment(&state.db, &user, comment_id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
