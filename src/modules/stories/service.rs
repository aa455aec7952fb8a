use anyhow::{Context, anyhow};
use nursery_core::file_storage::{MAX_ATTACHMENTS_PER_STORY, check_attachment, safe_extension};
use nursery_core::{AppError, FileStorage, PaginationMeta, StorageError};
use nursery_models::StoryType;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::model::{
    ATTACHMENT_COLUMNS, AttachmentResponse, COMMENT_SELECT, CommentDto, CreateStoryDto,
    LikeResponse, PaginatedStoriesResponse, STORY_SELECT, Story, StoryAttachment, StoryComment,
    StoryFilterParams, StoryResponse, StoryRow, UpdateStoryDto, UploadedFile,
};
use crate::metrics::track_story_created;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_owner_or_admin;
use crate::utils::db::{begin, commit};

fn story_not_found() -> AppError {
    AppError::not_found(anyhow!("Story not found"))
}

fn storage_error(e: StorageError) -> AppError {
    match e {
        StorageError::InvalidFileSize { .. } | StorageError::InvalidMimeType { .. } => {
            AppError::field("files", e.to_string())
        }
        other => AppError::internal(anyhow!(other).context("File storage failed")),
    }
}

/// Rejects uploads that would take a story past the attachment limit.
pub(crate) fn check_attachment_count(existing: i64, incoming: usize) -> Result<(), AppError> {
    if incoming == 0 {
        return Err(AppError::field("files", "No files provided."));
    }
    if existing + incoming as i64 > MAX_ATTACHMENTS_PER_STORY {
        return Err(AppError::field(
            "files",
            format!(
                "Maximum {} files can be attached.",
                MAX_ATTACHMENTS_PER_STORY
            ),
        ));
    }
    Ok(())
}

/// Attachment slots a story still has free.
pub(crate) fn remaining_attachment_slots(existing: i64) -> usize {
    (MAX_ATTACHMENTS_PER_STORY - existing).max(0) as usize
}

pub(crate) fn storage_key(story_id: Uuid, file_name: &str) -> String {
    match safe_extension(file_name) {
        Some(ext) => format!("stories/{}/{}.{}", story_id, Uuid::new_v4(), ext),
        None => format!("stories/{}/{}", story_id, Uuid::new_v4()),
    }
}

fn attachment_response(
    storage: &dyn FileStorage,
    attachment: StoryAttachment,
) -> Result<AttachmentResponse, AppError> {
    let url = storage.get_url(&attachment.storage_key).map_err(storage_error)?;
    Ok(attachment.into_response(url))
}

pub struct StoryService;

impl StoryService {
    async fn find_story(db: &PgPool, story_id: Uuid) -> Result<Story, AppError> {
        sqlx::query_as::<_, Story>(
            "SELECT id, author_id, title, content, story_type, is_active, created_at, updated_at
             FROM stories WHERE id = $1 AND is_active = true",
        )
        .bind(story_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch story")
        .map_err(AppError::database)?
        .ok_or_else(story_not_found)
    }

    async fn attachments_for(
        db: &PgPool,
        story_ids: &[Uuid],
    ) -> Result<Vec<StoryAttachment>, AppError> {
        let sql = format!(
            "SELECT {} FROM story_attachments WHERE story_id = ANY($1) ORDER BY created_at",
            ATTACHMENT_COLUMNS
        );
        sqlx::query_as::<_, StoryAttachment>(&sql)
            .bind(story_ids)
            .fetch_all(db)
            .await
            .context("Failed to fetch story attachments")
            .map_err(AppError::database)
    }

    async fn with_attachments(
        db: &PgPool,
        storage: &dyn FileStorage,
        rows: Vec<StoryRow>,
    ) -> Result<Vec<StoryResponse>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut attachments = Self::attachments_for(db, &ids).await?;

        let mut stories = Vec::with_capacity(rows.len());
        for row in rows {
            let (own, rest): (Vec<_>, Vec<_>) =
                attachments.into_iter().partition(|a| a.story_id == row.id);
            attachments = rest;
            let own = own
                .into_iter()
                .map(|a| attachment_response(storage, a))
                .collect::<Result<Vec<_>, _>>()?;
            stories.push(row.into_response(own));
        }
        Ok(stories)
    }

    #[instrument(skip(db, storage))]
    pub async fn list_stories(
        db: &PgPool,
        storage: &dyn FileStorage,
        viewer_id: Uuid,
        filters: StoryFilterParams,
    ) -> Result<PaginatedStoriesResponse, AppError> {
        let mine = filters.mine.unwrap_or(false);
        let author_filter = if mine { " AND st.author_id = $1" } else { "" };

        let count_sql = format!(
            "SELECT COUNT(*) FROM stories st WHERE st.is_active = true{}",
            author_filter
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if mine {
            count_query = count_query.bind(viewer_id);
        }
        let total = count_query
            .fetch_one(db)
            .await
            .context("Failed to count stories")
            .map_err(AppError::database)?;

        let sql = format!(
            "{}{} ORDER BY st.created_at DESC LIMIT $2 OFFSET $3",
            STORY_SELECT, author_filter
        );
        let rows = sqlx::query_as::<_, StoryRow>(&sql)
            .bind(viewer_id)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await
            .context("Failed to fetch stories")
            .map_err(AppError::database)?;

        Ok(PaginatedStoriesResponse {
            data: Self::with_attachments(db, storage, rows).await?,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, storage))]
    pub async fn get_story(
        db: &PgPool,
        storage: &dyn FileStorage,
        viewer_id: Uuid,
        story_id: Uuid,
    ) -> Result<StoryResponse, AppError> {
        let sql = format!("{} AND st.id = $2", STORY_SELECT);
        let row = sqlx::query_as::<_, StoryRow>(&sql)
            .bind(viewer_id)
            .bind(story_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch story")
            .map_err(AppError::database)?
            .ok_or_else(story_not_found)?;

        Self::with_attachments(db, storage, vec![row])
            .await?
            .pop()
            .ok_or_else(story_not_found)
    }

    #[instrument(skip(db, storage, dto))]
    pub async fn create_story(
        db: &PgPool,
        storage: &dyn FileStorage,
        author_id: Uuid,
        dto: CreateStoryDto,
    ) -> Result<StoryResponse, AppError> {
        let story_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO stories (author_id, title, content, story_type)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(author_id)
        .bind(dto.title.trim())
        .bind(dto.content.trim())
        .bind(dto.story_type.unwrap_or(StoryType::Journal))
        .fetch_one(db)
        .await
        .context("Failed to create story")
        .map_err(AppError::database)?;

        track_story_created();
        info!(story.id = %story_id, author.id = %author_id, "Story created");

        Self::get_story(db, storage, author_id, story_id).await
    }

    #[instrument(skip(db, storage, user, dto))]
    pub async fn update_story(
        db: &PgPool,
        storage: &dyn FileStorage,
        user: &AuthUser,
        story_id: Uuid,
        dto: UpdateStoryDto,
    ) -> Result<StoryResponse, AppError> {
        let user_id = user.user_id()?;
        let story = Self::find_story(db, story_id).await?;
        if story.author_id != user_id {
            return Err(AppError::forbidden("You can only edit your own stories"));
        }

        sqlx::query(
            "UPDATE stories
             SET title = COALESCE($1, title),
                 content = COALESCE($2, content),
                 story_type = COALESCE($3, story_type),
                 updated_at = NOW()
             WHERE id = $4",
        )
        .bind(dto.title.as_deref().map(str::trim))
        .bind(dto.content.as_deref().map(str::trim))
        .bind(dto.story_type)
        .bind(story_id)
        .execute(db)
        .await
        .context("Failed to update story")
        .map_err(AppError::database)?;

        Self::get_story(db, storage, user_id, story_id).await
    }

    /// Removes the story's attachments and their files, then hides the story.
    #[instrument(skip(db, storage, user))]
    pub async fn delete_story(
        db: &PgPool,
        storage: &dyn FileStorage,
        user: &AuthUser,
        story_id: Uuid,
    ) -> Result<(), AppError> {
        let story = Self::find_story(db, story_id).await?;
        check_owner_or_admin(user, story.author_id)?;

        let mut tx = begin(db).await?;
        let keys = sqlx::query_scalar::<_, String>(
            "DELETE FROM story_attachments WHERE story_id = $1 RETURNING storage_key",
        )
        .bind(story_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to delete story attachments")
        .map_err(AppError::database)?;

        sqlx::query("UPDATE stories SET is_active = false, updated_at = NOW() WHERE id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete story")
            .map_err(AppError::database)?;
        commit(tx).await?;

        for key in &keys {
            if let Err(e) = storage.delete(key).await {
                warn!(storage.key = %key, error = %e, "Failed to remove attachment file");
            }
        }

        info!(story.id = %story_id, attachments = keys.len(), "Story deleted");
        Ok(())
    }

    /// Checks that `user_id` may attach files to `story_id` and returns
    /// how many more files the story can take. Runs before the upload body
    /// is read.
    ///
    /// # Errors
    ///
    /// 404 for an unknown story, 403 for anyone but the author and 400 when
    /// the story already holds the maximum number of attachments.
    #[instrument(skip(db))]
    pub async fn upload_slots(db: &PgPool, user_id: Uuid, story_id: Uuid) -> Result<usize, AppError> {
        let story = Self::find_story(db, story_id).await?;
        if story.author_id != user_id {
            return Err(AppError::forbidden(
                "You can only add attachments to your own stories",
            ));
        }

        let existing = Self::count_attachments(db, story_id).await?;
        check_attachment_count(existing, 1)?;
        Ok(remaining_attachment_slots(existing))
    }

    async fn count_attachments<'e, E>(executor: E, story_id: Uuid) -> Result<i64, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM story_attachments WHERE story_id = $1")
            .bind(story_id)
            .fetch_one(executor)
            .await
            .context("Failed to count story attachments")
            .map_err(AppError::database)
    }

    /// Stores `files` and records them against the story.
    ///
    /// The story row is locked for the whole operation, so concurrent
    /// uploads cannot push it past the attachment limit. Files already
    /// written are removed again if anything fails.
    ///
    /// # Errors
    ///
    /// 400 for a file that is too large, of a disallowed type, or one too
    /// many; 403 for anyone but the author; 404 for an unknown story.
    #[instrument(skip(db, storage, files), fields(files = files.len()))]
    pub async fn upload_attachments(
        db: &PgPool,
        storage: &dyn FileStorage,
        user_id: Uuid,
        story_id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<AttachmentResponse>, AppError> {
        for file in &files {
            check_attachment(&file.content_type, file.bytes.len()).map_err(storage_error)?;
        }

        let mut tx = begin(db).await?;
        let author_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT author_id FROM stories WHERE id = $1 AND is_active = true FOR UPDATE",
        )
        .bind(story_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to lock story")
        .map_err(AppError::database)?
        .ok_or_else(story_not_found)?;
        if author_id != user_id {
            return Err(AppError::forbidden(
                "You can only add attachments to your own stories",
            ));
        }

        let existing = Self::count_attachments(&mut *tx, story_id).await?;
        check_attachment_count(existing, files.len())?;

        let mut saved_keys = Vec::with_capacity(files.len());
        let mut attachments = Vec::with_capacity(files.len());
        let sql = format!(
            "INSERT INTO story_attachments (story_id, storage_key, file_name, file_size, file_type)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            ATTACHMENT_COLUMNS
        );
        for file in files {
            let key = match storage.save(&storage_key(story_id, &file.file_name), &file.bytes).await {
                Ok(key) => key,
                Err(e) => {
                    drop(tx);
                    Self::discard_files(storage, &saved_keys).await;
                    return Err(storage_error(e));
                }
            };
            saved_keys.push(key.clone());

            let inserted = sqlx::query_as::<_, StoryAttachment>(&sql)
                .bind(story_id)
                .bind(&key)
                .bind(&file.file_name)
                .bind(file.bytes.len() as i64)
                .bind(&file.content_type)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to save story attachment");
            match inserted {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    drop(tx);
                    Self::discard_files(storage, &saved_keys).await;
                    return Err(AppError::database(e));
                }
            }
        }

        if let Err(e) = commit(tx).await {
            Self::discard_files(storage, &saved_keys).await;
            return Err(e);
        }

        info!(story.id = %story_id, count = attachments.len(), "Attachments uploaded");
        attachments
            .into_iter()
            .map(|a| attachment_response(storage, a))
            .collect()
    }

    async fn discard_files(storage: &dyn FileStorage, keys: &[String]) {
        for key in keys {
            if let Err(e) = storage.delete(key).await {
                warn!(storage.key = %key, error = %e, "Failed to clean up uploaded file");
            }
        }
    }

    #[instrument(skip(db, storage, user))]
    pub async fn delete_attachment(
        db: &PgPool,
        storage: &dyn FileStorage,
        user: &AuthUser,
        story_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<(), AppError> {
        let story = Self::find_story(db, story_id).await?;
        check_owner_or_admin(user, story.author_id)?;

        let key = sqlx::query_scalar::<_, String>(
            "DELETE FROM story_attachments WHERE id = $1 AND story_id = $2 RETURNING storage_key",
        )
        .bind(attachment_id)
        .bind(story_id)
        .fetch_optional(db)
        .await
        .context("Failed to delete attachment")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("Attachment not found")))?;

        if let Err(e) = storage.delete(&key).await {
            warn!(storage.key = %key, error = %e, "Failed to remove attachment file");
        }
        Ok(())
    }

    /// Likes the story, or removes the caller's like if present.
    #[instrument(skip(db))]
    pub async fn toggle_like(
        db: &PgPool,
        user_id: Uuid,
        story_id: Uuid,
    ) -> Result<LikeResponse, AppError> {
        Self::find_story(db, story_id).await?;

        let mut tx = begin(db).await?;
        let removed = sqlx::query("DELETE FROM story_likes WHERE story_id = $1 AND user_id = $2")
            .bind(story_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to remove like")
            .map_err(AppError::database)?
            .rows_affected();

        let liked = removed == 0;
        if liked {
            sqlx::query(
                "INSERT INTO story_likes (story_id, user_id) VALUES ($1, $2)
                 ON CONFLICT (story_id, user_id) DO NOTHING",
            )
            .bind(story_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to like story")
            .map_err(AppError::database)?;
        }

        let likes_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM story_likes WHERE story_id = $1")
                .bind(story_id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to count likes")
                .map_err(AppError::database)?;
        commit(tx).await?;

        Ok(LikeResponse {
            message: if liked { "Story liked" } else { "Story unliked" }.to_string(),
            liked,
            likes_count,
        })
    }

    pub async fn list_comments(
        db: &PgPool,
        story_id: Uuid,
    ) -> Result<Vec<StoryComment>, AppError> {
        Self::find_story(db, story_id).await?;

        let sql = format!(
            "{} WHERE c.story_id = $1 AND c.is_deleted = false ORDER BY c.created_at",
            COMMENT_SELECT
        );
        sqlx::query_as::<_, StoryComment>(&sql)
            .bind(story_id)
            .fetch_all(db)
            .await
            .context("Failed to fetch comments")
            .map_err(AppError::database)
    }

    async fn fetch_comment(db: &PgPool, comment_id: Uuid) -> Result<StoryComment, AppError> {
        let sql = format!("{} WHERE c.id = $1 AND c.is_deleted = false", COMMENT_SELECT);
        sqlx::query_as::<_, StoryComment>(&sql)
            .bind(comment_id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch comment")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("Comment not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_comment(
        db: &PgPool,
        user_id: Uuid,
        story_id: Uuid,
        dto: CommentDto,
    ) -> Result<StoryComment, AppError> {
        Self::find_story(db, story_id).await?;

        let comment_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO story_comments (story_id, user_id, comment_text)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(story_id)
        .bind(user_id)
        .bind(dto.comment_text.trim())
        .fetch_one(db)
        .await
        .context("Failed to create comment")
        .map_err(AppError::database)?;

        Self::fetch_comment(db, comment_id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update_comment(
        db: &PgPool,
        user_id: Uuid,
        comment_id: Uuid,
        dto: CommentDto,
    ) -> Result<StoryComment, AppError> {
        let comment = Self::fetch_comment(db, comment_id).await?;
        if comment.user_id != user_id {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        sqlx::query(
            "UPDATE story_comments SET comment_text = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(dto.comment_text.trim())
        .bind(comment_id)
        .execute(db)
        .await
        .context("Failed to update comment")
        .map_err(AppError::database)?;

        Self::fetch_comment(db, comment_id).await
    }

    #[instrument(skip(db, user))]
    pub async fn delete_comment(
        db: &PgPool,
        user: &AuthUser,
        comment_id: Uuid,
    ) -> Result<(), AppError> {
        let comment = Self::fetch_comment(db, comment_id).await?;
        check_owner_or_admin(user, comment.user_id)?;

        sqlx::query(
            "UPDATE story_comments SET is_deleted = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(comment_id)
        .execute(db)
        .await
        .context("Failed to delete comment")
        .map_err(AppError::database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_count_limit() {
        assert!(check_attachment_count(0, 5).is_ok());
        assert!(check_attachment_count(3, 2).is_ok());

        let err = check_attachment_count(4, 2).unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.message(), "Maximum 5 files can be attached.");
    }

    #[test]
    fn test_attachment_count_requires_files() {
        assert_eq!(check_attachment_count(0, 0).unwrap_err().status.as_u16(), 400);
    }

    #[test]
    fn test_remaining_attachment_slots() {
        assert_eq!(remaining_attachment_slots(0), 5);
        assert_eq!(remaining_attachment_slots(4), 1);
        assert_eq!(remaining_attachment_slots(5), 0);
        assert_eq!(remaining_attachment_slots(7), 0);
    }

    #[test]
    fn test_storage_key_layout() {
        let story_id = Uuid::new_v4();
        let key = storage_key(story_id, "Sports Day.JPG");
        assert!(key.starts_with(&format!("stories/{}/", story_id)));
        assert!(key.ends_with(".jpg"));

        let bare = storage_key(story_id, "notes");
        let file_name = bare.rsplit('/').next().unwrap();
        assert!(!file_name.contains('.'));
    }

    #[test]
    fn test_storage_errors_map_to_bad_request() {
        let err = storage_error(StorageError::InvalidMimeType {
            received: "application/zip".into(),
        });
        assert_eq!(err.status.as_u16(), 400);

        let err = storage_error(StorageError::InvalidKey("..".into()));
        assert_eq!(err.status.as_u16(), 500);
    }
}
