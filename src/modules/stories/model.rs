pub use nursery_models::stories::{
    AttachmentResponse, CommentDto, CreateStoryDto, LikeResponse, PaginatedStoriesResponse, Story,
    StoryAttachment, StoryAuthor, StoryComment, StoryFilterParams, StoryResponse, StoryRow,
    UpdateStoryDto, UploadAttachmentsResponse,
};

/// Multipart field name carrying attachment files.
pub const ATTACHMENT_FIELD: &str = "files";

/// `$1` is the viewing user, used for `is_liked`.
pub(crate) const STORY_SELECT: &str = r#"SELECT st.id, st.author_id,
       (u.first_name || ' ' || u.last_name) AS author_name,
       u.user_type AS author_role,
       st.title, st.content, st.story_type,
       (SELECT COUNT(*) FROM story_likes l WHERE l.story_id = st.id) AS likes_count,
       (SELECT COUNT(*) FROM story_comments c
         WHERE c.story_id = st.id AND c.is_deleted = false) AS comments_count,
       EXISTS (SELECT 1 FROM story_likes l
                WHERE l.story_id = st.id AND l.user_id = $1) AS is_liked,
       st.created_at, st.updated_at
FROM stories st
JOIN users u ON u.id = st.author_id
WHERE st.is_active = true"#;

pub(crate) const COMMENT_SELECT: &str = r#"SELECT c.id, c.story_id, c.user_id,
       (u.first_name || ' ' || u.last_name) AS author_name,
       u.user_type AS author_role,
       c.comment_text, c.created_at, c.updated_at
FROM story_comments c
JOIN users u ON u.id = c.user_id"#;

pub(crate) const ATTACHMENT_COLUMNS: &str =
    "id, story_id, storage_key, file_name, file_size, file_type, created_at";

/// A file read from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// OpenAPI shape of the attachment upload form.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AttachmentUploadForm {
    /// Up to five files
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}
