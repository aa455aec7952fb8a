//! Newsfeed stories posted by teachers and admins, with attachments,
//! likes and comments.

use chrono::{DateTime, Utc};
use nursery_core::serde::deserialize_optional_bool;
use nursery_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::enums::{StoryType, UserType};

pub const MAX_TITLE_CHARS: usize = 200;

fn required(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(message.into());
        return Err(err);
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    required(title, "Title is required and cannot be empty.")?;
    if title.trim().chars().count() > MAX_TITLE_CHARS {
        let mut err = ValidationError::new("length");
        err.message = Some("Title cannot exceed 200 characters.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
    required(content, "Content is required and cannot be empty.")
}

fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    required(text, "Comment text is required and cannot be empty.")?;
    if text.chars().count() > 2000 {
        let mut err = ValidationError::new("length");
        err.message = Some("Comment cannot exceed 2000 characters.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Story {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub story_type: StoryType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Story joined with its author and the caller's engagement.
#[derive(Debug, Clone, FromRow)]
pub struct StoryRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_role: UserType,
    pub title: String,
    pub content: String,
    pub story_type: StoryType,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StoryAttachment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub storage_key: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl StoryAttachment {
    pub fn into_response(self, url: String) -> AttachmentResponse {
        AttachmentResponse {
            id: self.id,
            file_name: self.file_name,
            file_size: self.file_size,
            file_type: self.file_type,
            url,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoryAuthor {
    pub id: Uuid,
    pub name: String,
    pub role: UserType,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub story_type: StoryType,
    pub author: StoryAuthor,
    pub attachments: Vec<AttachmentResponse>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoryRow {
    pub fn into_response(self, attachments: Vec<AttachmentResponse>) -> StoryResponse {
        StoryResponse {
            id: self.id,
            title: self.title,
            content: self.content,
            story_type: self.story_type,
            author: StoryAuthor {
                id: self.author_id,
                name: self.author_name,
                role: self.author_role,
            },
            attachments,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            is_liked: self.is_liked,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStoryDto {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(custom(function = "validate_content"))]
    pub content: String,
    /// Defaults to `journal`
    pub story_type: Option<StoryType>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStoryDto {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_content"))]
    pub content: Option<String>,
    pub story_type: Option<StoryType>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoryFilterParams {
    /// Only the caller's own stories
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub mine: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStoriesResponse {
    pub data: Vec<StoryResponse>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadAttachmentsResponse {
    pub message: String,
    pub attachments: Vec<AttachmentResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
    pub likes_count: i64,
}

/// Comment joined with its author's display name.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StoryComment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub author_role: UserType,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CommentDto {
    #[validate(custom(function = "validate_comment_text"))]
    pub comment_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &validator::ValidationErrors, field: &str) -> Vec<String> {
        errors.field_errors()[field]
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect()
    }

    #[test]
    fn test_create_story_rejects_blank_fields() {
        let dto = CreateStoryDto {
            title: "   ".into(),
            content: "".into(),
            story_type: None,
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            messages(&errors, "title"),
            vec!["Title is required and cannot be empty."]
        );
        assert_eq!(
            messages(&errors, "content"),
            vec!["Content is required and cannot be empty."]
        );
    }

    #[test]
    fn test_title_length_limit() {
        let dto = CreateStoryDto {
            title: "a".repeat(201),
            content: "Sports day".into(),
            story_type: Some(StoryType::Photo),
        };
        assert!(dto.validate().is_err());

        let ok = CreateStoryDto {
            title: "a".repeat(200),
            ..dto
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_update_story_skips_missing_fields() {
        assert!(UpdateStoryDto::default().validate().is_ok());
        let dto = UpdateStoryDto {
            content: Some(" ".into()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_comment_text_required() {
        let dto = CommentDto {
            comment_text: "\n".into(),
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            messages(&errors, "comment_text"),
            vec!["Comment text is required and cannot be empty."]
        );
    }

    #[test]
    fn test_story_response_nests_author() {
        let now = Utc::now();
        let row = StoryRow {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_name: "Dilini Fernando".into(),
            author_role: UserType::Teacher,
            title: "Sports day".into(),
            content: "Photos from today".into(),
            story_type: StoryType::Photo,
            likes_count: 3,
            comments_count: 1,
            is_liked: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(row.into_response(vec![])).unwrap();
        assert_eq!(json["author"]["name"], "Dilini Fernando");
        assert_eq!(json["author"]["role"], "teacher");
        assert_eq!(json["story_type"], "photo");
        assert_eq!(json["likes_count"], 3);
    }
}
