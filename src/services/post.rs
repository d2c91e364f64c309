// Promotional posts: upload, patch and removal of image and video posts

use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};

use crate::{
    app::AppState,
    db::{parse_object_id, PostStore},
    models::{Audience, ContentType, NewPost, Post, PostContent, PostStatus, UpdatePostRequest},
    services::asset_host::{
        delete_best_effort, AssetHost, AssetRef, AssetUpload, MediaKind, PendingAsset,
        UploadedFile,
    },
    utils::{
        app_error::{AppError, AppResult},
        validation::{optional_text, parse_date, required_text},
    },
};

impl From<ContentType> for MediaKind {
    fn from(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Image => MediaKind::Image,
            ContentType::Video => MediaKind::Video,
        }
    }
}

// =============================================================================
// FIELD VALIDATION
// =============================================================================

pub fn parse_file_type(file_type: Option<&str>) -> AppResult<ContentType> {
    file_type
        .and_then(ContentType::parse)
        .ok_or_else(|| AppError::validation("Invalid file type. Must be image or video."))
}

/// `["a","b"]` or `a, b`
fn parse_hash_tags(raw: &str) -> AppResult<Vec<String>> {
    let raw = raw.trim();
    let tags: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw)
            .map_err(|_| AppError::validation("Invalid hashTags. Expected a list of tags."))?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

fn parse_status(raw: &str) -> AppResult<PostStatus> {
    match raw.trim() {
        "Active" => Ok(PostStatus::Active),
        "Hidden" => Ok(PostStatus::Hidden),
        _ => Err(AppError::validation("Invalid status. Must be Active or Hidden.")),
    }
}

fn required_date(
    fields: &HashMap<String, String>,
    key: &str,
    label: &str,
) -> AppResult<bson::DateTime> {
    fields
        .get(key)
        .and_then(|value| parse_date(value))
        .map(bson::DateTime::from_chrono)
        .ok_or_else(|| AppError::validation(format!("Invalid or missing {}.", label)))
}

fn ensure_date_order(start: &bson::DateTime, end: &bson::DateTime) -> AppResult<()> {
    if end < start {
        return Err(AppError::validation(
            "End date must not be before start date.",
        ));
    }
    Ok(())
}

/// Validate the multipart fields of a new post
pub fn validate_new_post(
    content_type: ContentType,
    fields: &HashMap<String, String>,
) -> AppResult<NewPost> {
    let title = required_text(fields.get("postTitle"), "Post title is required.")?;

    let start_date = required_date(fields, "startDate", "start date")?;
    let end_date = required_date(fields, "endDate", "end date")?;
    ensure_date_order(&start_date, &end_date)?;

    let source = optional_text(fields.get("source"), "Invalid source.")?;
    let caption = optional_text(fields.get("caption"), "Invalid caption.")?;

    let hash_tags = match fields.get("hashTags") {
        Some(raw) => parse_hash_tags(raw)?,
        None => Vec::new(),
    };

    let status = optional_text(
        fields.get("status"),
        "Invalid status. Must be Active or Hidden.",
    )?;
    let status = match status {
        Some(raw) => parse_status(&raw)?,
        None => PostStatus::default(),
    };

    let audience = match optional_text(fields.get("audience"), "Invalid audience.")? {
        Some(raw) => serde_json::from_str::<Audience>(&raw)
            .map_err(|e| AppError::validation(format!("Invalid audience: {}", e)))?,
        None => Audience::default(),
    };

    Ok(NewPost {
        content_type,
        title,
        source,
        caption,
        hash_tags,
        start_date: start_date.to_chrono(),
        end_date: end_date.to_chrono(),
        status,
        audience,
    })
}

/// Reject patches that would leave the post in an invalid state
fn validate_patch(patch: &UpdatePostRequest) -> AppResult<()> {
    if patch.is_empty() {
        return Err(AppError::validation("Non-sufficient input"));
    }
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::validation("Post title cannot be empty."));
        }
    }
    Ok(())
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct PostService {
    posts: Arc<dyn PostStore>,
    media: Arc<dyn AssetHost>,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            posts: state.posts.clone(),
            media: state.post_media.clone(),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Post>> {
        Ok(self.posts.list_posts().await?)
    }

    #[instrument(skip_all, fields(file_type = ?file_type))]
    pub async fn upload(
        &self,
        file_type: Option<&str>,
        fields: &HashMap<String, String>,
        file: Option<UploadedFile>,
    ) -> AppResult<Post> {
        let content_type = parse_file_type(file_type)?;
        let new_post = validate_new_post(content_type, fields)?;
        let file = file.ok_or_else(|| AppError::validation("File upload failed"))?;
        let upload = AssetUpload::from_file(content_type.into(), file)?;

        let stored = self.media.upload(upload).await?;
        let pending = PendingAsset::new(self.media.as_ref(), stored);

        let post = new_post.into_post(PostContent {
            url: pending.asset().url.clone(),
            id: pending.asset().id.clone(),
            thumbnail: pending.asset().thumbnail.clone(),
        });

        let inserted = self.posts.insert_post(&post).await;
        match inserted {
            Ok(()) => {
                pending.commit();
                info!(post_id = %post.id, content_type = content_type.as_str(), "Post created");
                Ok(post)
            },
            Err(e) => {
                pending.rollback().await;
                Err(e.into())
            },
        }
    }

    #[instrument(skip_all, fields(post_id = ?post_id))]
    pub async fn update(&self, post_id: Option<&str>, patch: UpdatePostRequest) -> AppResult<Post> {
        let post_id = post_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::validation("Non-sufficient input"))?;
        let id = parse_object_id(post_id)?;
        validate_patch(&patch)?;

        let mut post = self
            .posts
            .find_post(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))?;

        patch.apply(&mut post);
        ensure_date_order(&post.start_date, &post.end_date)?;

        if !self.posts.replace_post(&post).await? {
            return Err(AppError::NotFound("Post not found.".to_string()));
        }

        info!("Post updated");
        Ok(post)
    }

    #[instrument(skip_all, fields(post_id = ?post_id))]
    pub async fn delete(&self, post_id: Option<&str>) -> AppResult<()> {
        let post_id = post_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::validation("Post ID required."))?;
        let id = parse_object_id(post_id)?;

        let post = self
            .posts
            .delete_post(&id)
            .await?
            .ok_or_else(|| AppError::MissingRecord("Invalid post ID".to_string()))?;

        let asset = AssetRef::new(post.content_type.into(), post.content.id);
        delete_best_effort(self.media.as_ref(), &asset).await;

        info!("Post deleted");
        Ok(())
    }
}
