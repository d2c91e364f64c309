// Promotional post model (image or video) and request/response shapes

use bson::{oid::ObjectId, DateTime};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::utils::validation::parse_date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
}

impl ContentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "image" => Some(ContentType::Image),
            "video" => Some(ContentType::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PostStatus {
    #[default]
    Active,
    Hidden,
}

/// Locator of the media on the asset host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostContent {
    pub url: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Who a post is shown to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    #[serde(default)]
    pub gender: Vec<String>,
    #[serde(default)]
    pub id_verification: Vec<String>,
    #[serde(default)]
    pub subscription: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub states: Vec<String>,
}

/// Row in the `adminposts` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: PostContent,
    pub content_type: ContentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub hash_tags: Vec<String>,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub audience: Audience,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Validated post fields awaiting the uploaded media
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub content_type: ContentType,
    pub title: String,
    pub source: Option<String>,
    pub caption: Option<String>,
    pub hash_tags: Vec<String>,
    pub start_date: ChronoDateTime<Utc>,
    pub end_date: ChronoDateTime<Utc>,
    pub status: PostStatus,
    pub audience: Audience,
}

impl NewPost {
    pub fn into_post(self, content: PostContent) -> Post {
        let now = DateTime::now();
        Post {
            id: ObjectId::new(),
            content,
            content_type: self.content_type,
            title: self.title,
            source: self.source,
            caption: self.caption,
            hash_tags: self.hash_tags,
            start_date: DateTime::from_chrono(self.start_date),
            end_date: DateTime::from_chrono(self.end_date),
            status: self.status,
            audience: self.audience,
            created_at: now,
            updated_at: now,
        }
    }
}

/// JSON body of a post update; content and content type are not patchable
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub source: Option<String>,
    pub caption: Option<String>,
    pub hash_tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<ChronoDateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<ChronoDateTime<Utc>>,
    pub status: Option<PostStatus>,
    pub audience: Option<Audience>,
}

// Same formats the upload form accepts
fn optional_date<'de, D>(deserializer: D) -> Result<Option<ChronoDateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
        })
        .transpose()
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        *self == UpdatePostRequest::default()
    }

    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(source) = self.source {
            post.source = Some(source);
        }
        if let Some(caption) = self.caption {
            post.caption = Some(caption);
        }
        if let Some(hash_tags) = self.hash_tags {
            post.hash_tags = hash_tags;
        }
        if let Some(start_date) = self.start_date {
            post.start_date = DateTime::from_chrono(start_date);
        }
        if let Some(end_date) = self.end_date {
            post.end_date = DateTime::from_chrono(end_date);
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(audience) = self.audience {
            post.audience = audience;
        }
        post.updated_at = DateTime::now();
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdQuery {
    pub post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeQuery {
    pub file_type: Option<String>,
}

/// Post as returned over the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: PostContent,
    pub content_type: ContentType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub hash_tags: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub status: PostStatus,
    pub audience: Audience,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_hex(),
            content: post.content,
            content_type: post.content_type,
            title: post.title,
            source: post.source,
            caption: post.caption,
            hash_tags: post.hash_tags,
            start_date: post.start_date.to_chrono().to_rfc3339(),
            end_date: post.end_date.to_chrono().to_rfc3339(),
            status: post.status,
            audience: post.audience,
            created_at: post.created_at.to_chrono().to_rfc3339(),
            updated_at: post.updated_at.to_chrono().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        assert_eq!(ContentType::parse("image"), Some(ContentType::Image));
        assert_eq!(ContentType::parse("video"), Some(ContentType::Video));
        assert_eq!(ContentType::parse("audio"), None);
    }

    #[test]
    fn test_update_rejects_content_type_field() {
        let body = r#"{"title":"New","contentType":"video"}"#;
        assert!(serde_json::from_str::<UpdatePostRequest>(body).is_err());
    }

    #[test]
    fn test_update_status_deserializes() {
        let body = r#"{"status":"Hidden"}"#;
        let update: UpdatePostRequest = serde_json::from_str(body).unwrap();
        assert_eq!(update.status, Some(PostStatus::Hidden));
        assert!(!update.is_empty());
        assert!(UpdatePostRequest::default().is_empty());
    }

    #[test]
    fn test_update_dates_accept_form_formats() {
        let body = r#"{"startDate":"2024-06-01","endDate":"2024-06-30T18:00:00+05:30"}"#;
        let update: UpdatePostRequest = serde_json::from_str(body).unwrap();
        assert_eq!(
            update.start_date.unwrap().to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
        assert_eq!(
            update.end_date.unwrap().to_rfc3339(),
            "2024-06-30T12:30:00+00:00"
        );

        let update: UpdatePostRequest = serde_json::from_str(r#"{"startDate":null}"#).unwrap();
        assert!(update.start_date.is_none());

        assert!(serde_json::from_str::<UpdatePostRequest>(r#"{"endDate":"30/06/2024"}"#).is_err());
    }
}
