// Asset hosts: external media storage for doctor portraits and post media

pub mod cloudflare;
pub mod cloudinary;
pub mod memory;
pub mod pending;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use cloudflare::CloudflareHost;
pub use cloudinary::CloudinaryHost;
pub use memory::MemoryAssetHost;
pub use pending::{delete_best_effort, PendingAsset};

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{0}")]
    UnsupportedMedia(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Asset host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected asset host response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// DATA STRUCTURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi"];

impl MediaKind {
    fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_EXTENSIONS,
            MediaKind::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Accept a file when either its declared MIME type or its extension matches
    fn accepts(&self, file_name: &str, content_type: Option<&str>) -> bool {
        let mime_matches = content_type
            .map(|ct| ct.trim().to_ascii_lowercase())
            .is_some_and(|ct| ct.starts_with(&format!("{}/", self.label())));

        let extension_matches = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()));

        mime_matches || extension_matches
    }
}

/// A file as received in a multipart request, not yet checked
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A file ready to be sent to an asset host
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub kind: MediaKind,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl AssetUpload {
    /// Build an upload, rejecting files that are not of the expected kind
    pub fn new(
        kind: MediaKind,
        file_name: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<Self, AssetError> {
        if data.is_empty() {
            return Err(AssetError::UnsupportedMedia(format!(
                "Uploaded {} is empty.",
                kind.label()
            )));
        }
        if !kind.accepts(file_name, content_type) {
            return Err(AssetError::UnsupportedMedia(format!(
                "Unsupported file type for {} upload.",
                kind.label()
            )));
        }

        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(Self {
            kind,
            file_name: file_name.to_string(),
            content_type,
            data,
        })
    }

    pub fn from_file(kind: MediaKind, file: UploadedFile) -> Result<Self, AssetError> {
        Self::new(kind, &file.file_name, file.content_type.as_deref(), file.data)
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub kind: MediaKind,
    /// Host-side identifier used for deletion
    pub id: String,
    pub url: String,
    pub thumbnail: Option<String>,
}

impl StoredAsset {
    pub fn asset_ref(&self) -> AssetRef {
        AssetRef {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

/// Locator of an existing asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: MediaKind,
    pub id: String,
}

impl AssetRef {
    pub fn new(kind: MediaKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Last path segment of a URL with its extension stripped
pub(crate) fn url_stem(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = last.split('.').next()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

// =============================================================================
// ASSET HOST TRAIT
// =============================================================================

#[async_trait]
pub trait AssetHost: Send + Sync {
    async fn upload(&self, upload: AssetUpload) -> Result<StoredAsset, AssetError>;

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetError>;

    /// Recover the asset locator from a stored URL, for rows that keep only the URL
    fn asset_ref_for_url(&self, url: &str) -> Option<AssetRef>;
}
