// Cloudflare client for promotional post media
// Images API for pictures, Stream API for video

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::{AssetError, AssetHost, AssetRef, AssetUpload, MediaKind, StoredAsset};
use crate::app_config::CloudflareConfig;

/// Common Cloudflare v4 API envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    id: String,
    #[serde(default)]
    variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StreamResult {
    uid: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    playback: Option<Playback>,
}

#[derive(Debug, Deserialize)]
struct Playback {
    hls: Option<String>,
}

pub struct CloudflareHost {
    config: CloudflareConfig,
    http_client: reqwest::Client,
}

impl CloudflareHost {
    pub fn new(config: CloudflareConfig) -> Self {
        let http_client = reqwest::Client::builder()
            // Video uploads can be large
            .timeout(Duration::from_secs(300))
            .user_agent("medadmin-backend/1.0")
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn account_url(&self, path: &str) -> String {
        format!(
            "{}/accounts/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.account_id,
            path
        )
    }

    fn token_for(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.config.images_api_key,
            MediaKind::Video => &self.config.stream_api_token,
        }
    }

    fn collection_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Image => "images/v1",
            MediaKind::Video => "stream",
        }
    }

    /// Unwrap the v4 envelope, turning `success: false` into a rejection
    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AssetError> {
        let status = response.status().as_u16();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AssetError::InvalidResponse(e.to_string()))?;

        if !envelope.success {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AssetError::Rejected { status, message });
        }

        envelope
            .result
            .ok_or_else(|| AssetError::InvalidResponse("missing result".to_string()))
    }

    fn image_asset(result: ImageResult) -> Result<StoredAsset, AssetError> {
        let url = result
            .variants
            .into_iter()
            .next()
            .ok_or_else(|| AssetError::InvalidResponse("image has no variants".to_string()))?;
        Ok(StoredAsset {
            kind: MediaKind::Image,
            id: result.id,
            url,
            thumbnail: None,
        })
    }

    fn video_asset(result: StreamResult) -> Result<StoredAsset, AssetError> {
        let url = result
            .playback
            .and_then(|p| p.hls)
            .ok_or_else(|| AssetError::InvalidResponse("video has no playback URL".to_string()))?;
        Ok(StoredAsset {
            kind: MediaKind::Video,
            id: result.uid,
            url,
            thumbnail: result.thumbnail,
        })
    }
}

#[async_trait]
impl AssetHost for CloudflareHost {
    async fn upload(&self, upload: AssetUpload) -> Result<StoredAsset, AssetError> {
        let kind = upload.kind;
        let file = Part::bytes(upload.data)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new().part("file", file);

        let response = self
            .http_client
            .post(self.account_url(Self::collection_path(kind)))
            .bearer_auth(self.token_for(kind))
            .multipart(form)
            .send()
            .await?;

        let asset = match kind {
            MediaKind::Image => Self::image_asset(Self::parse(response).await?)?,
            MediaKind::Video => Self::video_asset(Self::parse(response).await?)?,
        };

        info!(
            asset_id = %asset.id,
            kind = ?kind,
            file_name = %upload.file_name,
            "Media uploaded to Cloudflare"
        );
        Ok(asset)
    }

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetError> {
        let path = format!("{}/{}", Self::collection_path(asset.kind), asset.id);
        let response = self
            .http_client
            .delete(self.account_url(&path))
            .bearer_auth(self.token_for(asset.kind))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssetError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!(asset_id = %asset.id, kind = ?asset.kind, "Media deleted from Cloudflare");
        Ok(())
    }

    /// Posts keep the asset id next to the URL, so this is never needed for them
    fn asset_ref_for_url(&self, _url: &str) -> Option<AssetRef> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> CloudflareHost {
        CloudflareHost::new(CloudflareConfig {
            account_id: "acct".to_string(),
            images_api_key: "images-key".to_string(),
            stream_api_token: "stream-token".to_string(),
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
        })
    }

    #[test]
    fn test_urls_per_media_kind() {
        let host = host();
        assert_eq!(
            host.account_url(CloudflareHost::collection_path(MediaKind::Image)),
            "https://api.cloudflare.com/client/v4/accounts/acct/images/v1"
        );
        assert_eq!(
            host.account_url(CloudflareHost::collection_path(MediaKind::Video)),
            "https://api.cloudflare.com/client/v4/accounts/acct/stream"
        );
        assert_eq!(host.token_for(MediaKind::Video), "stream-token");
    }

    #[test]
    fn test_image_uses_first_variant() {
        let body = r#"{"success":true,"errors":[],"result":{"id":"img-1","variants":["https://imagedelivery.net/h/img-1/public","https://imagedelivery.net/h/img-1/thumb"]}}"#;
        let envelope: Envelope<ImageResult> = serde_json::from_str(body).unwrap();
        let asset = CloudflareHost::image_asset(envelope.result.unwrap()).unwrap();

        assert_eq!(asset.id, "img-1");
        assert_eq!(asset.url, "https://imagedelivery.net/h/img-1/public");
    }

    #[test]
    fn test_video_uses_hls_playback() {
        let body = r#"{"success":true,"errors":[],"result":{"uid":"vid-9","thumbnail":"https://videodelivery.net/vid-9/thumbnails/thumbnail.jpg","playback":{"hls":"https://videodelivery.net/vid-9/manifest/video.m3u8","dash":"https://videodelivery.net/vid-9/manifest/video.mpd"}}}"#;
        let envelope: Envelope<StreamResult> = serde_json::from_str(body).unwrap();
        let asset = CloudflareHost::video_asset(envelope.result.unwrap()).unwrap();

        assert_eq!(asset.id, "vid-9");
        assert!(asset.url.ends_with("video.m3u8"));
        assert!(asset.thumbnail.is_some());
    }

    #[test]
    fn test_image_without_variants_is_invalid() {
        let result = ImageResult {
            id: "img-2".to_string(),
            variants: vec![],
        };
        assert!(matches!(
            CloudflareHost::image_asset(result),
            Err(AssetError::InvalidResponse(_))
        ));
    }
}
