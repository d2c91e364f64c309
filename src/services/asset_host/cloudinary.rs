// Cloudinary client for doctor portraits
// Signed uploads into a configured folder; deletion by public id

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use super::{url_stem, AssetError, AssetHost, AssetRef, AssetUpload, MediaKind, StoredAsset};
use crate::app_config::CloudinaryConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct CloudinaryHost {
    config: CloudinaryConfig,
    http_client: reqwest::Client,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("medadmin-backend/1.0")
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    fn timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string()
    }

    /// SHA-256 over the alphabetically sorted `key=value` pairs followed by the secret
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let digest = Sha256::digest(format!("{}{}", to_sign, self.config.api_secret).as_bytes());
        format!("{:x}", digest)
    }

    async fn rejected(response: reqwest::Response) -> AssetError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "no error details".to_string(),
        };
        AssetError::Rejected { status, message }
    }
}

#[async_trait]
impl AssetHost for CloudinaryHost {
    async fn upload(&self, upload: AssetUpload) -> Result<StoredAsset, AssetError> {
        if upload.kind != MediaKind::Image {
            return Err(AssetError::UnsupportedMedia(
                "Only images can be stored for doctors.".to_string(),
            ));
        }

        let timestamp = Self::timestamp();
        let signature = self.sign(&[
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let file = Part::bytes(upload.data)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AssetError::InvalidResponse(e.to_string()))?;

        info!(
            public_id = %body.public_id,
            file_name = %upload.file_name,
            "Image uploaded to Cloudinary"
        );

        Ok(StoredAsset {
            kind: MediaKind::Image,
            id: body.public_id,
            url: body.secure_url,
            thumbnail: None,
        })
    }

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetError> {
        let timestamp = Self::timestamp();
        let signature = self.sign(&[
            ("public_id", asset.id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let params = [
            ("public_id", asset.id.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("timestamp", timestamp.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AssetError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => {
                info!(public_id = %asset.id, "Image deleted from Cloudinary");
                Ok(())
            },
            // Already gone; the end state is the one we wanted
            "not found" => {
                warn!(public_id = %asset.id, "Image not found on Cloudinary");
                Ok(())
            },
            other => Err(AssetError::InvalidResponse(format!(
                "destroy returned {}",
                other
            ))),
        }
    }

    fn asset_ref_for_url(&self, url: &str) -> Option<AssetRef> {
        let stem = url_stem(url)?;
        Some(AssetRef::new(
            MediaKind::Image,
            format!("{}/{}", self.config.folder, stem),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> CloudinaryHost {
        CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "abcd".to_string(),
            folder: "doctors".to_string(),
            api_base_url: "https://api.cloudinary.com/v1_1/".to_string(),
        })
    }

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let host = host();
        let signature = host.sign(&[("timestamp", "1315060510"), ("folder", "doctors")]);

        let expected = Sha256::digest(b"folder=doctors&timestamp=1315060510abcd");
        assert_eq!(signature, format!("{:x}", expected));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_asset_ref_from_delivery_url() {
        let host = host();
        let asset = host
            .asset_ref_for_url(
                "https://res.cloudinary.com/demo/image/upload/v1712/doctors/q1w2e3.jpg",
            )
            .unwrap();
        assert_eq!(asset.id, "doctors/q1w2e3");
        assert_eq!(asset.kind, MediaKind::Image);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            host().endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
