// In-process asset host that records uploads and deletions

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};
use uuid::Uuid;

use super::{url_stem, AssetError, AssetHost, AssetRef, AssetUpload, MediaKind, StoredAsset};

const BASE_URL: &str = "https://assets.test";

#[derive(Default)]
pub struct MemoryAssetHost {
    stored: Mutex<Vec<StoredAsset>>,
    deleted: Mutex<Vec<AssetRef>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryAssetHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail as if the host were down
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Assets uploaded and not deleted
    pub fn stored(&self) -> Vec<StoredAsset> {
        lock(&self.stored).clone()
    }

    pub fn stored_count(&self) -> usize {
        lock(&self.stored).len()
    }

    /// Every successful deletion, in order
    pub fn deleted(&self) -> Vec<AssetRef> {
        lock(&self.deleted).clone()
    }

    fn unavailable(status: u16) -> AssetError {
        AssetError::Rejected {
            status,
            message: "asset host unavailable".to_string(),
        }
    }
}

#[async_trait]
impl AssetHost for MemoryAssetHost {
    async fn upload(&self, upload: AssetUpload) -> Result<StoredAsset, AssetError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Self::unavailable(503));
        }

        let id = Uuid::new_v4().simple().to_string();
        let asset = match upload.kind {
            MediaKind::Image => StoredAsset {
                kind: MediaKind::Image,
                url: format!("{}/{}.png", BASE_URL, id),
                id,
                thumbnail: None,
            },
            MediaKind::Video => StoredAsset {
                kind: MediaKind::Video,
                url: format!("{}/{}.m3u8", BASE_URL, id),
                thumbnail: Some(format!("{}/{}.jpg", BASE_URL, id)),
                id,
            },
        };

        lock(&self.stored).push(asset.clone());
        Ok(asset)
    }

    async fn delete(&self, asset: &AssetRef) -> Result<(), AssetError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::unavailable(503));
        }

        lock(&self.stored).retain(|stored| stored.id != asset.id);
        lock(&self.deleted).push(asset.clone());
        Ok(())
    }

    fn asset_ref_for_url(&self, url: &str) -> Option<AssetRef> {
        url_stem(url).map(|id| AssetRef::new(MediaKind::Image, id))
    }
}
