// Compensating action for uploads that precede a database write

use tracing::{error, info};

use super::{AssetHost, AssetRef, StoredAsset};

/// An uploaded asset that is not yet referenced by any row.
///
/// The owner must either `commit` it once the row is persisted or `rollback`
/// it when anything after the upload fails.
#[must_use = "an uploaded asset must be committed or rolled back"]
pub struct PendingAsset<'a> {
    host: &'a dyn AssetHost,
    asset: StoredAsset,
}

impl<'a> PendingAsset<'a> {
    pub fn new(host: &'a dyn AssetHost, asset: StoredAsset) -> Self {
        Self { host, asset }
    }

    pub fn asset(&self) -> &StoredAsset {
        &self.asset
    }

    /// The row now references the asset; nothing left to undo
    pub fn commit(self) -> StoredAsset {
        self.asset
    }

    /// Delete the orphaned upload. Failures are logged and swallowed so the
    /// caller can still surface the error that triggered the rollback.
    pub async fn rollback(self) {
        let asset_ref = self.asset.asset_ref();
        match self.host.delete(&asset_ref).await {
            Ok(()) => info!(asset_id = %asset_ref.id, "Rolled back uploaded asset"),
            Err(e) => error!(asset_id = %asset_ref.id, error = %e, "cleanup failed"),
        }
    }
}

/// Delete an asset whose row is already gone; failures only get logged
pub async fn delete_best_effort(host: &dyn AssetHost, asset: &AssetRef) {
    if let Err(e) = host.delete(asset).await {
        error!(asset_id = %asset.id, error = %e, "cleanup failed");
    }
}
