use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Asset, DepreciationSnapshot};

/// Persistence seam for asset records.
///
/// Implementations must reject an `insert_assets` batch as a whole with
/// [`AssetError::DuplicateCode`](crate::AssetError::DuplicateCode) when any
/// code is already taken, so callers can retry the allocation.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Every stored code starting with `prefix`, in no particular order.
    async fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    async fn insert_assets(&self, assets: &[Asset]) -> Result<()>;

    async fn list_assets(&self) -> Result<Vec<Asset>>;

    async fn update_depreciation(&self, id: Uuid, snapshot: &DepreciationSnapshot) -> Result<()>;
}
