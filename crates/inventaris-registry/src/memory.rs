use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use inventaris_core::{Asset, AssetError, AssetStore, DepreciationSnapshot, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    assets: HashMap<Uuid, Asset>,
    codes: HashSet<String>,
}

/// Process-local store with a unique index on asset codes.
#[derive(Default)]
pub struct InMemoryAssetStore {
    inner: RwLock<Inner>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.assets.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.assets.is_empty()
    }

    pub async fn get(&self, id: Uuid) -> Option<Asset> {
        self.inner.read().await.assets.get(&id).cloned()
    }

    pub async fn delete(&self, id: Uuid) -> Option<Asset> {
        let mut inner = self.inner.write().await;
        let removed = inner.assets.remove(&id)?;
        inner.codes.remove(&removed.code);
        Some(removed)
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .codes
            .iter()
            .filter(|code| code.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn insert_assets(&self, assets: &[Asset]) -> Result<()> {
        let mut inner = self.inner.write().await;

        let mut batch = HashSet::new();
        for asset in assets {
            if inner.codes.contains(&asset.code) || !batch.insert(asset.code.as_str()) {
                return Err(AssetError::DuplicateCode(asset.code.clone()));
            }
        }

        for asset in assets {
            inner.codes.insert(asset.code.clone());
            inner.assets.insert(asset.id, asset.clone());
        }
        Ok(())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let inner = self.inner.read().await;
        Ok(inner.assets.values().cloned().collect())
    }

    async fn update_depreciation(&self, id: Uuid, snapshot: &DepreciationSnapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        let asset = inner.assets.get_mut(&id).ok_or(AssetError::NotFound { id })?;
        asset.depreciation = snapshot.clone();
        Ok(())
    }
}
