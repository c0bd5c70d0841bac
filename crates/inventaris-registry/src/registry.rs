//! Asset creation: allocate a code, value the asset, persist it.
//!
//! The sequence functions are pure, so two callers reading the same scope
//! would pick the same number. Allocation is therefore serialized per scope
//! prefix inside this process, and a `DuplicateCode` from the store (another
//! process won the race) restarts the read-compute-write cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use inventaris_coding::{
    AssetScope, build_bulk_codes, next_sequence, next_sequence_range, split_bulk_suffix,
};
use inventaris_core::{
    Asset, AssetError, AssetStore, BulkAssetGroup, BulkMembership, DepreciationSnapshot,
    NewAsset, Result,
};
use inventaris_finance::{DepreciationInput, compute};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{BulkCodeStrategy, CodingConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub examined: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct AssetRegistry<S>
where
    S: AssetStore,
{
    store: S,
    config: CodingConfig,
    scope_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S> AssetRegistry<S>
where
    S: AssetStore,
{
    pub fn new(store: S, config: CodingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            scope_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CodingConfig {
        &self.config
    }

    /// Scope an asset allocates in, falling back to the configured location
    /// and category codes when the asset has none.
    pub fn scope_for(&self, asset: &NewAsset) -> Result<AssetScope> {
        let location = non_blank(asset.location_code.as_deref())
            .unwrap_or(self.config.default_location_code.as_str());
        let category = non_blank(asset.category_code.as_deref())
            .unwrap_or(self.config.default_category_code.as_str());

        AssetScope::new(
            location,
            category,
            asset.procurement_source,
            asset.acquired_on.year(),
        )
    }

    pub async fn create_asset(&self, new: NewAsset, as_of: NaiveDate) -> Result<Asset> {
        let scope = self.scope_for(&new)?;
        let (input, snapshot) = value(&new, as_of)?;
        let width = self.config.sequence_width;

        let mut created = self
            .allocate(&scope.prefix(), |codes| {
                let sequence = next_sequence(codes);
                let code = scope.code(sequence, width)?;
                Ok(vec![materialize(&new, code, &input, &snapshot, None)])
            })
            .await?;

        let asset = created
            .pop()
            .ok_or_else(|| AssetError::invalid("allocation produced no asset"))?;
        info!(code = %asset.code, "asset created");
        Ok(asset)
    }

    /// Creates `quantity` individually tracked units sharing one bulk id.
    pub async fn create_bulk_assets(
        &self,
        template: NewAsset,
        quantity: u32,
        as_of: NaiveDate,
    ) -> Result<BulkAssetGroup> {
        if quantity == 0 {
            return Err(AssetError::invalid("bulk quantity must be positive"));
        }

        let scope = self.scope_for(&template)?;
        let (input, snapshot) = value(&template, as_of)?;
        let width = self.config.sequence_width;
        let strategy = self.config.bulk_codes;
        let bulk_id = Uuid::new_v4();

        let units = self
            .allocate(&scope.prefix(), |codes| {
                let unit_codes = match strategy {
                    BulkCodeStrategy::SequenceRange => next_sequence_range(codes, quantity)?
                        .iter()
                        .map(|sequence| scope.code(sequence, width))
                        .collect::<Result<Vec<_>>>()?,
                    BulkCodeStrategy::Suffixed => {
                        let base = scope.code(next_sequence(codes), width)?;
                        build_bulk_codes(&base, quantity)?
                    }
                };

                Ok(unit_codes
                    .into_iter()
                    .zip(1..=quantity)
                    .map(|(code, position)| {
                        let membership = BulkMembership {
                            bulk_id,
                            bulk_sequence: position,
                            bulk_total_count: quantity,
                            is_bulk_parent: position == 1,
                        };
                        let mut unit =
                            materialize(&template, code, &input, &snapshot, Some(membership));
                        unit.quantity = 1;
                        unit
                    })
                    .collect())
            })
            .await?;

        let group = BulkAssetGroup::from_units(units)?;
        info!(
            %bulk_id,
            quantity,
            first = %group.units[0].code,
            "bulk assets created"
        );
        Ok(group)
    }

    /// Recomputes the cached depreciation of every stored asset and writes
    /// back the ones that changed.
    pub async fn refresh_depreciation(&self, as_of: NaiveDate) -> Result<RefreshSummary> {
        let mut summary = RefreshSummary::default();

        for asset in self.store.list_assets().await? {
            summary.examined += 1;

            let input = match DepreciationInput::from_asset(&asset) {
                Ok(input) => input,
                Err(err) => {
                    warn!(code = %asset.code, "skipping depreciation refresh: {err}");
                    summary.skipped += 1;
                    continue;
                }
            };

            let snapshot = compute(&input, as_of).snapshot(as_of);
            if snapshot == asset.depreciation {
                continue;
            }

            match self.store.update_depreciation(asset.id, &snapshot).await {
                Ok(()) => summary.updated += 1,
                Err(AssetError::NotFound { id }) => {
                    warn!(%id, code = %asset.code, "asset vanished before depreciation refresh");
                    summary.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        debug!(?summary, %as_of, "depreciation refreshed");
        Ok(summary)
    }

    async fn scope_lock(&self, prefix: &str) -> Arc<Mutex<()>> {
        let mut locks = self.scope_locks.lock().await;
        locks
            .entry(prefix.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs read-compute-write under the scope lock, retrying when the store
    /// reports that a freshly built code is already taken.
    async fn allocate<F>(&self, prefix: &str, build: F) -> Result<Vec<Asset>>
    where
        F: Fn(&[String]) -> Result<Vec<Asset>>,
    {
        let lock = self.scope_lock(prefix).await;
        let _guard = lock.lock().await;

        let attempts = self.config.max_allocation_attempts;
        for attempt in 1..=attempts {
            let codes = base_codes(&self.store.codes_with_prefix(prefix).await?);
            let assets = build(&codes)?;

            match self.store.insert_assets(&assets).await {
                Ok(()) => return Ok(assets),
                Err(err) if err.is_retryable() => {
                    warn!(prefix, attempt, "code allocation collided: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        Err(AssetError::AllocationExhausted {
            prefix: prefix.to_string(),
            attempts,
        })
    }
}

/// Strips `-NNN` bulk suffixes so a batch keeps its sequence taken while any
/// of its units remain.
fn base_codes(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|code| split_bulk_suffix(code).0)
        .collect::<HashSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn value(asset: &NewAsset, as_of: NaiveDate) -> Result<(DepreciationInput, DepreciationSnapshot)> {
    let input = DepreciationInput::from_years(
        asset.acquisition_cost,
        asset.economic_life_years,
        asset.acquired_on,
    )?;
    let snapshot = compute(&input, as_of).snapshot(as_of);
    Ok((input, snapshot))
}

fn materialize(
    new: &NewAsset,
    code: String,
    input: &DepreciationInput,
    snapshot: &DepreciationSnapshot,
    bulk: Option<BulkMembership>,
) -> Asset {
    Asset {
        id: Uuid::new_v4(),
        code,
        name: new.name.clone(),
        specification: new.specification.clone(),
        quantity: new.quantity,
        unit: new.unit.clone(),
        acquired_on: new.acquired_on,
        acquisition_cost: new.acquisition_cost,
        economic_life_months: input.economic_life_months(),
        depreciation: snapshot.clone(),
        location_id: new.location_id,
        category_id: new.category_id,
        procurement_source: new.procurement_source,
        status: new.status,
        notes: new.notes.clone(),
        bulk,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use inventaris_coding::{parse_sequence, split_bulk_suffix};
    use inventaris_core::{AssetStatus, ProcurementSource};
    use rust_decimal::Decimal;

    use super::*;
    use crate::memory::InMemoryAssetStore;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn laptop() -> NewAsset {
        NewAsset {
            name: "Laptop".to_string(),
            specification: Some("14 inch".to_string()),
            quantity: 1,
            unit: "unit".to_string(),
            acquired_on: date(2024, 3, 1),
            acquisition_cost: Decimal::from(12_000_000),
            economic_life_years: 4,
            location_id: Some(7),
            location_code: Some("1".to_string()),
            category_id: Uuid::nil(),
            category_code: Some("10".to_string()),
            procurement_source: ProcurementSource::Purchase,
            status: AssetStatus::Good,
            notes: None,
        }
    }

    fn registry() -> AssetRegistry<InMemoryAssetStore> {
        AssetRegistry::new(InMemoryAssetStore::new(), CodingConfig::default()).unwrap()
    }

    async fn seed(store: &InMemoryAssetStore, codes: &[&str]) {
        let (input, snapshot) = value(&laptop(), date(2024, 3, 1)).unwrap();
        let assets: Vec<Asset> = codes
            .iter()
            .map(|code| materialize(&laptop(), code.to_string(), &input, &snapshot, None))
            .collect();
        store.insert_assets(&assets).await.unwrap();
    }

    #[tokio::test]
    async fn first_asset_in_scope_gets_sequence_one() {
        let registry = registry();
        let asset = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();

        assert_eq!(asset.code, "001.10.1.24.001");
        assert_eq!(asset.economic_life_months, 48);
        assert_eq!(asset.depreciation.accumulated_depreciation, Decimal::from(3_000_000));
        assert_eq!(asset.depreciation.book_value, Decimal::from(9_000_000));
        assert!(asset.bulk.is_none());
    }

    #[tokio::test]
    async fn continues_past_highest_existing_sequence() {
        let registry = registry();
        seed(
            registry.store(),
            &["001.10.1.24.001", "001.10.1.24.005", "INVALID-CODE"],
        )
        .await;

        let asset = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        assert_eq!(asset.code, "001.10.1.24.006");
    }

    #[tokio::test]
    async fn deleted_sequences_are_not_reused() {
        let registry = registry();
        let first = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        let second = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        registry.store().delete(first.id).await.unwrap();

        let third = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        assert_eq!(second.code, "001.10.1.24.002");
        assert_eq!(third.code, "001.10.1.24.003");
    }

    #[tokio::test]
    async fn scopes_allocate_independently() {
        let registry = registry();
        seed(registry.store(), &["001.10.1.24.009"]).await;

        let mut grant = laptop();
        grant.procurement_source = ProcurementSource::Grant;
        let asset = registry.create_asset(grant, date(2025, 3, 1)).await.unwrap();
        assert_eq!(asset.code, "001.10.3.24.001");
    }

    #[tokio::test]
    async fn missing_segment_codes_use_defaults() {
        let registry = registry();
        let mut asset = laptop();
        asset.location_code = None;
        asset.category_code = Some("  ".to_string());

        let created = registry.create_asset(asset, date(2025, 3, 1)).await.unwrap();
        assert_eq!(created.code, "001.10.1.24.001");
    }

    #[tokio::test]
    async fn negative_cost_is_rejected_before_allocation() {
        let registry = registry();
        let mut asset = laptop();
        asset.acquisition_cost = Decimal::from(-5);

        assert_matches!(
            registry.create_asset(asset, date(2025, 3, 1)).await,
            Err(AssetError::InvalidArgument(_))
        );
        assert!(registry.store().is_empty().await);
    }

    #[tokio::test]
    async fn bulk_range_gives_each_unit_its_own_sequence() {
        let registry = registry();
        seed(registry.store(), &["001.10.1.24.003"]).await;

        let group = registry
            .create_bulk_assets(laptop(), 3, date(2025, 3, 1))
            .await
            .unwrap();

        assert_eq!(
            group.codes(),
            vec!["001.10.1.24.004", "001.10.1.24.005", "001.10.1.24.006"]
        );
        assert_eq!(group.parent().unwrap().code, "001.10.1.24.004");
        assert!(group.units.iter().all(|unit| unit.quantity == 1));
        assert_eq!(registry.store().len().await, 4);
    }

    #[tokio::test]
    async fn bulk_suffixed_shares_one_sequence() {
        let config = CodingConfig {
            bulk_codes: BulkCodeStrategy::Suffixed,
            ..CodingConfig::default()
        };
        let registry = AssetRegistry::new(InMemoryAssetStore::new(), config).unwrap();

        let group = registry
            .create_bulk_assets(laptop(), 3, date(2025, 3, 1))
            .await
            .unwrap();
        assert_eq!(
            group.codes(),
            vec!["001.10.1.24.001", "001.10.1.24.001-002", "001.10.1.24.001-003"]
        );

        for unit in &group.units {
            let (_, suffix) = split_bulk_suffix(&unit.code);
            let position = unit.bulk.as_ref().unwrap().bulk_sequence;
            assert_eq!(suffix.unwrap_or(1), position);
        }

        let next = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        assert_eq!(next.code, "001.10.1.24.002");
    }

    #[tokio::test]
    async fn suffixed_batch_keeps_its_sequence_after_parent_delete() {
        let config = CodingConfig {
            bulk_codes: BulkCodeStrategy::Suffixed,
            ..CodingConfig::default()
        };
        let registry = AssetRegistry::new(InMemoryAssetStore::new(), config).unwrap();

        let first = registry
            .create_bulk_assets(laptop(), 3, date(2025, 3, 1))
            .await
            .unwrap();
        let parent = first.parent().unwrap().id;
        registry.store().delete(parent).await.unwrap();

        let second = registry
            .create_bulk_assets(laptop(), 3, date(2025, 3, 1))
            .await
            .unwrap();
        assert_eq!(
            second.codes(),
            vec!["001.10.1.24.002", "001.10.1.24.002-002", "001.10.1.24.002-003"]
        );

        let single = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        assert_eq!(single.code, "001.10.1.24.003");
    }

    #[tokio::test]
    async fn zero_quantity_bulk_is_invalid() {
        let registry = registry();
        assert_matches!(
            registry.create_bulk_assets(laptop(), 0, date(2025, 3, 1)).await,
            Err(AssetError::InvalidArgument(_))
        );
    }

    #[tokio::test]
    async fn concurrent_creation_never_duplicates() {
        let registry = Arc::new(registry());

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    registry
                        .create_bulk_assets(laptop(), 3, date(2025, 3, 1))
                        .await
                        .map(|group| group.units.len())
                } else {
                    registry
                        .create_asset(laptop(), date(2025, 3, 1))
                        .await
                        .map(|_| 1)
                }
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap();
        }

        let mut sequences: Vec<u32> = registry
            .store()
            .list_assets()
            .await
            .unwrap()
            .iter()
            .filter_map(|asset| parse_sequence(&asset.code))
            .collect();
        sequences.sort_unstable();

        assert_eq!(total, 24);
        assert_eq!(sequences, (1..=24).collect::<Vec<u32>>());
    }

    /// Lets another writer take the next code right before each of the first
    /// `collisions` inserts, as a racing process would.
    struct RacingStore {
        inner: InMemoryAssetStore,
        collisions: AtomicU32,
    }

    #[async_trait]
    impl AssetStore for RacingStore {
        async fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.codes_with_prefix(prefix).await
        }

        async fn insert_assets(&self, assets: &[Asset]) -> Result<()> {
            if self.collisions.load(Ordering::SeqCst) > 0 {
                self.collisions.fetch_sub(1, Ordering::SeqCst);
                let mut rival = assets[0].clone();
                rival.id = Uuid::new_v4();
                self.inner.insert_assets(&[rival]).await?;
            }
            self.inner.insert_assets(assets).await
        }

        async fn list_assets(&self) -> Result<Vec<Asset>> {
            self.inner.list_assets().await
        }

        async fn update_depreciation(&self, id: Uuid, snapshot: &DepreciationSnapshot) -> Result<()> {
            self.inner.update_depreciation(id, snapshot).await
        }
    }

    #[tokio::test]
    async fn retries_after_losing_a_race() {
        let store = RacingStore {
            inner: InMemoryAssetStore::new(),
            collisions: AtomicU32::new(2),
        };
        let registry = AssetRegistry::new(store, CodingConfig::default()).unwrap();

        let asset = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        assert_eq!(asset.code, "001.10.1.24.003");
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let store = RacingStore {
            inner: InMemoryAssetStore::new(),
            collisions: AtomicU32::new(10),
        };
        let config = CodingConfig {
            max_allocation_attempts: 3,
            ..CodingConfig::default()
        };
        let registry = AssetRegistry::new(store, config).unwrap();

        assert_matches!(
            registry.create_asset(laptop(), date(2025, 3, 1)).await,
            Err(AssetError::AllocationExhausted { attempts: 3, .. })
        );
    }

    #[tokio::test]
    async fn refresh_updates_stale_snapshots_only() {
        let registry = registry();
        let asset = registry.create_asset(laptop(), date(2024, 3, 1)).await.unwrap();
        assert_eq!(asset.depreciation.book_value, Decimal::from(12_000_000));

        let summary = registry.refresh_depreciation(date(2026, 3, 1)).await.unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.updated, 1);

        let refreshed = registry.store().get(asset.id).await.unwrap();
        assert_eq!(refreshed.depreciation.book_value, Decimal::from(6_000_000));
        assert_eq!(refreshed.depreciation.as_of, date(2026, 3, 1));

        let again = registry.refresh_depreciation(date(2026, 3, 1)).await.unwrap();
        assert_eq!(again.updated, 0);
    }

    /// Lists one asset that is gone by the time its snapshot is written.
    struct VanishingStore {
        inner: InMemoryAssetStore,
        ghost: Asset,
    }

    #[async_trait]
    impl AssetStore for VanishingStore {
        async fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.codes_with_prefix(prefix).await
        }

        async fn insert_assets(&self, assets: &[Asset]) -> Result<()> {
            self.inner.insert_assets(assets).await
        }

        async fn list_assets(&self) -> Result<Vec<Asset>> {
            let mut assets = vec![self.ghost.clone()];
            assets.extend(self.inner.list_assets().await?);
            Ok(assets)
        }

        async fn update_depreciation(&self, id: Uuid, snapshot: &DepreciationSnapshot) -> Result<()> {
            self.inner.update_depreciation(id, snapshot).await
        }
    }

    #[tokio::test]
    async fn refresh_skips_assets_deleted_mid_pass() {
        let (input, snapshot) = value(&laptop(), date(2024, 3, 1)).unwrap();
        let ghost = materialize(&laptop(), "001.10.1.24.099".to_string(), &input, &snapshot, None);
        let store = VanishingStore {
            inner: InMemoryAssetStore::new(),
            ghost,
        };
        let registry = AssetRegistry::new(store, CodingConfig::default()).unwrap();
        let kept = registry.create_asset(laptop(), date(2024, 3, 1)).await.unwrap();

        let summary = registry.refresh_depreciation(date(2026, 3, 1)).await.unwrap();
        assert_eq!(summary.examined, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);

        let refreshed = registry.store().inner.get(kept.id).await.unwrap();
        assert_eq!(refreshed.depreciation.book_value, Decimal::from(6_000_000));
    }

    #[tokio::test]
    async fn edits_do_not_touch_the_code() {
        let registry = registry();
        let asset = registry.create_asset(laptop(), date(2025, 3, 1)).await.unwrap();
        registry.refresh_depreciation(date(2027, 1, 1)).await.unwrap();

        let stored = registry.store().get(asset.id).await.unwrap();
        assert_eq!(stored.code, asset.code);
    }
}
