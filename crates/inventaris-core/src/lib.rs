pub mod error;
pub mod models;
pub mod standards;
pub mod storage;

pub use error::{AssetError, Result};
pub use models::{
    Asset, AssetStatus, BulkAssetGroup, BulkMembership, DepreciationSnapshot, NewAsset,
    ProcurementSource,
};
pub use standards::{ChartOfAccounts, SakProfile, StandardsProfile};
pub use storage::AssetStore;
