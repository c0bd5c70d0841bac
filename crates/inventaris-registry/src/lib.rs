pub mod config;
pub mod memory;
pub mod registry;

pub use config::{BulkCodeStrategy, CodingConfig};
pub use memory::InMemoryAssetStore;
pub use registry::{AssetRegistry, RefreshSummary};
