pub mod config;
pub mod db;
pub mod pg_store;

pub use config::{ServiceConfig, load_coding_config};
pub use db::{connect_database, ensure_schema};
pub use pg_store::PgAssetStore;
