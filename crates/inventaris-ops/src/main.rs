use anyhow::Result;
use chrono::Utc;
use inventaris_platform::{
    PgAssetStore, ServiceConfig, connect_database, ensure_schema, load_coding_config,
};
use inventaris_registry::AssetRegistry;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

/// Refreshes cached depreciation on every asset, once or on an interval.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "inventaris_ops=info".to_string()),
        )
        .init();

    let run_once = std::env::args().skip(1).any(|arg| arg == "--once");

    let config = ServiceConfig::from_env()?;
    let coding = load_coding_config()?;
    let pool = connect_database(&config).await?;
    ensure_schema(&pool).await?;
    let registry = AssetRegistry::new(PgAssetStore::new(pool), coding)?;

    if run_once {
        return refresh(&registry).await;
    }

    info!(
        interval_secs = config.refresh_interval.as_secs(),
        "depreciation worker started"
    );

    let mut ticker = interval(config.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = refresh(&registry).await {
            error!("depreciation refresh failed: {err:#}");
        }
    }
}

async fn refresh(registry: &AssetRegistry<PgAssetStore>) -> Result<()> {
    let today = Utc::now().date_naive();
    let summary = registry.refresh_depreciation(today).await?;
    info!(
        %today,
        examined = summary.examined,
        updated = summary.updated,
        skipped = summary.skipped,
        "depreciation snapshots refreshed"
    );
    Ok(())
}
