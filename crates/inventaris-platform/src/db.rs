use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::ServiceConfig;

pub async fn connect_database(config: &ServiceConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the asset database")?;

    Ok(pool)
}

/// Creates the asset table when it does not exist yet. The unique index on
/// `kode` is what turns a lost allocation race into a retryable conflict.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id UUID PRIMARY KEY,
            kode VARCHAR(50) NOT NULL,
            nama VARCHAR(255) NOT NULL,
            spesifikasi TEXT,
            quantity INTEGER NOT NULL,
            satuan VARCHAR(50) NOT NULL,
            tanggal_perolehan DATE NOT NULL,
            harga_perolehan NUMERIC(15, 2) NOT NULL CHECK (harga_perolehan >= 0),
            umur_ekonomis_bulan INTEGER NOT NULL CHECK (umur_ekonomis_bulan >= 0),
            akumulasi_penyusutan NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (akumulasi_penyusutan >= 0),
            nilai_sisa NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (nilai_sisa >= 0),
            penyusutan_per_tanggal DATE NOT NULL,
            keterangan TEXT,
            lokasi_id BIGINT,
            asal_pengadaan VARCHAR(50) NOT NULL DEFAULT 'pembelian',
            category_id UUID NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'baik',
            bulk_id UUID,
            bulk_sequence INTEGER,
            bulk_total_count INTEGER,
            is_bulk_parent BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create assets table")?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS assets_kode_key ON assets (kode)")
        .execute(pool)
        .await
        .context("failed to create assets code index")?;

    Ok(())
}
