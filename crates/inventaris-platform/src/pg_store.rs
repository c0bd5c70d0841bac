use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use inventaris_core::{
    Asset, AssetError, AssetStatus, AssetStore, BulkMembership, DepreciationSnapshot,
    ProcurementSource, Result,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_ASSETS: &str = r#"
    SELECT id, kode, nama, spesifikasi, quantity, satuan, tanggal_perolehan,
           harga_perolehan, umur_ekonomis_bulan, akumulasi_penyusutan, nilai_sisa,
           penyusutan_per_tanggal, keterangan, lokasi_id, asal_pengadaan, category_id,
           status, bulk_id, bulk_sequence, bulk_total_count, is_bulk_parent, created_at
    FROM assets
"#;

/// [`AssetStore`] over the `assets` table.
#[derive(Clone)]
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn storage(err: sqlx::Error) -> AssetError {
    AssetError::Storage(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn to_i32(value: u32, column: &str) -> Result<i32> {
    Ok(i32::try_from(value).with_context(|| format!("{column} out of range: {value}"))?)
}

fn to_u32(value: i32, column: &str) -> Result<u32> {
    Ok(u32::try_from(value).with_context(|| format!("{column} out of range: {value}"))?)
}

fn asset_from_row(row: &PgRow) -> Result<Asset> {
    let bulk_id: Option<Uuid> = row.try_get("bulk_id").map_err(storage)?;
    let bulk = match bulk_id {
        Some(bulk_id) => {
            let sequence: Option<i32> = row.try_get("bulk_sequence").map_err(storage)?;
            let total: Option<i32> = row.try_get("bulk_total_count").map_err(storage)?;
            Some(BulkMembership {
                bulk_id,
                bulk_sequence: to_u32(sequence.unwrap_or(1), "bulk_sequence")?,
                bulk_total_count: to_u32(total.unwrap_or(1), "bulk_total_count")?,
                is_bulk_parent: row.try_get("is_bulk_parent").map_err(storage)?,
            })
        }
        None => None,
    };

    let status: String = row.try_get("status").map_err(storage)?;
    let source: String = row.try_get("asal_pengadaan").map_err(storage)?;
    let life: i32 = row.try_get("umur_ekonomis_bulan").map_err(storage)?;
    let as_of: NaiveDate = row.try_get("penyusutan_per_tanggal").map_err(storage)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage)?;

    Ok(Asset {
        id: row.try_get("id").map_err(storage)?,
        code: row.try_get("kode").map_err(storage)?,
        name: row.try_get("nama").map_err(storage)?,
        specification: row.try_get("spesifikasi").map_err(storage)?,
        quantity: row.try_get("quantity").map_err(storage)?,
        unit: row.try_get("satuan").map_err(storage)?,
        acquired_on: row.try_get("tanggal_perolehan").map_err(storage)?,
        acquisition_cost: row.try_get("harga_perolehan").map_err(storage)?,
        economic_life_months: to_u32(life, "umur_ekonomis_bulan")?,
        depreciation: DepreciationSnapshot {
            accumulated_depreciation: row.try_get("akumulasi_penyusutan").map_err(storage)?,
            book_value: row.try_get("nilai_sisa").map_err(storage)?,
            as_of,
        },
        location_id: row.try_get("lokasi_id").map_err(storage)?,
        category_id: row.try_get("category_id").map_err(storage)?,
        procurement_source: ProcurementSource::from_label(&source),
        status: AssetStatus::normalize(&status),
        notes: row.try_get("keterangan").map_err(storage)?,
        bulk,
        created_at,
    })
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}%", escape_like(prefix));
        let rows = sqlx::query("SELECT kode FROM assets WHERE kode LIKE $1")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("kode").map_err(storage))
            .collect()
    }

    async fn insert_assets(&self, assets: &[Asset]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for asset in assets {
            let (bulk_id, bulk_sequence, bulk_total_count, is_bulk_parent) = match &asset.bulk {
                Some(membership) => (
                    Some(membership.bulk_id),
                    Some(to_i32(membership.bulk_sequence, "bulk_sequence")?),
                    Some(to_i32(membership.bulk_total_count, "bulk_total_count")?),
                    membership.is_bulk_parent,
                ),
                None => (None, None, None, false),
            };

            let result = sqlx::query(
                r#"
                INSERT INTO assets (
                    id, kode, nama, spesifikasi, quantity, satuan, tanggal_perolehan,
                    harga_perolehan, umur_ekonomis_bulan, akumulasi_penyusutan, nilai_sisa,
                    penyusutan_per_tanggal, keterangan, lokasi_id, asal_pengadaan, category_id,
                    status, bulk_id, bulk_sequence, bulk_total_count, is_bulk_parent,
                    created_at, updated_at
                )
                VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $22
                )
                "#,
            )
            .bind(asset.id)
            .bind(&asset.code)
            .bind(&asset.name)
            .bind(&asset.specification)
            .bind(asset.quantity)
            .bind(&asset.unit)
            .bind(asset.acquired_on)
            .bind(asset.acquisition_cost)
            .bind(to_i32(asset.economic_life_months, "umur_ekonomis_bulan")?)
            .bind(asset.depreciation.accumulated_depreciation)
            .bind(asset.depreciation.book_value)
            .bind(asset.depreciation.as_of)
            .bind(&asset.notes)
            .bind(asset.location_id)
            .bind(asset.procurement_source.label())
            .bind(asset.category_id)
            .bind(asset.status.as_str())
            .bind(bulk_id)
            .bind(bulk_sequence)
            .bind(bulk_total_count)
            .bind(is_bulk_parent)
            .bind(asset.created_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = result {
                if is_unique_violation(&err) {
                    debug!(code = %asset.code, "asset code taken by a concurrent writer");
                    return Err(AssetError::DuplicateCode(asset.code.clone()));
                }
                return Err(storage(err));
            }
        }

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let rows = sqlx::query(SELECT_ASSETS)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(asset_from_row).collect()
    }

    async fn update_depreciation(&self, id: Uuid, snapshot: &DepreciationSnapshot) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE assets
            SET akumulasi_penyusutan = $2, nilai_sisa = $3, penyusutan_per_tanggal = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(snapshot.accumulated_depreciation)
        .bind(snapshot.book_value)
        .bind(snapshot.as_of)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(AssetError::NotFound { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("001.10.1.24."), "001.10.1.24.");
        assert_eq!(escape_like("A_B%"), "A\\_B\\%");
        assert_eq!(escape_like("C\\D"), "C\\\\D");
    }

    #[test]
    fn column_conversions_reject_out_of_range() {
        assert!(to_u32(-1, "bulk_sequence").is_err());
        assert!(to_i32(u32::MAX, "umur_ekonomis_bulan").is_err());
        assert_eq!(to_u32(12, "umur_ekonomis_bulan").unwrap(), 12);
    }
}
