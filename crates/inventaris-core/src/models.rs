use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AssetError, Result};

/// How an asset entered the inventory. The stored label is Indonesian and the
/// digit is the third segment of the asset code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ProcurementSource {
    #[default]
    #[serde(rename = "pembelian")]
    Purchase,
    #[serde(rename = "bantuan")]
    Assistance,
    #[serde(rename = "hibah")]
    Grant,
    #[serde(rename = "sumbangan")]
    Donation,
    #[serde(rename = "produksi_sendiri")]
    SelfProduced,
}

impl ProcurementSource {
    pub const ALL: [ProcurementSource; 5] = [
        Self::Purchase,
        Self::Assistance,
        Self::Grant,
        Self::Donation,
        Self::SelfProduced,
    ];

    /// Unknown labels fall back to a purchase.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|source| source.label() == label.trim())
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Purchase => "pembelian",
            Self::Assistance => "bantuan",
            Self::Grant => "hibah",
            Self::Donation => "sumbangan",
            Self::SelfProduced => "produksi_sendiri",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Purchase => "1",
            Self::Assistance => "2",
            Self::Grant => "3",
            Self::Donation => "4",
            Self::SelfProduced => "5",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AssetStatus {
    #[default]
    #[serde(rename = "baik")]
    Good,
    #[serde(rename = "rusak")]
    Damaged,
    #[serde(rename = "tidak_memadai")]
    Inadequate,
}

impl AssetStatus {
    /// Maps both stored labels and the legacy English workflow states.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim() {
            "baik" | "available" => Self::Good,
            "rusak" | "disposed" => Self::Damaged,
            "tidak_memadai" | "in_use" | "maintenance" => Self::Inadequate,
            _ => Self::Good,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "baik",
            Self::Damaged => "rusak",
            Self::Inadequate => "tidak_memadai",
        }
    }
}

/// Last computed depreciation figures. A cache for listing and reporting;
/// the acquisition cost, date and economic life remain authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepreciationSnapshot {
    pub accumulated_depreciation: Decimal,
    pub book_value: Decimal,
    pub as_of: NaiveDate,
}

/// Position of one unit inside a bulk group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkMembership {
    pub bulk_id: Uuid,
    pub bulk_sequence: u32,
    pub bulk_total_count: u32,
    pub is_bulk_parent: bool,
}

/// Asset data as entered, before a code has been allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub specification: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub acquired_on: NaiveDate,
    pub acquisition_cost: Decimal,
    pub economic_life_years: u32,
    pub location_id: Option<i64>,
    pub location_code: Option<String>,
    pub category_id: Uuid,
    pub category_code: Option<String>,
    pub procurement_source: ProcurementSource,
    pub status: AssetStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub specification: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub acquired_on: NaiveDate,
    pub acquisition_cost: Decimal,
    pub economic_life_months: u32,
    pub depreciation: DepreciationSnapshot,
    pub location_id: Option<i64>,
    pub category_id: Uuid,
    pub procurement_source: ProcurementSource,
    pub status: AssetStatus,
    pub notes: Option<String>,
    pub bulk: Option<BulkMembership>,
    pub created_at: DateTime<Utc>,
}

/// Units created together from one bulk request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssetGroup {
    pub bulk_id: Uuid,
    pub units: Vec<Asset>,
}

impl BulkAssetGroup {
    pub fn from_units(units: Vec<Asset>) -> Result<Self> {
        let bulk_id = units
            .first()
            .and_then(|unit| unit.bulk.as_ref())
            .map(|membership| membership.bulk_id)
            .ok_or_else(|| AssetError::invalid("bulk group needs at least one bulk unit"))?;

        let group = Self { bulk_id, units };
        group.validate()?;
        Ok(group)
    }

    /// Checks that sequences run 1..=total without gaps or repeats, that
    /// every unit agrees on id and total, and that exactly one is the parent.
    pub fn validate(&self) -> Result<()> {
        let total = u32::try_from(self.units.len())
            .map_err(|_| AssetError::invalid("bulk group is too large"))?;
        if total == 0 {
            return Err(AssetError::invalid("bulk group is empty"));
        }

        let mut seen = HashSet::new();
        let mut parents = 0;
        for unit in &self.units {
            let membership = unit.bulk.as_ref().ok_or_else(|| {
                AssetError::invalid(format!("asset {} is not part of a bulk group", unit.code))
            })?;

            if membership.bulk_id != self.bulk_id {
                return Err(AssetError::invalid(format!(
                    "asset {} belongs to bulk {}, expected {}",
                    unit.code, membership.bulk_id, self.bulk_id
                )));
            }
            if membership.bulk_total_count != total {
                return Err(AssetError::invalid(format!(
                    "asset {} records {} units, group has {}",
                    unit.code, membership.bulk_total_count, total
                )));
            }
            if membership.bulk_sequence == 0 || membership.bulk_sequence > total {
                return Err(AssetError::invalid(format!(
                    "bulk sequence {} outside 1..={}",
                    membership.bulk_sequence, total
                )));
            }
            if !seen.insert(membership.bulk_sequence) {
                return Err(AssetError::invalid(format!(
                    "bulk sequence {} appears twice",
                    membership.bulk_sequence
                )));
            }
            if membership.is_bulk_parent {
                parents += 1;
            }
        }

        if parents != 1 {
            return Err(AssetError::invalid(format!(
                "bulk group must have exactly one parent, found {parents}"
            )));
        }

        Ok(())
    }

    pub fn parent(&self) -> Option<&Asset> {
        self.units
            .iter()
            .find(|unit| unit.bulk.as_ref().is_some_and(|m| m.is_bulk_parent))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.units.iter().map(|unit| unit.code.as_str()).collect()
    }
}
