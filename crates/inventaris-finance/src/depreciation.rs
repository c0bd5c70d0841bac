//! Straight-line depreciation over whole calendar months.

use chrono::{Datelike, NaiveDate};
use inventaris_core::{Asset, AssetError, DepreciationSnapshot, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: u32 = 12;
const CURRENCY_DP: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationInput {
    cost: Decimal,
    economic_life_months: u32,
    acquired_on: NaiveDate,
}

impl DepreciationInput {
    pub fn new(cost: Decimal, economic_life_months: u32, acquired_on: NaiveDate) -> Result<Self> {
        if cost < Decimal::ZERO {
            return Err(AssetError::invalid(format!(
                "acquisition cost must not be negative: {cost}"
            )));
        }

        Ok(Self {
            cost,
            economic_life_months,
            acquired_on,
        })
    }

    pub fn from_years(cost: Decimal, economic_life_years: u32, acquired_on: NaiveDate) -> Result<Self> {
        let months = economic_life_years
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| AssetError::invalid("economic life is too long"))?;
        Self::new(cost, months, acquired_on)
    }

    pub fn from_asset(asset: &Asset) -> Result<Self> {
        Self::new(
            asset.acquisition_cost,
            asset.economic_life_months,
            asset.acquired_on,
        )
    }

    pub fn cost(&self) -> Decimal {
        self.cost
    }

    pub fn economic_life_months(&self) -> u32 {
        self.economic_life_months
    }

    pub fn acquired_on(&self) -> NaiveDate {
        self.acquired_on
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationResult {
    pub accumulated_depreciation: Decimal,
    pub book_value: Decimal,
    pub elapsed_months: u32,
    pub remaining_months: u32,
}

impl DepreciationResult {
    pub fn snapshot(&self, as_of: NaiveDate) -> DepreciationSnapshot {
        DepreciationSnapshot {
            accumulated_depreciation: self.accumulated_depreciation,
            book_value: self.book_value,
            as_of,
        }
    }
}

/// Whole calendar months from `from` to `to`; the day of month is ignored
/// and the result is negative when `to` precedes `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    years * 12 + months
}

/// Two decimal places, halves rounded up.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Depreciation of `input` as of `now`.
///
/// Elapsed time is clamped to `0..=economic_life_months`, so the book value
/// never drops below zero and dates before acquisition depreciate nothing.
/// An economic life of zero means the asset is not depreciated.
pub fn compute(input: &DepreciationInput, now: NaiveDate) -> DepreciationResult {
    let life = input.economic_life_months;
    let elapsed = months_between(input.acquired_on, now).clamp(0, i64::from(life));
    // Clamped into 0..=life, so it fits.
    let elapsed_months = u32::try_from(elapsed).unwrap_or(life);

    if life == 0 {
        return DepreciationResult {
            accumulated_depreciation: Decimal::ZERO,
            book_value: round_currency(input.cost),
            elapsed_months: 0,
            remaining_months: 0,
        };
    }

    let monthly = input.cost / Decimal::from(life);
    let accumulated_depreciation = round_currency(monthly * Decimal::from(elapsed_months));
    let book_value = round_currency((input.cost - accumulated_depreciation).max(Decimal::ZERO));

    DepreciationResult {
        accumulated_depreciation,
        book_value,
        elapsed_months,
        remaining_months: life - elapsed_months,
    }
}
