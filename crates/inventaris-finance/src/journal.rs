use chrono::NaiveDate;
use inventaris_core::{SakProfile, StandardsProfile};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::depreciation::{DepreciationInput, compute};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub account: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub memo: String,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn is_balanced(&self) -> bool {
        let debits: Decimal = self.lines.iter().map(|line| line.debit).sum();
        let credits: Decimal = self.lines.iter().map(|line| line.credit).sum();
        debits == credits
    }
}

/// Depreciation charged between two evaluation dates, or `None` when the
/// period adds nothing (fully depreciated, zero life, or `to <= from`).
pub fn depreciation_journal(
    input: &DepreciationInput,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<JournalEntry> {
    let opening = compute(input, from).accumulated_depreciation;
    let closing = compute(input, to).accumulated_depreciation;
    let charge = closing - opening;
    if charge <= Decimal::ZERO {
        return None;
    }

    let profile = SakProfile;
    let coa = profile.chart_of_accounts();

    Some(JournalEntry {
        id: Uuid::new_v4(),
        memo: format!(
            "{} {} depreciation {from} to {to}",
            profile.name(),
            profile.depreciation_method()
        ),
        lines: vec![
            JournalLine {
                account: coa.depreciation_expense,
                debit: charge,
                credit: Decimal::ZERO,
            },
            JournalLine {
                account: coa.accumulated_depreciation,
                debit: Decimal::ZERO,
                credit: charge,
            },
        ],
    })
}
