pub mod depreciation;
pub mod journal;

pub use depreciation::{
    DepreciationInput, DepreciationResult, compute, months_between, round_currency,
};
pub use journal::{JournalEntry, JournalLine, depreciation_journal};
