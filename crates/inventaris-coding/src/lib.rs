//! Asset code grammar and sequence allocation.
//!
//! A code reads `LOCATION.CATEGORY.SOURCE.YEAR.SEQUENCE`, e.g. `001.10.1.24.007`.
//! Units of a suffixed bulk batch append `-NNN` to their parent's code.
//! Everything here is pure; callers supply the existing codes of a scope and
//! must serialize allocation per scope themselves.

pub mod code;
pub mod sequence;

pub use code::{
    AssetScope, BULK_SUFFIX_WIDTH, build_bulk_codes, build_code, bulk_unit_code, pad_segment,
    sort_key, split_bulk_suffix,
};
pub use sequence::{
    DEFAULT_SEQUENCE_WIDTH, SequenceRange, next_sequence, next_sequence_range, parse_sequence,
};
