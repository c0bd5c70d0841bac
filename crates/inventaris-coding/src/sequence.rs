use std::ops::RangeInclusive;

use inventaris_core::{AssetError, Result};
use serde::{Deserialize, Serialize};

/// Zero-padded width of the sequence segment in newly built codes.
pub const DEFAULT_SEQUENCE_WIDTH: usize = 3;

const CODE_SEGMENTS: usize = 5;

/// Inclusive block of sequence numbers reserved for one bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRange {
    pub start: u32,
    pub end: u32,
}

impl SequenceRange {
    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn iter(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Extracts the sequence from a five-segment code.
///
/// Anything else (bulk children with a `-NNN` suffix, legacy codes such as
/// `LAPTOP001`, signed or empty segments) yields `None`.
pub fn parse_sequence(code: &str) -> Option<u32> {
    let segments: Vec<&str> = code.split('.').collect();
    if segments.len() != CODE_SEGMENTS {
        return None;
    }

    let last = segments[CODE_SEGMENTS - 1];
    if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    last.parse().ok()
}

fn max_sequence<I, S>(existing_codes: I) -> Option<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    existing_codes
        .into_iter()
        .filter_map(|code| parse_sequence(code.as_ref()))
        .max()
}

/// Next sequence for a scope: one past the highest ever used.
///
/// Freed numbers below the maximum are never handed out again, so a range
/// reserved by a bulk request cannot be split by a later single allocation.
pub fn next_sequence<I, S>(existing_codes: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // Saturates at u32::MAX; the resulting duplicate is rejected by the store.
    max_sequence(existing_codes).map_or(1, |max| max.saturating_add(1))
}

/// Reserves `count` contiguous sequences starting one past the highest used.
pub fn next_sequence_range<I, S>(existing_codes: I, count: u32) -> Result<SequenceRange>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if count == 0 {
        return Err(AssetError::invalid("sequence count must be positive"));
    }

    let start = match max_sequence(existing_codes) {
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| AssetError::invalid("sequence space exhausted"))?,
        None => 1,
    };
    let end = start
        .checked_add(count - 1)
        .ok_or_else(|| AssetError::invalid(format!("cannot reserve {count} sequences")))?;

    Ok(SequenceRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const NO_CODES: [&str; 0] = [];

    #[test]
    fn parses_last_of_five_segments() {
        assert_eq!(parse_sequence("001.10.1.24.007"), Some(7));
        assert_eq!(parse_sequence("RD1.IT.2.25.1234"), Some(1234));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(parse_sequence("INVALID-CODE"), None);
        assert_eq!(parse_sequence("LAPTOP001"), None);
        assert_eq!(parse_sequence("001.10.1.24"), None);
        assert_eq!(parse_sequence("001.10.1.24.001.2"), None);
        assert_eq!(parse_sequence("001.10.1.24."), None);
        assert_eq!(parse_sequence("001.10.1.24.-3"), None);
        assert_eq!(parse_sequence("001.10.1.24.+3"), None);
        assert_eq!(parse_sequence("001.10.1.24.002-003"), None);
        assert_eq!(parse_sequence("001.10.1.24.99999999999"), None);
    }

    #[test]
    fn empty_scope_starts_at_one() {
        assert_eq!(next_sequence(NO_CODES), 1);
        assert_eq!(
            next_sequence_range(NO_CODES, 3).unwrap(),
            SequenceRange { start: 1, end: 3 }
        );
    }

    #[test]
    fn all_malformed_starts_at_one() {
        assert_eq!(next_sequence(["INVALID-CODE", "PHONE001", ""]), 1);
    }

    #[test]
    fn increments_past_contiguous_run() {
        let codes = ["001.10.1.24.001", "001.10.1.24.002", "001.10.1.24.003"];
        assert_eq!(next_sequence(codes), 4);
        assert_eq!(
            next_sequence_range(codes, 3).unwrap(),
            SequenceRange { start: 4, end: 6 }
        );
    }

    #[test]
    fn ignores_invalid_codes() {
        let codes = ["001.10.1.24.001", "INVALID-CODE", "001.10.1.24.005"];
        assert_eq!(next_sequence(codes), 6);
    }

    #[test]
    fn never_fills_gaps() {
        let codes = ["A.B.1.24.001", "A.B.1.24.002", "A.B.1.24.005"];
        assert_eq!(next_sequence(codes), 6);
        assert_eq!(
            next_sequence_range(codes, 2).unwrap(),
            SequenceRange { start: 6, end: 7 }
        );
    }

    #[test]
    fn order_and_duplicates_do_not_matter() {
        let codes = ["X.Y.1.24.003", "X.Y.1.24.001", "X.Y.1.24.005", "X.Y.1.24.005"];
        assert_eq!(next_sequence(codes), 6);
    }

    #[test]
    fn single_and_range_agree() {
        let codes = vec!["X.Y.1.24.100".to_string(), "X.Y.1.24.042".to_string()];
        assert_eq!(next_sequence(&codes), 101);
        assert_eq!(next_sequence_range(&codes, 1).unwrap().start, 101);
    }

    #[test]
    fn range_spans_requested_count() {
        let codes = ["X.Y.1.24.010"];
        for count in [1, 2, 7, 50] {
            let range = next_sequence_range(codes, count).unwrap();
            assert_eq!(range.end - range.start + 1, count);
            assert_eq!(range.len(), count);
            assert_eq!(range.iter().count(), count as usize);
        }
    }

    #[test]
    fn zero_count_is_invalid() {
        assert_matches!(
            next_sequence_range(["X.Y.1.24.010"], 0),
            Err(AssetError::InvalidArgument(_))
        );
    }

    #[test]
    fn range_overflow_is_invalid() {
        let codes = [format!("X.Y.1.24.{}", u32::MAX - 1)];
        assert_eq!(next_sequence(&codes), u32::MAX);
        assert_matches!(
            next_sequence_range(&codes, 2),
            Err(AssetError::InvalidArgument(_))
        );
    }

    #[test]
    fn bulk_children_do_not_shadow_parent() {
        let codes = ["A.B.1.24.004", "A.B.1.24.004-002", "A.B.1.24.004-003"];
        assert_eq!(next_sequence(codes), 5);
    }
}
