use inventaris_core::{AssetError, ProcurementSource, Result};
use serde::{Deserialize, Serialize};

/// Zero-padded width of the `-NNN` suffix on bulk child codes.
pub const BULK_SUFFIX_WIDTH: usize = 3;

const LOCATION_WIDTH: usize = 3;
const CATEGORY_WIDTH: usize = 2;
const SORT_SEGMENT_WIDTH: usize = 3;

/// Left-pads `code` with `0` up to `width` characters.
pub fn pad_segment(code: &str, width: usize) -> String {
    format!("{code:0>width$}")
}

fn require_segment(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AssetError::invalid(format!("{name} code must not be empty")));
    }
    if value.trim() != value {
        return Err(AssetError::invalid(format!(
            "{name} code must not carry surrounding whitespace: {value:?}"
        )));
    }
    if value.contains('.') {
        return Err(AssetError::invalid(format!(
            "{name} code must not contain '.': {value}"
        )));
    }
    Ok(())
}

/// Composes `LOCATION.CATEGORY.SOURCE.YY.SEQUENCE`.
///
/// The year is reduced to its last two digits and the sequence is padded to
/// `sequence_width`; wider sequences are written in full.
pub fn build_code(
    location_code: &str,
    category_code: &str,
    source_code: &str,
    year: i32,
    sequence: u32,
    sequence_width: usize,
) -> Result<String> {
    require_segment("location", location_code)?;
    require_segment("category", category_code)?;
    require_segment("source", source_code)?;

    let year = year.rem_euclid(100);
    Ok(format!(
        "{location_code}.{category_code}.{source_code}.{year:02}.{sequence:0sequence_width$}"
    ))
}

/// Code of unit `bulk_sequence` (1-based) inside a suffixed bulk batch.
/// The parent keeps the base code unchanged.
pub fn bulk_unit_code(base_code: &str, bulk_sequence: u32) -> String {
    if bulk_sequence <= 1 {
        base_code.to_string()
    } else {
        format!(
            "{base_code}-{bulk_sequence:0width$}",
            width = BULK_SUFFIX_WIDTH
        )
    }
}

/// Codes for `count` units sharing `base_code`: the parent first, then
/// `-002`, `-003`, ... numbered by absolute position in the batch.
pub fn build_bulk_codes(base_code: &str, count: u32) -> Result<Vec<String>> {
    if base_code.trim().is_empty() {
        return Err(AssetError::invalid("base code must not be empty"));
    }
    if count == 0 {
        return Err(AssetError::invalid("bulk count must be positive"));
    }

    Ok((1..=count)
        .map(|position| bulk_unit_code(base_code, position))
        .collect())
}

/// Splits a trailing all-digit `-NNN` suffix off a code.
pub fn split_bulk_suffix(code: &str) -> (&str, Option<u32>) {
    if let Some((base, suffix)) = code.rsplit_once('-') {
        if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(position) = suffix.parse() {
                return (base, Some(position));
            }
        }
    }
    (code, None)
}

/// Key under which codes sort in numeric segment order, e.g.
/// `5.20.4.25.2-3` becomes `005.020.004.025.002-003`.
pub fn sort_key(code: &str) -> String {
    let (base, suffix) = split_bulk_suffix(code);
    let mut key = base
        .split('.')
        .map(|segment| pad_segment(segment, SORT_SEGMENT_WIDTH))
        .collect::<Vec<_>>()
        .join(".");

    if let Some(position) = suffix {
        key.push('-');
        key.push_str(&pad_segment(&position.to_string(), BULK_SUFFIX_WIDTH));
    }
    key
}

/// The attributes sequence numbers are unique within.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetScope {
    pub location_code: String,
    pub category_code: String,
    pub source: ProcurementSource,
    pub year: i32,
}

impl AssetScope {
    /// Normalizes location codes to three characters and category codes to
    /// two, the way they appear in stored codes.
    pub fn new(
        location_code: &str,
        category_code: &str,
        source: ProcurementSource,
        year: i32,
    ) -> Result<Self> {
        let location_code = location_code.trim();
        let category_code = category_code.trim();
        require_segment("location", location_code)?;
        require_segment("category", category_code)?;

        Ok(Self {
            location_code: pad_segment(location_code, LOCATION_WIDTH),
            category_code: pad_segment(category_code, CATEGORY_WIDTH),
            source,
            year,
        })
    }

    /// `LOCATION.CATEGORY.SOURCE.YY.`, shared by every code in the scope.
    pub fn prefix(&self) -> String {
        format!(
            "{}.{}.{}.{:02}.",
            self.location_code,
            self.category_code,
            self.source.code(),
            self.year.rem_euclid(100)
        )
    }

    pub fn code(&self, sequence: u32, sequence_width: usize) -> Result<String> {
        build_code(
            &self.location_code,
            &self.category_code,
            self.source.code(),
            self.year,
            sequence,
            sequence_width,
        )
    }

    pub fn contains(&self, code: &str) -> bool {
        code.starts_with(&self.prefix())
    }
}
