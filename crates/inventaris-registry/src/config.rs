use std::str::FromStr;

use inventaris_coding::{AssetScope, DEFAULT_SEQUENCE_WIDTH};
use inventaris_core::{AssetError, ProcurementSource, Result};
use serde::{Deserialize, Serialize};

/// How the units of a bulk request are coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BulkCodeStrategy {
    /// Every unit takes its own sequence from one contiguous range.
    #[default]
    SequenceRange,
    /// One sequence for the batch; units after the parent get `-NNN`.
    Suffixed,
}

impl FromStr for BulkCodeStrategy {
    type Err = AssetError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "range" | "sequence_range" => Ok(Self::SequenceRange),
            "suffix" | "suffixed" => Ok(Self::Suffixed),
            other => Err(AssetError::invalid(format!(
                "unknown bulk code strategy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingConfig {
    pub sequence_width: usize,
    pub default_location_code: String,
    pub default_category_code: String,
    pub bulk_codes: BulkCodeStrategy,
    pub max_allocation_attempts: u32,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            sequence_width: DEFAULT_SEQUENCE_WIDTH,
            default_location_code: "001".to_string(),
            default_category_code: "10".to_string(),
            bulk_codes: BulkCodeStrategy::SequenceRange,
            max_allocation_attempts: 5,
        }
    }
}

impl CodingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sequence_width == 0 {
            return Err(AssetError::invalid("sequence width must be positive"));
        }
        if self.max_allocation_attempts == 0 {
            return Err(AssetError::invalid("allocation attempts must be positive"));
        }
        // Defaults must form valid code segments.
        AssetScope::new(
            &self.default_location_code,
            &self.default_category_code,
            ProcurementSource::default(),
            0,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_strategies() {
        assert_eq!("range".parse::<BulkCodeStrategy>().unwrap(), BulkCodeStrategy::SequenceRange);
        assert_eq!(" Suffixed ".parse::<BulkCodeStrategy>().unwrap(), BulkCodeStrategy::Suffixed);
        assert_matches!("gaps".parse::<BulkCodeStrategy>(), Err(AssetError::InvalidArgument(_)));
    }

    #[test]
    fn default_config_is_valid() {
        let config = CodingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sequence_width, 3);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let config = CodingConfig {
            max_allocation_attempts: 0,
            ..CodingConfig::default()
        };
        assert_matches!(config.validate(), Err(AssetError::InvalidArgument(_)));
    }

    #[test]
    fn default_codes_follow_segment_rules() {
        let dotted = CodingConfig {
            default_location_code: "0.1".to_string(),
            ..CodingConfig::default()
        };
        assert_matches!(dotted.validate(), Err(AssetError::InvalidArgument(_)));

        let blank = CodingConfig {
            default_category_code: "   ".to_string(),
            ..CodingConfig::default()
        };
        assert_matches!(blank.validate(), Err(AssetError::InvalidArgument(_)));
    }
}
