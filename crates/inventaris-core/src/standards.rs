use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    pub accumulated_depreciation: String,
    pub depreciation_expense: String,
}

pub trait StandardsProfile {
    fn name(&self) -> &'static str;
    fn chart_of_accounts(&self) -> ChartOfAccounts;
    fn depreciation_method(&self) -> &'static str;
}

/// Government fixed-asset profile: straight-line over the economic life.
#[derive(Debug, Clone, Default)]
pub struct SakProfile;

impl StandardsProfile for SakProfile {
    fn name(&self) -> &'static str {
        "SAK-aset-tetap"
    }

    fn chart_of_accounts(&self) -> ChartOfAccounts {
        ChartOfAccounts {
            accumulated_depreciation: "1390".to_string(),
            depreciation_expense: "5300".to_string(),
        }
    }

    fn depreciation_method(&self) -> &'static str {
        "STRAIGHT_LINE"
    }
}
