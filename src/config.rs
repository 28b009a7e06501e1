//! Patch plan
//!
//! Every value the patcher writes that is not derived from the layout lives
//! here. A plan can be loaded from YAML; omitted sections keep their defaults.

use crate::error::PatchResult;
use crate::timeline::{GoldPriceCurve, Timeline};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "attachment_3.xlsx";
pub const DEFAULT_OUTPUT: &str = "RealGold_Finmodel_V2_COMPLETE_DYNAMIC.xlsx";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fees: FeeConfig,
    pub timeline: TimelineConfig,
    pub mines: Vec<MineDate>,
    pub health: HealthConfig,
    /// Clear `#REF!` cells in Mine Inventory before rebuilding
    pub clear_ref_errors: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            fees: FeeConfig::default(),
            timeline: TimelineConfig::default(),
            mines: vec![
                MineDate {
                    row: 2,
                    onboard: "Dec '25".to_string(),
                },
                MineDate {
                    row: 3,
                    onboard: "Jan '26".to_string(),
                },
            ],
            health: HealthConfig::default(),
            clear_ref_errors: false,
        }
    }
}

impl PatchConfig {
    pub fn from_yaml_str(text: &str) -> PatchResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> PatchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn timeline(&self) -> PatchResult<Timeline> {
        Timeline::new(self.timeline.start, self.timeline.months)
    }

    pub fn gold_price(&self) -> GoldPriceCurve {
        GoldPriceCurve {
            initial: self.timeline.initial_gold_price,
            annual_growth: self.timeline.annual_growth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Written to `Inputs!B26`; 0.01%
    pub unitization_fee: f64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            unitization_fee: 0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub start: NaiveDate,
    pub months: u16,
    pub initial_gold_price: f64,
    pub annual_growth: f64,
    /// Also write an annual total for the first calendar year. Off by
    /// default: on a January start that column (M) sits on the input block.
    pub first_year_summary: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            // Jan '25 keeps 2025 costs in the 2025 cashflow columns
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            months: 60,
            initial_gold_price: 2892.6,
            annual_growth: 0.03,
            first_year_summary: false,
        }
    }
}

/// Onboard month for one Mine Inventory row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineDate {
    /// 1-based row in Mine Inventory
    pub row: u32,
    /// Month label, e.g. `Dec '25`
    pub onboard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub title: String,
    pub version: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            title: "RealGold Financial Model - COMPLETE DYNAMIC".to_string(),
            version: "V2.5 - Complete Dynamic Data Redistribution".to_string(),
        }
    }
}
