//! Patch phases
//!
//! Each phase mutates the in-memory workbook and returns a report of what it
//! changed. Phases run in a fixed order; see [`run_all`].

mod cashflow;
mod fees;
mod health;
mod mines;
mod ref_errors;
mod resource_supply;
mod timeline;
mod token_demand;
mod token_supply;

pub use cashflow::{link_cashflow_headers, CASHFLOW_SHEETS};
pub use fees::{fix_fees, INPUTS_SHEET};
pub use health::{build_model_health, HEALTH_SHEET};
pub use mines::{set_mine_dates, setup_mine_dropdowns, is_mine_row};
pub use ref_errors::{clear_ref_errors, scan_ref_errors, RefError};
pub use resource_supply::{build_resource_supply, RESOURCE_SHEET};
pub use timeline::{build_timeline, write_timeline_rows};
pub use token_demand::{build_token_demand, DEMAND_SHEET};
pub use token_supply::{build_token_supply, SUPPLY_SHEET};

use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::formulas::header_link;
use crate::timeline::Timeline;
use crate::types::{Sheet, Workbook};

/// Outcome of one phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseReport {
    pub title: String,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub cells_written: usize,
}

impl PhaseReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{}", text);
        self.warnings.push(text);
    }
}

/// Run timestamp and anything else that varies between runs
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub generated_at: String,
}

impl RunContext {
    pub fn now() -> Self {
        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Sheets that must exist in the input workbook
pub const REQUIRED_SHEETS: [&str; 5] = [
    INPUTS_SHEET,
    crate::formulas::MINE_SHEET,
    RESOURCE_SHEET,
    SUPPLY_SHEET,
    DEMAND_SHEET,
];

/// Run every phase in order
pub fn run_all(
    workbook: &mut Workbook,
    config: &PatchConfig,
    context: &RunContext,
) -> PatchResult<Vec<PhaseReport>> {
    for name in REQUIRED_SHEETS {
        workbook.sheet(name)?;
    }

    let timeline = config.timeline()?;
    let mut reports = vec![
        fix_fees(workbook, config)?,
        set_mine_dates(workbook, config, &timeline)?,
    ];
    if config.clear_ref_errors {
        reports.push(clear_ref_errors(workbook)?);
    }
    reports.push(build_timeline(workbook, &timeline, config.gold_price())?);
    reports.push(setup_mine_dropdowns(workbook, &timeline)?);
    reports.push(build_resource_supply(
        workbook,
        &timeline,
        config.timeline.first_year_summary,
    )?);
    reports.push(build_token_supply(workbook, &timeline)?);
    reports.push(build_token_demand(workbook, &timeline)?);
    reports.push(link_cashflow_headers(workbook, &timeline)?);
    reports.push(build_model_health(workbook, config, &timeline, context)?);

    Ok(reports)
}

/// Row 1 month headers linked to the timeline; returns cells written
pub(crate) fn link_headers(sheet: &mut Sheet, timeline: &Timeline) -> PatchResult<usize> {
    for k in timeline.offsets() {
        let col = timeline.column(k);
        sheet.set_formula(&format!("{}1", col), header_link(&col))?;
    }
    Ok(timeline.months() as usize)
}

/// Write `(row, label)` pairs into column A
pub(crate) fn write_labels(sheet: &mut Sheet, labels: &[(u32, &str)]) -> PatchResult<usize> {
    for (row, label) in labels {
        sheet.set(&format!("A{}", row), *label)?;
    }
    Ok(labels.len())
}
