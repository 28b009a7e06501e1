use super::{link_headers, PhaseReport};
use crate::error::PatchResult;
use crate::formulas::{cell_link, dollars_of, sumif_offset};
use crate::phases::{RESOURCE_SHEET, SUPPLY_SHEET};
use crate::timeline::Timeline;
use crate::types::Workbook;

pub const DEMAND_SHEET: &str = "Token Demand (5yr)";

pub fn build_token_demand(workbook: &mut Workbook, timeline: &Timeline) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Token Demand Dynamic Formulas");
    let sheet = workbook.sheet_mut(DEMAND_SHEET)?;

    report.cells_written += link_headers(sheet, timeline)?;
    report.note("Headers linked to XAUconfig");

    for k in timeline.offsets() {
        let col = timeline.column(k);
        let at = |row: u32| format!("{}{}", col, row);

        // Cumulative unlocked / circulating supply (oz), then in dollars
        sheet.set_formula(&at(3), cell_link(RESOURCE_SHEET, &col, 34))?;
        sheet.set_formula(&at(4), cell_link(SUPPLY_SHEET, &col, 36))?;
        sheet.set_formula(&at(5), dollars_of(&col, 3))?;
        sheet.set_formula(&at(6), dollars_of(&col, 4))?;

        // "Leased" liquidity supply from Mine Inventory column W
        sheet.set_formula(&at(9), sumif_offset(k, "W"))?;
        sheet.set_formula(&at(11), dollars_of(&col, 9))?;

        // DEX trading volume ($)
        sheet.set_formula(&at(19), dollars_of(&col, 18))?;
        report.cells_written += 7;
    }

    report.note("Token Demand formulas added (rows 3-6, 9, 11, 19)");
    Ok(report)
}
