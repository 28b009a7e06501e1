use super::{link_headers, PhaseReport};
use crate::error::PatchResult;
use crate::formulas::{cell_link, column_sum, cumulative_sum, dollars_of, sheet_ref, sumproduct_offset};
use crate::phases::RESOURCE_SHEET;
use crate::timeline::Timeline;
use crate::types::Workbook;

pub const SUPPLY_SHEET: &str = "Token Supply (5yr)";

pub fn build_token_supply(workbook: &mut Workbook, timeline: &Timeline) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Token Supply Dynamic Formulas");
    let first = timeline.first_column();
    let resource = sheet_ref(RESOURCE_SHEET);
    let sheet = workbook.sheet_mut(SUPPLY_SHEET)?;

    report.cells_written += link_headers(sheet, timeline)?;
    report.note("Headers linked to XAUconfig");

    for k in timeline.offsets() {
        let col = timeline.column(k);
        let at = |row: u32| format!("{}{}", col, row);

        // RealGold Treasury takes the RGT liquidity fee
        sheet.set_formula(&at(3), cell_link(RESOURCE_SHEET, &col, 11))?;
        // (Unlocked - Admin Fees) scaled by the onboarding mines' AF share
        sheet.set_formula(
            &at(5),
            format!(
                "=({res}!{col}7-{res}!{col}10)*{}",
                sumproduct_offset(k, &["AF"]),
                res = resource,
                col = col
            ),
        )?;
        sheet.set_formula(&at(16), column_sum(&col, 3, 15))?;
        sheet.set_formula(&at(32), column_sum(&col, 17, 31))?;

        sheet.set_formula(&at(35), cumulative_sum(&first, &col, 16))?;
        sheet.set_formula(&at(36), cumulative_sum(&first, &col, 32))?;
        sheet.set_formula(&at(37), dollars_of(&col, 35))?;
        sheet.set_formula(&at(38), dollars_of(&col, 36))?;
        report.cells_written += 8;
    }

    report.note("Token Supply formulas added (rows 3, 5, 16, 32, 35-38)");
    Ok(report)
}
