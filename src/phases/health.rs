//! Model Health dashboard: version stamp, usage notes and live checks

use super::{PhaseReport, RunContext};
use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::formulas::{cell_link, pass_fail, MINE_SHEET, OFFSET_COLUMN, TIMELINE_SHEET};
use crate::phases::fees::{ADMIN_FEE_CELL, INPUTS_SHEET, UNITIZATION_FEE_CELL};
use crate::timeline::Timeline;
use crate::types::{CellStyle, Sheet, Workbook};

pub const HEALTH_SHEET: &str = "Model Health";

const INSTRUCTIONS: [&str; 6] = [
    "1. Go to 'Mine Inventory' sheet",
    "2. Click Column B cell, select date from dropdown",
    "3. ALL DATA redistributes automatically:",
    "   - Registered/Authorized/Releasable/Unlocked Resources",
    "   - All fees and allocations",
    "   - All calculated fields",
];

const REDISTRIBUTES: [(&str, &str); 14] = [
    ("Mine Count", "COUNTIF"),
    ("Registered Resources", "SUMIF on Assayed Au"),
    ("Authorized Resources", "SUMIF on Auth. Au"),
    ("Releasable Resources", "SUMIF on Lifetime Release"),
    ("Unlocked Resources", "SUMIF on Year 1 Unlock"),
    ("Unitization Fees", "Calculated from Authorized"),
    ("Available 1031 Units", "SUMPRODUCT conditional"),
    ("Admin Fees", "Calculated from Unlocked"),
    ("RGT Liquidity Fee", "SUMIF on Liquidity Allocation"),
    ("Treasury Allocation", "SUMPRODUCT conditional"),
    ("Minting Fees", "Calculated"),
    ("Total Fees", "Calculated"),
    ("1031 Allocation", "Calculated"),
    ("Treasury by Trusts", "Calculated"),
];

const BANNER_RED: u32 = 0xFF0000;

/// Replace the dashboard and put it first
pub fn build_model_health(
    workbook: &mut Workbook,
    config: &PatchConfig,
    timeline: &Timeline,
    context: &RunContext,
) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Model Health Dashboard");
    if workbook.contains(HEALTH_SHEET) {
        report.note("Replaced existing Model Health sheet");
    }

    let mut sheet = Sheet::new(HEALTH_SHEET);

    sheet.set("A1", config.health.title.as_str())?;
    sheet.set_style("A1", CellStyle::heading(16.0))?;

    sheet.set("A3", "Version")?;
    sheet.set("B3", config.health.version.as_str())?;
    sheet.set("A4", "Updated")?;
    sheet.set("B4", context.generated_at.as_str())?;

    sheet.set("A6", "COMPLETE DATA REDISTRIBUTION")?;
    sheet.set_style("A6", CellStyle::heading(12.0).with_color(BANNER_RED))?;

    sheet.set("A7", "Instructions")?;
    let mut row = 7;
    for line in INSTRUCTIONS {
        sheet.set(&format!("B{}", row), line)?;
        row += 1;
    }

    row += 1;
    sheet.set(&format!("A{}", row), "Data That Redistributes Dynamically")?;
    sheet.set_style(&format!("A{}", row), CellStyle::heading(12.0))?;
    row += 1;
    for (item, method) in REDISTRIBUTES {
        sheet.set(&format!("A{}", row), item)?;
        sheet.set(&format!("B{}", row), method)?;
        row += 1;
    }

    row += 1;
    sheet.set(&format!("A{}", row), "Live Validation")?;
    sheet.set_style(&format!("A{}", row), CellStyle::heading(12.0))?;
    row += 1;
    for col in ["A", "B", "C"] {
        sheet.set_style(&format!("{}{}", col, row), CellStyle::bold())?;
    }
    sheet.set(&format!("A{}", row), "Check")?;
    sheet.set(&format!("B{}", row), "Status")?;
    sheet.set(&format!("C{}", row), "Notes")?;
    row += 1;

    let fee = config.fees.unitization_fee;
    let first_label = timeline.label(0)?;
    let courbet = config
        .mines
        .iter()
        .find(|m| m.row == 2)
        .map(|m| m.onboard.clone())
        .unwrap_or_else(|| first_label.clone());
    let courbet_offset = timeline
        .offset_of(&courbet)
        .map(|k| k.to_string())
        .unwrap_or_else(|| "blank".to_string());

    let checks = [
        (
            "Unitization Fee",
            pass_fail(
                &format!("{}!{}", INPUTS_SHEET, UNITIZATION_FEE_CELL),
                fee,
                &format!("✗ FAIL - Should be {}", fee),
            ),
            format!("Unitization fee must be {}", fee),
        ),
        (
            "Admin Fee",
            pass_fail(
                &format!("{}!{}", INPUTS_SHEET, ADMIN_FEE_CELL),
                0.0001,
                "✗ FAIL - Should be 0.0001",
            ),
            "Admin fee must be 0.0001 (1 basis point)".to_string(),
        ),
        (
            "Timeline Start",
            format!("={}!B4", TIMELINE_SHEET),
            format!("Should be: {}", first_label),
        ),
        (
            "Courbet Date",
            cell_link(MINE_SHEET, "B", 2),
            format!("Should be: {}", courbet),
        ),
        (
            "Courbet Offset (Dynamic)",
            cell_link(MINE_SHEET, OFFSET_COLUMN, 2),
            format!("Should be: {}", courbet_offset),
        ),
    ];

    let check_count = checks.len();
    for (name, formula, note) in checks {
        sheet.set(&format!("A{}", row), name)?;
        sheet.set_formula(&format!("B{}", row), formula)?;
        sheet.set(&format!("C{}", row), note)?;
        row += 1;
    }

    sheet.set_column_width("A", 35.0)?;
    sheet.set_column_width("B", 50.0)?;
    sheet.set_column_width("C", 40.0)?;

    report.cells_written = sheet.cell_count();
    workbook.insert(0, sheet);
    report.note(format!("Dashboard created with {} live checks", check_count));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::CellRef;
    use crate::types::CellValue;
    use chrono::NaiveDate;

    #[test]
    fn test_dashboard_is_first_and_has_live_checks() {
        let mut wb = Workbook::new();
        wb.push(Sheet::new("Inputs"));
        let mut old = Sheet::new(HEALTH_SHEET);
        old.set("Z1", "old").unwrap();
        wb.push(old);

        let config = PatchConfig::default();
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap();
        let context = RunContext {
            generated_at: "2025-11-27 10:00:00".to_string(),
        };
        build_model_health(&mut wb, &config, &timeline, &context).unwrap();

        assert_eq!(wb.sheet_names(), vec![HEALTH_SHEET, "Inputs"]);
        let sheet = wb.sheet(HEALTH_SHEET).unwrap();
        assert!(sheet.get("Z1").unwrap().is_empty());
        assert_eq!(sheet.get("B4").unwrap(), &CellValue::text("2025-11-27 10:00:00"));
        assert_eq!(sheet.style_at(CellRef::new(0, 0)).unwrap().font_size, Some(16.0));

        let fee_check = sheet.find("Inputs!B26");
        assert_eq!(fee_check.len(), 1);
        assert_eq!(
            fee_check[0].1,
            &CellValue::Formula(
                "=IF(Inputs!B26=0.0001,\"✓ PASS\",\"✗ FAIL - Should be 0.0001\")".to_string()
            )
        );
        assert_eq!(sheet.find("='Mine Inventory'!AO2").len(), 1);
        assert_eq!(sheet.find("Should be: 11").len(), 1);
    }
}
