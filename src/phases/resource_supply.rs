//! Resource Supply (5yr): monthly redistribution, dollar values,
//! cumulative totals and annual summaries

use super::{link_headers, write_labels, PhaseReport};
use crate::error::PatchResult;
use crate::formulas::{
    countif_offset, cumulative_sum, dollars_of, fee_of, price_ref, row_sum, sumif_offset,
    sumproduct_offset,
};
use crate::timeline::Timeline;
use crate::types::{Sheet, Workbook};

pub const RESOURCE_SHEET: &str = "Resource Supply (5yr)";

/// `(row, Mine Inventory source column)` summed per month offset
const SUMIF_ROWS: [(u32, &str); 5] = [
    (4, "F"),  // Registered Resources  <- Assayed Au
    (5, "M"),  // Authorized Resources  <- Auth. Au
    (6, "P"),  // Releasable Resources  <- Lifetime Release
    (7, "Q"),  // Unlocked Resources    <- Year 1 Unlock
    (11, "R"), // RGT Liquidity Fee     <- Liquidity Allocation
];

/// `(row, source row)` converted to dollars at the month's gold price
const DOLLAR_ROWS: [(u32, u32); 9] = [
    (18, 4),
    (19, 5),
    (20, 6),
    (21, 7),
    (22, 8),
    (23, 10),
    (24, 13),
    (26, 15),
    (27, 16),
];

const DOLLAR_LABELS: [(u32, &str); 10] = [
    (18, "Registered Resources ($)"),
    (19, "Authorized Resources ($)"),
    (20, "Releasable Resources ($)"),
    (21, "Unlocked Resources ($)"),
    (22, "Registration Fees ($)"),
    (23, "Unitization Fees ($)"),
    (24, "RealGold Token Minting Fees ($)"),
    (25, "Total Reg & Unit Fee Rev ($)"),
    (26, "Allocation to 1031 ($)"),
    (27, "Allocation to RealGold Treasury ($)"),
];

/// `(row, summed row)` running totals
const CUMULATIVE_ROWS: [(u32, u32); 7] = [
    (30, 4),
    (31, 5),
    (32, 6),
    (34, 16),
    (36, 18),
    (37, 19),
    (38, 20),
];

const CUMULATIVE_LABELS: [(u32, &str); 11] = [
    (29, "Resource Supply Cumulative Totals"),
    (30, "Cumulative Registered Resources (oz)"),
    (31, "Cumulative Authorized Resources (oz)"),
    (32, "Cumulative Releaseable Resources (oz)"),
    (33, "Cumulative Unlocked to Markets (oz)"),
    (34, "Cumulative Allocation to RealGold Treasury (oz)"),
    (36, "Cumulative Registered Resources ($)"),
    (37, "Cumulative Authorized Resources ($)"),
    (38, "Cumulative Releasable Resources ($)"),
    (39, "Cumulative Unlocked Resources ($)"),
    (40, "Cumulative Allocation to RealGold Treasury ($)"),
];

/// `(summary row, monthly row)` summed over each calendar year
const ANNUAL_ROWS: [(u32, u32); 11] = [
    (43, 3),
    (44, 18),
    (45, 19),
    (46, 20),
    (47, 21),
    (48, 22),
    (49, 23),
    (50, 25),
    (51, 26),
    (52, 27),
    (54, 4),
];

const ANNUAL_LABELS: [(u32, &str); 12] = [
    (42, "Annual Summaries"),
    (43, "# of mines brought online"),
    (44, "Assayed Resources ($)"),
    (45, "Authorized Resources ($)"),
    (46, "Releasable Resources ($)"),
    (47, "Released Resources ($)"),
    (48, "Registration Fees ($)"),
    (49, "Market Placement Fee ($)"),
    (50, "Total Fee Revenue ($)"),
    (51, "Total Allocation to 1031 ($)"),
    (52, "Total Allocation to RealGold Treasury ($)"),
    (54, "Assayed Resources (oz)"),
];

pub fn build_resource_supply(
    workbook: &mut Workbook,
    timeline: &Timeline,
    first_year_summary: bool,
) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Resource Supply - Complete Data Redistribution");
    let sheet = workbook.sheet_mut(RESOURCE_SHEET)?;

    report.cells_written += link_headers(sheet, timeline)?;
    report.note("Headers linked to XAUconfig");

    report.cells_written += write_monthly(sheet, timeline)?;
    report.note("SUMIF/COUNTIF/SUMPRODUCT formulas added (rows 3-16)");

    report.cells_written += write_labels(sheet, &DOLLAR_LABELS)?;
    report.cells_written += write_dollars(sheet, timeline)?;
    report.note("Dollar conversion formulas added (rows 18-27)");

    report.cells_written += write_labels(sheet, &CUMULATIVE_LABELS)?;
    report.cells_written += write_cumulative(sheet, timeline)?;
    report.note("Cumulative total formulas added (rows 30-40)");

    report.cells_written += write_labels(sheet, &ANNUAL_LABELS)?;
    let years = write_annual(sheet, timeline, first_year_summary)?;
    report.cells_written += years.len() * (ANNUAL_ROWS.len() + 1);
    if years.is_empty() {
        report.warn("Timeline covers no full calendar year; annual summaries skipped");
    } else {
        let columns: Vec<String> = years
            .iter()
            .map(|(year, col)| format!("{} in {}", year, col))
            .collect();
        report.note(format!("Annual summaries: {}", columns.join(", ")));
    }

    tracing::debug!(cells = report.cells_written, "resource supply rebuilt");
    Ok(report)
}

fn write_monthly(sheet: &mut Sheet, timeline: &Timeline) -> PatchResult<usize> {
    let mut written = 0;
    for k in timeline.offsets() {
        let col = timeline.column(k);
        let at = |row: u32| format!("{}{}", col, row);

        sheet.set_formula(&at(3), countif_offset(k))?;
        for (row, source) in SUMIF_ROWS {
            sheet.set_formula(&at(row), sumif_offset(k, source))?;
        }

        // Unitization fees on authorized resources
        sheet.set_formula(&at(8), fee_of(&col, 5))?;
        // Available 1031 units
        sheet.set_formula(&at(9), format!("={}", sumproduct_offset(k, &["Q", "AE"])))?;
        // Admin fees on unlocked resources
        sheet.set_formula(&at(10), fee_of(&col, 7))?;
        // New allocation to RealGold Treasury
        sheet.set_formula(
            &at(12),
            format!("={}11+{}", col, sumproduct_offset(k, &["Q", "AF"])),
        )?;
        // Token minting fees
        sheet.set_formula(&at(13), fee_of(&col, 12))?;
        sheet.set_formula(&at(14), format!("=SUM({col}8+{col}10)", col = col))?;
        sheet.set_formula(&at(15), format!("={col}9-{col}10", col = col))?;
        sheet.set_formula(&at(16), format!("={col}12-{col}13", col = col))?;
        written += 14;
    }
    Ok(written)
}

fn write_dollars(sheet: &mut Sheet, timeline: &Timeline) -> PatchResult<usize> {
    let mut written = 0;
    for k in timeline.offsets() {
        let col = timeline.column(k);
        for (row, source) in DOLLAR_ROWS {
            sheet.set_formula(&format!("{}{}", col, row), dollars_of(&col, source))?;
        }
        sheet.set_formula(
            &format!("{}25", col),
            format!("={col}22+{col}23", col = col),
        )?;
        written += DOLLAR_ROWS.len() + 1;
    }
    Ok(written)
}

fn write_cumulative(sheet: &mut Sheet, timeline: &Timeline) -> PatchResult<usize> {
    let first = timeline.first_column();
    let mut written = 0;
    for k in timeline.offsets() {
        let col = timeline.column(k);
        for (row, source) in CUMULATIVE_ROWS {
            sheet.set_formula(&format!("{}{}", col, row), cumulative_sum(&first, &col, source))?;
        }
        // Unlocked to markets averages rows 7 and 8
        sheet.set_formula(
            &format!("{}33", col),
            format!("=SUM(${}$7:{}8)/2", first, col),
        )?;
        sheet.set_formula(&format!("{}39", col), format!("={}33*{}", col, price_ref(&col)))?;
        sheet.set_formula(&format!("{}40", col), format!("={}34*{}", col, price_ref(&col)))?;
        written += CUMULATIVE_ROWS.len() + 3;
    }
    Ok(written)
}

/// Summaries land in each full year's December column; returns `(year, column)`
fn write_annual(
    sheet: &mut Sheet,
    timeline: &Timeline,
    include_first: bool,
) -> PatchResult<Vec<(i32, String)>> {
    let mut years = Vec::new();
    for (year, first, last) in timeline.summary_years(include_first) {
        let start_col = timeline.column(first);
        let end_col = timeline.column(last);

        sheet.set(&format!("{}42", end_col), year)?;
        for (row, source) in ANNUAL_ROWS {
            sheet.set_formula(
                &format!("{}{}", end_col, row),
                row_sum(&start_col, &end_col, source),
            )?;
        }
        years.push((year, end_col));
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use chrono::NaiveDate;

    fn built_with(first_year_summary: bool) -> Workbook {
        let mut wb = Workbook::new();
        wb.push(Sheet::new(RESOURCE_SHEET));
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap();
        build_resource_supply(&mut wb, &timeline, first_year_summary).unwrap();
        wb
    }

    fn built() -> Workbook {
        built_with(false)
    }

    fn formula<'a>(sheet: &'a Sheet, address: &str) -> &'a str {
        sheet.get(address).unwrap().as_formula().unwrap()
    }

    #[test]
    fn test_monthly_rows() {
        let wb = built();
        let sheet = wb.sheet(RESOURCE_SHEET).unwrap();

        assert_eq!(formula(sheet, "C1"), "=XAUconfig!C4");
        assert_eq!(formula(sheet, "B3"), "=COUNTIF('Mine Inventory'!$AO$2:$AO$13,0)");
        assert_eq!(
            formula(sheet, "C5"),
            "=SUMIF('Mine Inventory'!$AO$2:$AO$13,1,'Mine Inventory'!$M$2:$M$13)"
        );
        assert_eq!(formula(sheet, "B8"), "=B5*Inputs!$B$26");
        assert_eq!(
            formula(sheet, "B12"),
            "=B11+SUMPRODUCT(('Mine Inventory'!$AO$2:$AO$13=0)*('Mine Inventory'!$Q$2:$Q$13)*('Mine Inventory'!$AF$2:$AF$13))"
        );
        assert_eq!(formula(sheet, "B14"), "=SUM(B8+B10)");
        assert_eq!(formula(sheet, "B15"), "=B9-B10");
        assert_eq!(formula(sheet, "BI16"), "=BI12-BI13");
    }

    #[test]
    fn test_dollar_and_cumulative_rows() {
        let wb = built();
        let sheet = wb.sheet(RESOURCE_SHEET).unwrap();

        assert_eq!(formula(sheet, "D23"), "=D10*XAUconfig!D3");
        assert_eq!(formula(sheet, "D25"), "=D22+D23");
        assert_eq!(formula(sheet, "E30"), "=SUM($B$4:E4)");
        assert_eq!(formula(sheet, "E33"), "=SUM($B$7:E8)/2");
        assert_eq!(formula(sheet, "E40"), "=E34*XAUconfig!E3");
        assert_eq!(
            sheet.get("A24").unwrap(),
            &CellValue::text("RealGold Token Minting Fees ($)")
        );
    }

    #[test]
    fn test_annual_summaries_in_december_columns() {
        let wb = built();
        let sheet = wb.sheet(RESOURCE_SHEET).unwrap();

        assert_eq!(sheet.get("Y42").unwrap(), &CellValue::Number(2026.0));
        assert_eq!(formula(sheet, "Y43"), "=SUM(N3:Y3)");
        assert_eq!(formula(sheet, "AK50"), "=SUM(Z25:AK25)");
        assert_eq!(formula(sheet, "BI54"), "=SUM(AX4:BI4)");
        assert!(sheet.get("X43").unwrap().is_empty());
    }

    #[test]
    fn test_first_year_block_left_alone() {
        let mut wb = Workbook::new();
        let sheet = wb.create_sheet(RESOURCE_SHEET);
        sheet.set("M42", "kept").unwrap();
        sheet.set("M50", 12.5).unwrap();
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap();

        let report = build_resource_supply(&mut wb, &timeline, false).unwrap();

        let sheet = wb.sheet(RESOURCE_SHEET).unwrap();
        assert_eq!(sheet.get("M42").unwrap(), &CellValue::text("kept"));
        assert_eq!(sheet.get("M50").unwrap(), &CellValue::Number(12.5));
        assert!(sheet.get("M43").unwrap().is_empty());
        assert!(report
            .notes
            .iter()
            .any(|n| n == "Annual summaries: 2026 in Y, 2027 in AK, 2028 in AW, 2029 in BI"));
    }

    #[test]
    fn test_first_year_summary_when_requested() {
        let wb = built_with(true);
        let sheet = wb.sheet(RESOURCE_SHEET).unwrap();

        assert_eq!(sheet.get("M42").unwrap(), &CellValue::Number(2025.0));
        assert_eq!(formula(sheet, "M43"), "=SUM(B3:M3)");
    }
}
