use super::{Check, Report};
use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::formulas::{
    timeline_row_range, LABEL_ROW, MINE_SHEET, OFFSET_COLUMN, TIMELINE_SHEET, UNITIZATION_FEE_REF,
};
use crate::phases::{
    CASHFLOW_SHEETS, DEMAND_SHEET, INPUTS_SHEET, RESOURCE_SHEET, SUPPLY_SHEET,
};
use crate::types::{Sheet, Workbook};

const FEE_TOLERANCE: f64 = 1e-12;

/// Formula-type expectations for the redistribution rows
const FORMULA_TYPES: [(&str, &str); 14] = [
    ("B3", "COUNTIF"),
    ("B4", "SUMIF"),
    ("B5", "SUMIF"),
    ("B6", "SUMIF"),
    ("B7", "SUMIF"),
    ("B8", UNITIZATION_FEE_REF),
    ("B9", "SUMPRODUCT"),
    ("B10", UNITIZATION_FEE_REF),
    ("B11", "SUMIF"),
    ("B12", "SUMPRODUCT"),
    ("B13", UNITIZATION_FEE_REF),
    ("B14", "SUM"),
    ("B15", "B9-B10"),
    ("B16", "B12-B13"),
];

const ANNUAL_FIRST_ROW: u32 = 43;
const ANNUAL_LAST_ROW: u32 = 54;

fn require<'a>(workbook: &'a Workbook, name: &str, report: &mut Report) -> Option<&'a Sheet> {
    match workbook.sheet(name) {
        Ok(sheet) => Some(sheet),
        Err(_) => {
            report.push(Check::fail(
                format!("{} exists", name),
                format!("Sheet '{}' not found", name),
            ));
            None
        }
    }
}

fn has_formulas(sheet: &Sheet, addresses: &[String]) -> PatchResult<bool> {
    for address in addresses {
        if !sheet.get(address)?.is_formula() {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn dropdowns(workbook: &Workbook, config: &PatchConfig, report: &mut Report) -> PatchResult<()> {
    let timeline = config.timeline()?;
    let start = timeline.label(0)?;

    if let Some(sheet) = require(workbook, TIMELINE_SHEET, report) {
        let b4 = sheet.get("B4")?;
        let b6 = sheet.get("B6")?;
        report.push(Check::expect(
            "Timeline start",
            b4.as_text() == Some(start.as_str()) && b6.as_text() == Some(start.as_str()),
            format!("Timeline and dropdown list both start at {}", start),
            format!("Timeline/dropdown mismatch: B4={}, B6={}", b4, b6),
        ));
    }

    if let Some(mines) = require(workbook, MINE_SHEET, report) {
        if let Some(courbet) = config.mines.iter().find(|m| m.row == 2) {
            let b2 = mines.get("B2")?;
            report.push(Check::expect(
                "Courbet date",
                b2.as_text() == Some(courbet.onboard.as_str()),
                format!("Courbet date is {}", courbet.onboard),
                format!("Courbet date is {}, expected {}", b2, courbet.onboard),
            ));
        }

        let rules = mines.validations.iter().filter(|v| v.is_list()).count();
        report.push(Check::expect(
            "Data validation",
            rules > 0,
            format!("Data validation configured ({} rule(s))", rules),
            "No dropdown data validation found",
        ));

        let ao2 = mines.get("AO2")?;
        report.push(Check::expect(
            "AO2 offset",
            ao2.contains("MATCH"),
            "AO2 contains MATCH formula",
            format!("AO2 is not a MATCH formula: {}", ao2),
        ));
    }

    if let Some(resource) = require(workbook, RESOURCE_SHEET, report) {
        for (address, function) in [("B3", "COUNTIF"), ("B5", "SUMIF")] {
            let value = resource.get(address)?;
            report.push(Check::expect(
                format!("Resource Supply {}", address),
                value.contains(function),
                format!("Resource Supply {} contains {} formula", address, function),
                format!("Resource Supply {}: {}", address, value),
            ));
        }
    }

    if let Some(inputs) = require(workbook, INPUTS_SHEET, report) {
        let expected = config.fees.unitization_fee;
        let fee = inputs.get("B26")?;
        let matches = fee
            .as_number()
            .map(|v| (v - expected).abs() < FEE_TOLERANCE)
            .unwrap_or(false);
        report.push(Check::expect(
            "Unitization fee",
            matches,
            format!("Unitization fee is {}", expected),
            format!("Unitization fee is {}, expected {}", fee, expected),
        ));
    }

    let mut unlinked = Vec::new();
    for name in [SUPPLY_SHEET, DEMAND_SHEET].into_iter().chain(CASHFLOW_SHEETS) {
        if let Ok(sheet) = workbook.sheet(name) {
            if !sheet.get("B1")?.contains(TIMELINE_SHEET) {
                unlinked.push(name);
            }
        }
    }
    report.push(Check::expect(
        "Header links",
        unlinked.is_empty(),
        "All time-based sheets linked to XAUconfig",
        format!("Not linked to XAUconfig: {}", unlinked.join(", ")),
    ));

    Ok(())
}

pub(super) fn redistribution(
    workbook: &Workbook,
    config: &PatchConfig,
    report: &mut Report,
) -> PatchResult<()> {
    let timeline = config.timeline()?;
    let Some(resource) = require(workbook, RESOURCE_SHEET, report) else {
        return Ok(());
    };

    for row in 3..=16 {
        let label = resource.get(&format!("A{}", row))?.to_string();
        let ok = has_formulas(resource, &[format!("B{}", row), format!("C{}", row)])?;
        report.push(Check::expect(
            format!("Row {}", row),
            ok,
            format!("Row {} has formulas", row),
            format!("Row {} ({}) missing formulas", row, label),
        ));
    }

    for (address, expected) in FORMULA_TYPES {
        let value = resource.get(address)?;
        report.push(Check::expect(
            format!("{} formula type", address),
            value.contains(expected),
            format!("{} contains {}", address, expected),
            format!("{} expected {}, got: {}", address, expected, value),
        ));
    }

    let mut missing = Vec::new();
    for k in timeline.offsets() {
        let col = timeline.column(k);
        if !resource.get(&format!("{}5", col))?.contains("SUMIF") {
            missing.push(col);
        }
    }
    report.push(Check::expect(
        "Month coverage",
        missing.is_empty(),
        format!(
            "All {} months ({}-{}) have formulas",
            timeline.months(),
            timeline.first_column(),
            timeline.last_column()
        ),
        format!("Missing formulas in columns: {}", missing.join(", ")),
    ));

    let b5 = resource.get("B5")?;
    let c5 = resource.get("C5")?;
    report.push(Check::expect(
        "Offset progression",
        b5.contains(",0,") && c5.contains(",1,"),
        "Offset progression correct (0, 1, ...)",
        format!("Offset progression issue: B5={}, C5={}", b5, c5),
    ));

    Ok(())
}

pub(super) fn rows(workbook: &Workbook, config: &PatchConfig, report: &mut Report) -> PatchResult<()> {
    let timeline = config.timeline()?;
    let Some(resource) = require(workbook, RESOURCE_SHEET, report) else {
        return Ok(());
    };

    let include_first = config.timeline.first_year_summary;
    let annual: Vec<(i32, String)> = timeline
        .summary_years(include_first)
        .into_iter()
        .map(|(year, _, last)| (year, timeline.column(last)))
        .collect();

    let monthly_rows = (3..=16).chain(18..=27).chain(30..=34).chain(36..=40);
    for row in monthly_rows {
        let label = resource.get(&format!("A{}", row))?;
        if label.is_empty() {
            continue;
        }
        let ok = has_formulas(resource, &[format!("B{}", row), format!("C{}", row)])?;
        report.push(Check::expect(
            format!("Row {}", row),
            ok,
            format!("Row {}: {}", row, label),
            format!("Row {}: {} - MISSING FORMULAS", row, label),
        ));
    }

    for row in ANNUAL_FIRST_ROW..=ANNUAL_LAST_ROW {
        let label = resource.get(&format!("A{}", row))?;
        if label.is_empty() || annual.is_empty() {
            continue;
        }
        let cells: Vec<String> = annual.iter().map(|(_, col)| format!("{}{}", col, row)).collect();
        report.push(Check::expect(
            format!("Row {}", row),
            has_formulas(resource, &cells)?,
            format!("Row {}: {}", row, label),
            format!("Row {}: {} - MISSING FORMULAS", row, label),
        ));
    }

    if !include_first {
        if let Some((year, _, last)) = timeline.full_years().first().filter(|y| y.1 < 12) {
            report.push(Check::pass(
                format!("Annual {}", year),
                format!(
                    "Year {} has no summary column ({} is inside the first 12 months)",
                    year,
                    timeline.column(*last)
                ),
            ));
        }
    }

    for (year, col) in &annual {
        let year_cell = resource.get(&format!("{}42", col))?;
        let count = resource.get(&format!("{}43", col))?;
        report.push(Check::expect(
            format!("Annual {}", year),
            year_cell.as_number() == Some(*year as f64) && count.contains("SUM"),
            format!("Column {} (Year {}) has SUM formula", col, year),
            format!("Column {} (Year {}): year={}, row 43={}", col, year, year_cell, count),
        ));
    }

    Ok(())
}

pub(super) fn structure(workbook: &Workbook, config: &PatchConfig, report: &mut Report) -> PatchResult<()> {
    let timeline = config.timeline()?;

    if let Some(mines) = require(workbook, MINE_SHEET, report) {
        let ao2 = mines.get(&format!("{}2", OFFSET_COLUMN))?;
        report.push(Check::expect(
            "AO2 references B2",
            ao2.contains("B2"),
            "AO formulas reference Column B",
            format!("AO2 does not reference B2: {}", ao2),
        ));

        let labels = timeline_row_range(LABEL_ROW, &timeline.first_column(), &timeline.last_column());
        report.push(Check::expect(
            "Absolute timeline range",
            ao2.contains(&labels),
            format!("MATCH uses absolute reference {}", labels),
            format!("AO2 does not use {}: {}", labels, ao2),
        ));
    }

    let Some(resource) = require(workbook, RESOURCE_SHEET, report) else {
        return Ok(());
    };

    let b5 = resource.get("B5")?;
    report.push(Check::expect(
        "Offset column range",
        b5.contains(&format!("${}$", OFFSET_COLUMN)),
        "Resource Supply formulas reference the AO column range",
        format!("B5 does not reference $AO$: {}", b5),
    ));

    let mut wrong = Vec::new();
    for k in timeline.offsets() {
        let col = timeline.column(k);
        let value = resource.get(&format!("{}5", col))?;
        if !(value.contains("SUMIF") && value.contains(&format!(",{},", k))) {
            wrong.push(col);
        }
    }
    report.push(Check::expect(
        "Month offsets",
        wrong.is_empty(),
        format!("All {} month columns SUMIF on their own offset", timeline.months()),
        format!("Wrong or missing offset in columns: {}", wrong.join(", ")),
    ));

    Ok(())
}

pub(super) fn timeline(workbook: &Workbook, config: &PatchConfig, report: &mut Report) -> PatchResult<()> {
    let expected = config.timeline()?;
    let Some(sheet) = require(workbook, TIMELINE_SHEET, report) else {
        return Ok(());
    };

    for k in expected.offsets().take(12) {
        let address = format!("{}{}", expected.column(k), LABEL_ROW);
        let label = expected.label(k)?;
        let actual = sheet.get(&address)?;
        report.push(Check::expect(
            address.clone(),
            actual.as_text() == Some(label.as_str()),
            format!("{}: {}", address, label),
            format!("{}: {} (expected {})", address, actual, label),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::{run_all, RunContext};
    use crate::verify::{run_suite, Suite};

    fn patched() -> Workbook {
        let mut wb = Workbook::new();
        let inputs = wb.create_sheet(INPUTS_SHEET);
        inputs.set("B25", 0.0001).unwrap();
        inputs.set("B26", 0.005).unwrap();

        let mines = wb.create_sheet(MINE_SHEET);
        mines.set("A2", "Courbet").unwrap();
        mines.set("A3", "Mine 2").unwrap();
        mines.set("A13", "Total").unwrap();

        let resource = wb.create_sheet(RESOURCE_SHEET);
        for (row, label) in [(3, "# of mines"), (5, "Authorized Resources"), (16, "Allocation")] {
            resource.set(&format!("A{}", row), label).unwrap();
        }
        wb.create_sheet(SUPPLY_SHEET);
        wb.create_sheet(DEMAND_SHEET);

        let context = RunContext {
            generated_at: "2025-01-01 00:00:00".to_string(),
        };
        run_all(&mut wb, &PatchConfig::default(), &context).unwrap();
        wb
    }

    #[test]
    fn test_all_suites_pass_after_patching() {
        let report = run_suite(&patched(), Suite::All, &PatchConfig::default()).unwrap();
        let failures: Vec<_> = report.checks.iter().filter(|c| !c.passed).collect();
        assert!(failures.is_empty(), "{:?}", failures);
    }

    #[test]
    fn test_unpatched_fee_fails() {
        let mut wb = patched();
        wb.sheet_mut(INPUTS_SHEET).unwrap().set("B26", 0.005).unwrap();

        let report = run_suite(&wb, Suite::Dropdowns, &PatchConfig::default()).unwrap();
        let fee = report.checks.iter().find(|c| c.name == "Unitization fee").unwrap();
        assert!(!fee.passed);
        assert_eq!(fee.detail, "Unitization fee is 0.005, expected 0.0001");
    }

    #[test]
    fn test_shifted_offset_is_caught() {
        let mut wb = patched();
        wb.sheet_mut(RESOURCE_SHEET)
            .unwrap()
            .set_formula("D5", "=SUMIF('Mine Inventory'!$AO$2:$AO$13,7,'Mine Inventory'!$M$2:$M$13)")
            .unwrap();

        let report = run_suite(&wb, Suite::Structure, &PatchConfig::default()).unwrap();
        let offsets = report.checks.iter().find(|c| c.name == "Month offsets").unwrap();
        assert_eq!(offsets.detail, "Wrong or missing offset in columns: D");
    }

    #[test]
    fn test_timeline_suite_reports_each_month() {
        let mut config = PatchConfig::default();
        config.timeline.start = chrono::NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        let report = run_suite(&patched(), Suite::Timeline, &config).unwrap();
        assert_eq!(report.checks.len(), 12);
        assert_eq!(report.failed(), 12);
        assert_eq!(report.checks[0].detail, "B4: Jan '25 (expected Dec '25)");
    }

    #[test]
    fn test_rows_suite_notes_skipped_first_year() {
        let report = run_suite(&patched(), Suite::Rows, &PatchConfig::default()).unwrap();

        let first = report.checks.iter().find(|c| c.name == "Annual 2025").unwrap();
        assert!(first.passed);
        assert_eq!(
            first.detail,
            "Year 2025 has no summary column (M is inside the first 12 months)"
        );
        let last = report.checks.iter().find(|c| c.name == "Annual 2029").unwrap();
        assert_eq!(last.detail, "Column BI (Year 2029) has SUM formula");
    }
}
