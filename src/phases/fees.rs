use super::PhaseReport;
use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::types::{CellValue, Workbook};

pub const INPUTS_SHEET: &str = "Inputs";
/// Unitization fee (linked to unlocks)
pub const UNITIZATION_FEE_CELL: &str = "B26";
pub const ADMIN_FEE_CELL: &str = "B25";

fn percent(value: &CellValue) -> String {
    match value.as_number() {
        Some(n) => format!("{} ({}%)", n, n * 100.0),
        None => value.to_string(),
    }
}

/// Set the unitization fee; the admin fee is only reported
pub fn fix_fees(workbook: &mut Workbook, config: &PatchConfig) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Fix Fees");
    let inputs = workbook.sheet_mut(INPUTS_SHEET)?;

    let old = inputs.get(UNITIZATION_FEE_CELL)?.clone();
    let fee = config.fees.unitization_fee;
    inputs.set(UNITIZATION_FEE_CELL, fee)?;
    report.cells_written = 1;

    report.note(format!(
        "Unitization Fee ({}): {} → {}",
        UNITIZATION_FEE_CELL,
        percent(&old),
        percent(&CellValue::Number(fee))
    ));
    report.note(format!(
        "Admin Fee ({}): {} (verified)",
        ADMIN_FEE_CELL,
        percent(inputs.get(ADMIN_FEE_CELL)?)
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sheet;

    #[test]
    fn test_fix_fees_leaves_admin_fee() {
        let mut wb = Workbook::new();
        let mut inputs = Sheet::new(INPUTS_SHEET);
        inputs.set("B25", 0.0001).unwrap();
        inputs.set("B26", 0.005).unwrap();
        wb.push(inputs);

        let report = fix_fees(&mut wb, &PatchConfig::default()).unwrap();

        let inputs = wb.sheet(INPUTS_SHEET).unwrap();
        assert_eq!(inputs.get("B26").unwrap(), &CellValue::Number(0.0001));
        assert_eq!(inputs.get("B25").unwrap(), &CellValue::Number(0.0001));
        assert_eq!(report.cells_written, 1);
        assert!(report.notes[0].contains("0.005"));
    }
}
