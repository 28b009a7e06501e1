use super::{link_headers, PhaseReport};
use crate::error::PatchResult;
use crate::timeline::Timeline;
use crate::types::Workbook;

/// Cashflow sheets whose row 1 follows the timeline; all optional
pub const CASHFLOW_SHEETS: [&str; 3] = ["RA LLC Cashflow", "RAF Cashflow (5yr)", "RGT Cashflow (5yr)"];

pub fn link_cashflow_headers(workbook: &mut Workbook, timeline: &Timeline) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Update Cashflow Sheet Headers");

    for name in CASHFLOW_SHEETS {
        if !workbook.contains(name) {
            report.warn(format!("{} not found, skipping", name));
            continue;
        }
        let sheet = workbook.sheet_mut(name)?;
        report.cells_written += link_headers(sheet, timeline)?;
        report.note(name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, Sheet};
    use chrono::NaiveDate;

    #[test]
    fn test_missing_cashflow_sheets_are_skipped() {
        let mut wb = Workbook::new();
        wb.push(Sheet::new("RA LLC Cashflow"));
        let timeline = Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap();

        let report = link_cashflow_headers(&mut wb, &timeline).unwrap();

        assert_eq!(report.notes, vec!["RA LLC Cashflow".to_string()]);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.cells_written, 60);
        assert_eq!(
            wb.sheet("RA LLC Cashflow").unwrap().get("BI1").unwrap(),
            &CellValue::Formula("=XAUconfig!BI4".to_string())
        );
    }
}
