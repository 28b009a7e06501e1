use super::PhaseReport;
use crate::error::PatchResult;
use crate::excel::{column_letter, CellRef};
use crate::formulas::MINE_SHEET;
use crate::types::{Sheet, Workbook};
use serde::Serialize;
use std::collections::BTreeSet;

const REF_ERROR: &str = "#REF!";

/// A cell whose formula, text or error value carries `#REF!`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefError {
    pub sheet: String,
    pub cell: String,
    pub text: String,
}

/// Every broken reference in the workbook, sheet by sheet in row-major order
pub fn scan_ref_errors(workbook: &Workbook) -> Vec<RefError> {
    workbook.sheets().iter().flat_map(scan_sheet).collect()
}

fn scan_sheet(sheet: &Sheet) -> Vec<RefError> {
    sheet
        .find(REF_ERROR)
        .into_iter()
        .map(|(cell, value)| RefError {
            sheet: sheet.name.clone(),
            cell: cell.to_string(),
            text: value.to_string(),
        })
        .collect()
}

/// Clear broken references in Mine Inventory; the cells are left empty
pub fn clear_ref_errors(workbook: &mut Workbook) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Fixing #REF! Errors");
    let mines = workbook.sheet_mut(MINE_SHEET)?;

    let broken: Vec<CellRef> = mines.find(REF_ERROR).into_iter().map(|(c, _)| c).collect();
    for cell in &broken {
        mines.clear(*cell);
    }

    report.cells_written = broken.len();
    if broken.is_empty() {
        report.note("No #REF! errors found in Mine Inventory");
    } else {
        let columns: Vec<String> = broken
            .iter()
            .map(|c| c.col)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(column_letter)
            .collect();
        report.note(format!("Cleared {} #REF! errors", broken.len()));
        report.warn(format!(
            "Cleared cells in column(s) {} need review",
            columns.join(", ")
        ));
    }
    tracing::debug!(cleared = broken.len(), "ref errors cleared");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn broken_workbook() -> Workbook {
        let mut mines = Sheet::new(MINE_SHEET);
        mines.set("A2", "Courbet").unwrap();
        mines.set("AJ2", CellValue::formula("=#REF!*2")).unwrap();
        mines.set("AJ3", CellValue::Error("#REF!".to_string())).unwrap();
        mines.set("AM2", CellValue::formula("=SUM(#REF!)")).unwrap();
        mines.set("AN2", CellValue::formula("=AJ2+1")).unwrap();

        let mut other = Sheet::new("Inputs");
        other.set("C4", CellValue::formula("=#REF!")).unwrap();

        let mut wb = Workbook::new();
        wb.push(other);
        wb.push(mines);
        wb
    }

    #[test]
    fn test_scan_groups_by_sheet_order() {
        let errors = scan_ref_errors(&broken_workbook());

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].sheet, "Inputs");
        assert_eq!(errors[0].cell, "C4");
        assert_eq!(errors[1].cell, "AJ2");
        assert_eq!(errors[1].text, "=#REF!*2");
    }

    #[test]
    fn test_clear_only_touches_mine_inventory() {
        let mut wb = broken_workbook();
        let report = clear_ref_errors(&mut wb).unwrap();

        assert_eq!(report.cells_written, 3);
        assert_eq!(report.warnings, vec!["Cleared cells in column(s) AJ, AM need review".to_string()]);

        let mines = wb.sheet(MINE_SHEET).unwrap();
        assert!(mines.get("AJ2").unwrap().is_empty());
        assert!(mines.get("AJ3").unwrap().is_empty());
        assert!(mines.get("AN2").unwrap().is_formula());
        assert_eq!(scan_ref_errors(&wb).len(), 1);
    }
}
