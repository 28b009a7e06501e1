use super::PhaseReport;
use crate::config::PatchConfig;
use crate::error::{PatchError, PatchResult};
use crate::excel::CellRef;
use crate::formulas::{
    match_offset, timeline_row_range, DROPDOWN_ROW, MINE_FIRST_ROW, MINE_LAST_ROW, MINE_SHEET,
    OFFSET_COLUMN,
};
use crate::timeline::Timeline;
use crate::types::{Sheet, Validation, Workbook};

/// A row holds a mine when its name is set and it is not a totals row
pub fn is_mine_row(sheet: &Sheet, row: u32) -> bool {
    let name = sheet.get_at(CellRef::new(row - 1, 0));
    if name.is_empty() {
        return false;
    }
    !name.to_string().contains("Total")
}

/// Set configured onboard dates in column B
pub fn set_mine_dates(
    workbook: &mut Workbook,
    config: &PatchConfig,
    timeline: &Timeline,
) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Mine Onboard Dates");
    let mines = workbook.sheet_mut(MINE_SHEET)?;

    for mine in &config.mines {
        if mine.row < MINE_FIRST_ROW || mine.row > MINE_LAST_ROW {
            return Err(PatchError::Reschedule(format!(
                "row {} is outside the mine rows {}-{}",
                mine.row, MINE_FIRST_ROW, MINE_LAST_ROW
            )));
        }
        if timeline.offset_of(&mine.onboard).is_none() {
            report.warn(format!(
                "{} is not on the timeline; row {} will show no offset",
                mine.onboard, mine.row
            ));
        }

        let address = format!("B{}", mine.row);
        let old = mines.get(&address)?.to_string();
        let name = mines.get(&format!("A{}", mine.row))?.to_string();
        mines.set(&address, mine.onboard.as_str())?;
        report.cells_written += 1;
        report.note(format!(
            "{} (Row {}): {} → {}",
            name, mine.row, old, mine.onboard
        ));
    }

    Ok(report)
}

/// Dropdown date selectors in column B and MATCH offsets in column AO
pub fn setup_mine_dropdowns(workbook: &mut Workbook, timeline: &Timeline) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Mine Inventory with Date Dropdowns");
    let first = timeline.first_column();
    let last = timeline.last_column();
    let mines = workbook.sheet_mut(MINE_SHEET)?;

    mines.set(&format!("{}1", OFFSET_COLUMN), "Month Offset")?;
    report.cells_written += 1;

    let mut validation = Validation::list(timeline_row_range(DROPDOWN_ROW, &first, &last));
    validation.allow_blank = false;
    validation.prompt_title = Some("Date Selection".to_string());
    validation.prompt = Some("Select Mine Onboard Date".to_string());
    validation.error_title = Some("Invalid Date".to_string());
    validation.error = Some("Please select a date from the dropdown list".to_string());

    for row in MINE_FIRST_ROW..=MINE_LAST_ROW {
        if !is_mine_row(mines, row) {
            continue;
        }
        let name = mines.get(&format!("A{}", row))?.to_string();

        validation.add_cell(CellRef::parse(&format!("B{}", row))?);
        mines.set_formula(
            &format!("{}{}", OFFSET_COLUMN, row),
            match_offset(row, &first, &last),
        )?;
        report.cells_written += 1;
        report.note(format!("Row {} ({}): Dropdown + MATCH formula", row, name));
    }

    let before = mines.validations.len();
    mines
        .validations
        .retain(|v| !validation.ranges.iter().any(|r| v.covers(r.first)));
    if mines.validations.len() < before {
        report.note(format!(
            "Replaced {} existing dropdown rule(s)",
            before - mines.validations.len()
        ));
    }

    if validation.ranges.is_empty() {
        report.warn("No mine rows found; dropdown not added");
    } else {
        report.note(format!(
            "Dropdown source {} on {}",
            validation.formula1,
            validation.sqref()
        ));
        mines.add_validation(validation);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use chrono::NaiveDate;

    fn mine_sheet() -> Workbook {
        let mut sheet = Sheet::new(MINE_SHEET);
        sheet.set("A1", "Mine").unwrap();
        sheet.set("A2", "Courbet").unwrap();
        sheet.set("B2", "Sep '25").unwrap();
        sheet.set("A3", "Mine 2").unwrap();
        sheet.set("B3", "Nov '25").unwrap();
        sheet.set("A4", "Mine 3").unwrap();
        sheet.set("A6", "Mine 5").unwrap();
        sheet.set("A13", "Total").unwrap();
        let mut wb = Workbook::new();
        wb.push(sheet);
        wb
    }

    fn timeline() -> Timeline {
        Timeline::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 60).unwrap()
    }

    #[test]
    fn test_set_mine_dates() {
        let mut wb = mine_sheet();
        let report = set_mine_dates(&mut wb, &PatchConfig::default(), &timeline()).unwrap();

        let sheet = wb.sheet(MINE_SHEET).unwrap();
        assert_eq!(sheet.get("B2").unwrap(), &CellValue::text("Dec '25"));
        assert_eq!(sheet.get("B3").unwrap(), &CellValue::text("Jan '26"));
        assert_eq!(report.notes[0], "Courbet (Row 2): Sep '25 → Dec '25");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_dropdowns_skip_blank_and_total_rows() {
        let mut wb = mine_sheet();
        setup_mine_dropdowns(&mut wb, &timeline()).unwrap();

        let sheet = wb.sheet(MINE_SHEET).unwrap();
        assert_eq!(
            sheet.get("AO2").unwrap(),
            &CellValue::Formula("=IFERROR(MATCH(B2,XAUconfig!$B$4:$BI$4,0)-1,\"\")".to_string())
        );
        assert!(sheet.get("AO3").unwrap().is_formula());
        assert!(sheet.get("AO5").unwrap().is_empty());
        assert!(sheet.get("AO13").unwrap().is_empty());

        assert_eq!(sheet.validations.len(), 1);
        let dv = &sheet.validations[0];
        assert_eq!(dv.formula1, "XAUconfig!$B$6:$BI$6");
        assert_eq!(dv.sqref(), "B2:B4 B6");
        assert!(!dv.allow_blank);
    }

    #[test]
    fn test_dropdowns_replace_existing_rule() {
        let mut wb = mine_sheet();
        setup_mine_dropdowns(&mut wb, &timeline()).unwrap();
        let report = setup_mine_dropdowns(&mut wb, &timeline()).unwrap();

        assert_eq!(wb.sheet(MINE_SHEET).unwrap().validations.len(), 1);
        assert!(report.notes.contains(&"Replaced 1 existing dropdown rule(s)".to_string()));
    }
}
