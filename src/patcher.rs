//! Load → patch → save, plus the operations that touch an already patched file
//!
//! Nothing is written to disk until every phase has succeeded, so a failed
//! run never leaves a half-patched output behind.

use crate::config::PatchConfig;
use crate::error::{PatchError, PatchResult};
use crate::excel::{column_letter, WorkbookReader, WorkbookWriter};
use crate::formulas::{LABEL_ROW, MINE_FIRST_ROW, MINE_LAST_ROW, MINE_SHEET, OFFSET_COLUMN, TIMELINE_SHEET};
use crate::phases::{self, scan_ref_errors, PhaseReport, RefError, RunContext, RESOURCE_SHEET};
use crate::timeline::{Timeline, FIRST_MONTH_COL};
use crate::types::Workbook;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Result of a full patch run
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub reports: Vec<PhaseReport>,
    pub output: PathBuf,
    pub sheet_names: Vec<String>,
}

pub struct Patcher {
    config: PatchConfig,
    context: RunContext,
}

impl Patcher {
    pub fn new(config: PatchConfig) -> Self {
        Self {
            config,
            context: RunContext::now(),
        }
    }

    /// Pin the run timestamp
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    pub fn load(&self) -> PatchResult<Workbook> {
        WorkbookReader::new(&self.config.input).read()
    }

    pub fn patch(&self, workbook: &mut Workbook) -> PatchResult<Vec<PhaseReport>> {
        phases::run_all(workbook, &self.config, &self.context)
    }

    pub fn save(&self, workbook: &Workbook) -> PatchResult<()> {
        WorkbookWriter::new(workbook).write(&self.config.output)
    }

    pub fn run(&self) -> PatchResult<PatchOutcome> {
        let mut workbook = self.load()?;
        let reports = self.patch(&mut workbook)?;
        self.save(&workbook)?;

        Ok(PatchOutcome {
            reports,
            output: self.config.output.clone(),
            sheet_names: workbook.sheet_names().iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// `<stem>_<suffix>.xlsx` next to the input
pub fn derived_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    input.with_file_name(format!("{}_{}.xlsx", stem, suffix))
}

/// Rewrite the timeline rows of a patched workbook for a new start month
///
/// Formulas elsewhere address the timeline by column, so they follow the
/// new labels without being touched. The number of months is the one
/// already on the sheet; the plan only supplies the gold price curve.
pub fn retime(
    input: &Path,
    start: NaiveDate,
    output: &Path,
    config: &PatchConfig,
) -> PatchResult<PhaseReport> {
    let mut workbook = WorkbookReader::new(input).read()?;
    let existing = timeline_labels(&workbook)?.len();
    if existing == 0 {
        return Err(PatchError::Timeline(format!(
            "{} has no month labels in row {}; patch the model first",
            TIMELINE_SHEET, LABEL_ROW
        )));
    }
    let months = u16::try_from(existing)
        .map_err(|_| PatchError::Timeline(format!("{} months on the timeline", existing)))?;
    let timeline = Timeline::new(start, months)?;
    let first = timeline.label(0)?;
    let last = timeline.label(timeline.months() - 1)?;

    let mut report = PhaseReport::new(format!("Retime XAUconfig to {}", first));
    if months != config.timeline.months {
        report.note(format!(
            "Keeping the file's {}-month timeline (plan says {})",
            months, config.timeline.months
        ));
    }
    let sheet = workbook.sheet_mut(TIMELINE_SHEET)?;
    let previous = sheet.get(&format!("B{}", LABEL_ROW))?.to_string();

    report.cells_written +=
        phases::write_timeline_rows(sheet, &timeline, config.gold_price(), "Month", "Dropdown Source")?;
    sheet.set(
        "B2",
        format!("{}-month timeline: {} - {}", timeline.months(), first, last),
    )?;
    report.cells_written += 1;

    report.note(format!("Timeline now starts: {} (was {})", first, previous));
    report.note(format!("Timeline ends: {}", last));

    WorkbookWriter::new(&workbook).write(output)?;
    Ok(report)
}

/// Month labels currently on the timeline sheet, in column order
pub fn timeline_labels(workbook: &Workbook) -> PatchResult<Vec<String>> {
    let sheet = workbook.sheet(TIMELINE_SHEET)?;
    let mut labels = Vec::new();
    let mut col = FIRST_MONTH_COL;
    loop {
        let address = format!("{}{}", column_letter(col), LABEL_ROW);
        match sheet.get(&address)?.as_text() {
            Some(label) => labels.push(label.to_string()),
            None => break,
        }
        col += 1;
    }
    Ok(labels)
}

/// Parse `ROW=LABEL`, e.g. `2=Jan '26`
pub fn parse_assignment(text: &str) -> PatchResult<(u32, String)> {
    let (row, label) = text
        .split_once('=')
        .ok_or_else(|| PatchError::Reschedule(format!("expected ROW=LABEL, got '{}'", text)))?;
    let row: u32 = row
        .trim()
        .parse()
        .map_err(|_| PatchError::Reschedule(format!("invalid row '{}'", row.trim())))?;
    Ok((row, label.trim().to_string()))
}

/// Move mines to new onboard months and confirm the offset chain survives
pub fn reschedule(
    input: &Path,
    assignments: &[(u32, String)],
    output: &Path,
) -> PatchResult<PhaseReport> {
    let mut workbook = WorkbookReader::new(input).read()?;
    let labels = timeline_labels(&workbook)?;
    let mut report = PhaseReport::new("Reschedule Mine Onboard Dates");

    for (row, label) in assignments {
        if *row < MINE_FIRST_ROW || *row > MINE_LAST_ROW {
            return Err(PatchError::Reschedule(format!(
                "row {} is outside the mine rows {}-{}",
                row, MINE_FIRST_ROW, MINE_LAST_ROW
            )));
        }
        if !labels.iter().any(|l| l == label) {
            return Err(PatchError::Reschedule(format!(
                "'{}' is not a month on the timeline",
                label
            )));
        }
    }

    let mines = workbook.sheet_mut(MINE_SHEET)?;
    for (row, label) in assignments {
        let address = format!("B{}", row);
        let old = mines.get(&address)?.to_string();
        mines.set(&address, label.as_str())?;
        report.cells_written += 1;
        report.note(format!("{}: {} → {}", address, old, label));

        let offset_cell = format!("{}{}", OFFSET_COLUMN, row);
        if mines.get(&offset_cell)?.contains("MATCH") {
            report.note(format!("{} still has MATCH formula", offset_cell));
        } else {
            report.warn(format!("{} has no MATCH formula; row {} will not move", offset_cell, row));
        }
    }

    let resource = workbook.sheet(RESOURCE_SHEET)?;
    for (address, function) in [("B3", "COUNTIF"), ("B5", "SUMIF")] {
        if resource.get(address)?.contains(function) {
            report.note(format!("Resource Supply {} {} intact", address, function));
        } else {
            report.warn(format!("Resource Supply {} is missing its {} formula", address, function));
        }
    }

    WorkbookWriter::new(&workbook).write(output)?;
    Ok(report)
}

/// Every `#REF!` in a workbook on disk
pub fn audit(input: &Path) -> PatchResult<Vec<RefError>> {
    let workbook = WorkbookReader::new(input).read()?;
    Ok(scan_ref_errors(&workbook))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("2=Jan '26").unwrap(), (2, "Jan '26".to_string()));
        assert_eq!(parse_assignment(" 3 = Mar '26 ").unwrap(), (3, "Mar '26".to_string()));
        assert!(matches!(parse_assignment("Jan '26"), Err(PatchError::Reschedule(_))));
        assert!(matches!(parse_assignment("x=Jan '26"), Err(PatchError::Reschedule(_))));
    }

    #[test]
    fn test_derived_output() {
        assert_eq!(
            derived_output(Path::new("out/model.xlsx"), "TEST"),
            PathBuf::from("out/model_TEST.xlsx")
        );
    }

    #[test]
    fn test_timeline_labels_stop_at_first_gap() {
        let mut wb = Workbook::new();
        let sheet = wb.create_sheet(TIMELINE_SHEET);
        sheet.set("A4", "Month").unwrap();
        sheet.set("B4", "Jan '25").unwrap();
        sheet.set("C4", "Feb '25").unwrap();
        sheet.set("E4", "Apr '25").unwrap();

        assert_eq!(timeline_labels(&wb).unwrap(), vec!["Jan '25", "Feb '25"]);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let err = audit(Path::new("does/not/exist.xlsx")).unwrap_err();
        assert!(matches!(err, PatchError::InputNotFound(_)));
    }
}
