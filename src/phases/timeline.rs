use super::PhaseReport;
use crate::error::PatchResult;
use crate::formulas::{DROPDOWN_ROW, LABEL_ROW, PRICE_ROW, TIMELINE_SHEET};
use crate::timeline::{GoldPriceCurve, Timeline};
use crate::types::{Sheet, Workbook};

/// Recreate the timeline sheet from scratch at the end of the workbook
pub fn build_timeline(
    workbook: &mut Workbook,
    timeline: &Timeline,
    prices: GoldPriceCurve,
) -> PatchResult<PhaseReport> {
    let mut report = PhaseReport::new("Create XAUconfig Timeline");
    let existed = workbook.remove(TIMELINE_SHEET).is_some();

    let sheet = workbook.create_sheet(TIMELINE_SHEET);
    let first = timeline.label(0)?;
    let last = timeline.label(timeline.months() - 1)?;

    sheet.set("A1", "XAU Configuration Timeline")?;
    sheet.set("A2", "Description")?;
    sheet.set(
        "B2",
        format!("{}-month timeline: {} - {}", timeline.months(), first, last),
    )?;
    report.cells_written += 3;

    report.cells_written += write_timeline_rows(sheet, timeline, prices, "Month Label", "Date Dropdown List")?;

    if existed {
        report.note("Replaced existing XAUconfig sheet");
    }
    report.note(format!(
        "Created {}-month timeline: {} → {}",
        timeline.months(),
        first,
        last
    ));
    report.note(format!(
        "Gold price row starts at {} with {}% annual growth",
        prices.initial,
        prices.annual_growth * 100.0
    ));

    Ok(report)
}

/// Gold price, month label and dropdown rows; reused when retiming
pub fn write_timeline_rows(
    sheet: &mut Sheet,
    timeline: &Timeline,
    prices: GoldPriceCurve,
    label_heading: &str,
    dropdown_heading: &str,
) -> PatchResult<usize> {
    sheet.set(&format!("A{}", PRICE_ROW), "Gold Price (CAGR)")?;
    sheet.set(&format!("A{}", LABEL_ROW), label_heading)?;
    sheet.set(&format!("A{}", DROPDOWN_ROW), dropdown_heading)?;

    for k in timeline.offsets() {
        let col = timeline.column(k);
        let label = timeline.label(k)?;
        sheet.set(&format!("{}{}", col, PRICE_ROW), prices.price(k))?;
        sheet.set(&format!("{}{}", col, LABEL_ROW), label.as_str())?;
        sheet.set(&format!("{}{}", col, DROPDOWN_ROW), label)?;
    }

    tracing::debug!(months = timeline.months(), "timeline rows written");
    Ok(3 + 3 * timeline.months() as usize)
}
