use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::patcher::{self, derived_output, PatchOutcome, Patcher};
use crate::phases::{PhaseReport, RefError};
use crate::verify::{self, Report, Suite};
use chrono::NaiveDate;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Audit output shows this many cells per sheet
const AUDIT_SAMPLE: usize = 5;

fn print_section(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{}", title.bold());
    println!("{}", "=".repeat(80));
}

fn print_report(report: &PhaseReport, verbose: bool) {
    print_section(&report.title);
    for note in &report.notes {
        println!("{} {}", "✓".green(), note);
    }
    for warning in &report.warnings {
        println!("{} {}", "⚠".yellow(), warning.yellow());
    }
    if verbose {
        println!("   {} cells written", report.cells_written);
    }
}

/// Plan from a YAML file when given, built-in defaults otherwise
pub fn load_config(path: Option<&Path>) -> PatchResult<PatchConfig> {
    match path {
        Some(path) => PatchConfig::load(path),
        None => Ok(PatchConfig::default()),
    }
}

/// Execute the patch command
pub fn patch(config: PatchConfig, verbose: bool) -> PatchResult<()> {
    print_section("RealGold Financial Model - Complete Dynamic Patch");
    println!("Input:  {}", config.input.display());
    println!("Output: {}", config.output.display());

    let patcher = Patcher::new(config);
    let PatchOutcome {
        reports,
        output,
        sheet_names,
    } = patcher.run()?;

    for report in &reports {
        print_report(report, verbose);
    }

    print_section("✅ COMPLETE DYNAMIC MODEL CREATED");
    let size = std::fs::metadata(&output)?.len();
    println!("\nSaved: {}", output.display().to_string().bold());
    println!("File size: {} KB", size.div_ceil(1024));
    println!("\nSheets in workbook:");
    for (i, name) in sheet_names.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }

    let warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();
    let cells: usize = reports.iter().map(|r| r.cells_written).sum();
    println!(
        "\n{} phases, {} cells written, {} warning(s)",
        reports.len(),
        cells,
        warnings
    );
    println!("\nChange any date in 'Mine Inventory' column B and every row redistributes.");

    Ok(())
}

/// Execute the retime command
pub fn retime(
    file: PathBuf,
    start: NaiveDate,
    output: Option<PathBuf>,
    config: PatchConfig,
) -> PatchResult<()> {
    let label = crate::timeline::format_label(start);
    let output = output.unwrap_or_else(|| derived_output(&file, "RETIMED"));

    print_section(&format!("FIXING TIMELINE: start at {}", label));
    println!("Loading: {}", file.display());

    let report = patcher::retime(&file, start, &output, &config)?;
    print_report(&report, false);

    println!("\nOutput: {}", output.display().to_string().bold());
    Ok(())
}

/// Execute the reschedule command
pub fn reschedule(file: PathBuf, assignments: Vec<String>, output: Option<PathBuf>) -> PatchResult<()> {
    let assignments = assignments
        .iter()
        .map(|a| patcher::parse_assignment(a))
        .collect::<PatchResult<Vec<_>>>()?;
    let output = output.unwrap_or_else(|| derived_output(&file, "RESCHEDULED"));

    print_section("Testing Dynamic Date Change Behavior");
    println!("Loading: {}", file.display());

    let report = patcher::reschedule(&file, &assignments, &output)?;
    print_report(&report, false);

    println!("\n{} {}", "✓ Saved:".green(), output.display());
    println!("Formulas recalculate when the file is opened in a spreadsheet application.");
    Ok(())
}

/// Execute the audit command
pub fn audit(file: PathBuf) -> PatchResult<()> {
    print_section("Analyzing Formula Errors");
    println!("File: {}", file.display());

    let errors = patcher::audit(&file)?;
    if errors.is_empty() {
        println!("\n{}", "✓ No #REF! errors found".green());
        return Ok(());
    }

    println!("\nFound {} #REF! errors:", errors.len().to_string().red().bold());
    for (sheet, cells) in group_by_sheet(&errors) {
        println!("\n  {}: {} errors", sheet.bold(), cells.len());
        for error in cells.iter().take(AUDIT_SAMPLE) {
            println!("    - {}: {}", error.cell, error.text);
        }
        if cells.len() > AUDIT_SAMPLE {
            println!("    ... and {} more", cells.len() - AUDIT_SAMPLE);
        }
    }
    Ok(())
}

/// Consecutive errors grouped per sheet, in workbook order
fn group_by_sheet(errors: &[RefError]) -> Vec<(&str, Vec<&RefError>)> {
    let mut groups: Vec<(&str, Vec<&RefError>)> = Vec::new();
    for error in errors {
        if let Some((sheet, cells)) = groups.last_mut() {
            if *sheet == error.sheet {
                cells.push(error);
                continue;
            }
        }
        groups.push((error.sheet.as_str(), vec![error]));
    }
    groups
}

/// Execute the verify command; returns whether every check passed
pub fn verify(file: Option<PathBuf>, suite: Suite, config: PatchConfig, json: bool) -> PatchResult<bool> {
    let file = file.unwrap_or_else(|| config.output.clone());
    let report = verify::verify_file(&file, suite, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_section(&format!("Verifying {} ({})", file.display(), suite));
        print_checks(&report);
    }

    Ok(report.all_passed())
}

fn print_checks(report: &Report) {
    for check in &report.checks {
        if check.passed {
            println!("{} {}", "✓".green(), check.detail);
        } else {
            println!("{} {}", "✗".red(), check.detail.red());
        }
    }

    println!(
        "\nResults: {} passed, {} failed out of {} checks",
        report.passed(),
        report.failed(),
        report.checks.len()
    );
    if report.all_passed() {
        println!("\n{}", "🎉 ALL CHECKS PASSED".bold().green());
    } else {
        println!("\n{}", "⚠ Some checks failed - see above".bold().yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(sheet: &str, cell: &str) -> RefError {
        RefError {
            sheet: sheet.to_string(),
            cell: cell.to_string(),
            text: "=#REF!".to_string(),
        }
    }

    #[test]
    fn test_group_by_sheet_keeps_workbook_order() {
        let errors = vec![
            error("Mine Inventory", "AJ2"),
            error("Mine Inventory", "AM2"),
            error("Inputs", "C4"),
        ];
        let groups = group_by_sheet(&errors);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Mine Inventory");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1[0].cell, "C4");
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), PatchConfig::default());
    }
}
