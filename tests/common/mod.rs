//! Fixture workbook with the RealGold model layout

#![allow(dead_code)]

use realgold_patch::excel::WorkbookWriter;
use realgold_patch::phases::RunContext;
use realgold_patch::{PatchConfig, Sheet, Workbook};
use std::path::{Path, PathBuf};

pub const MINES: [(&str, &str); 4] = [
    ("Courbet", "Sep '25"),
    ("Mine 2", "Nov '25"),
    ("Mine 3", "Mar '26"),
    ("Mine 4", "Jun '26"),
];

pub fn context() -> RunContext {
    RunContext {
        generated_at: "2025-11-27 09:30:00".to_string(),
    }
}

/// Unpatched model: stale fees, hard-coded dates, static supply rows
pub fn fixture_workbook() -> Workbook {
    let mut wb = Workbook::new();

    let inputs = wb.create_sheet("Inputs");
    inputs.set("A25", "Admin Fee").unwrap();
    inputs.set("B25", 0.0001).unwrap();
    inputs.set("A26", "Unitization Fee").unwrap();
    inputs.set("B26", 0.005).unwrap();

    let mines = wb.create_sheet("Mine Inventory");
    mines.set("A1", "Mine").unwrap();
    mines.set("B1", "Onboard").unwrap();
    mines.set("F1", "Assayed Au").unwrap();
    for (i, (name, date)) in MINES.iter().enumerate() {
        let row = i + 2;
        mines.set(&format!("A{}", row), *name).unwrap();
        mines.set(&format!("B{}", row), *date).unwrap();
        mines.set(&format!("F{}", row), 1000.0 * (i as f64 + 1.0)).unwrap();
    }
    mines.set("A13", "Total").unwrap();
    mines.set("AJ2", realgold_patch::CellValue::formula("=#REF!*F2")).unwrap();

    let resource = wb.create_sheet("Resource Supply (5yr)");
    for (row, label) in [
        (3, "# of mines"),
        (4, "Registered Resources"),
        (5, "Authorized Resources"),
        (6, "Releasable Resources"),
        (7, "Unlocked Resources"),
        (8, "Unitization Fees"),
        (9, "Available 1031 units"),
        (10, "Admin Fees"),
        (11, "RGT Liquidity Fee"),
        (12, "New Allocation to RealGold Treasury"),
        (13, "RealGold Token Minting Fees"),
        (14, "Total Admin & Unit Fee Rev RAF"),
        (15, "Allocation to 1031 by Trusts"),
        (16, "Allocation to RealGold Treasury by Trusts"),
    ] {
        resource.set(&format!("A{}", row), label).unwrap();
        resource.set(&format!("B{}", row), 0.0).unwrap();
    }

    wb.create_sheet("Token Supply (5yr)").set("A3", "RealGold Treasury").unwrap();
    wb.create_sheet("Token Demand (5yr)").set("A3", "Unlocked Supply").unwrap();
    wb.create_sheet("RA LLC Cashflow").set("A2", "Revenue").unwrap();
    wb
}

pub fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("attachment_3.xlsx");
    WorkbookWriter::new(&fixture_workbook()).write(&path).unwrap();
    path
}

pub fn config_for(input: &Path, output: &Path) -> PatchConfig {
    PatchConfig {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        ..PatchConfig::default()
    }
}

pub fn sheet<'a>(wb: &'a Workbook, name: &str) -> &'a Sheet {
    wb.sheet(name).unwrap()
}
