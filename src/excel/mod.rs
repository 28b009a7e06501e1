//! Excel import/export
//!
//! This module provides the .xlsx round trip the patcher is built on:
//! - Import: .xlsx → `Workbook` (values, formula text, styles, merges,
//!   validations, defined names, sheet visibility)
//! - Export: `Workbook` → .xlsx, reproducing the same

pub mod address;
mod exporter;
mod importer;
mod package;
mod sheet_xml;
mod styles;

pub use address::{column_index, column_letter, CellRange, CellRef};
pub use exporter::WorkbookWriter;
pub use importer::WorkbookReader;
