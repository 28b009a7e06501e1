//! Excel importer implementation - .xlsx → in-memory workbook

use crate::error::{PatchError, PatchResult};
use crate::excel::address::{CellRange, CellRef};
use crate::excel::package::Package;
use crate::excel::sheet_xml::parse_sheet;
use crate::excel::styles::StyleTable;
use crate::types::{CellValue, Sheet, Visibility, Workbook};
use calamine::{open_workbook, Data, Dimensions, Range, Reader, SheetVisible, Xlsx};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Loads a workbook: values, formula text, cell formats, merges,
/// validations, defined names and sheet visibility
pub struct WorkbookReader {
    path: PathBuf,
}

impl WorkbookReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read(&self) -> PatchResult<Workbook> {
        if !self.path.exists() {
            return Err(PatchError::InputNotFound(self.path.clone()));
        }

        let mut xlsx: Xlsx<_> = open_workbook(&self.path)?;
        let mut package = Package::open(&self.path)?;
        let parts = package.workbook()?;
        let styles = match package.read_optional("xl/styles.xml")? {
            Some(xml) => StyleTable::parse(&xml)?,
            None => StyleTable::default(),
        };
        let visibility: HashMap<String, Visibility> = xlsx
            .sheets_metadata()
            .iter()
            .map(|meta| (meta.name.clone(), Self::visibility(meta.visible)))
            .collect();

        let mut workbook = Workbook::new();
        for sheet_name in xlsx.sheet_names() {
            let mut sheet = Sheet::new(sheet_name.clone());
            sheet.visibility = visibility.get(&sheet_name).copied().unwrap_or_default();

            let values = xlsx.worksheet_range(&sheet_name)?;
            Self::load_values(&mut sheet, &values);

            // Formula cells win over their cached values
            if let Ok(formulas) = xlsx.worksheet_formula(&sheet_name) {
                Self::load_formulas(&mut sheet, &formulas);
            }

            if let Some(merges) = xlsx.worksheet_merge_cells(&sheet_name) {
                sheet.merges = merges?.iter().map(Self::merge_range).collect();
            }

            let part = parts.part_of(&sheet_name).map(str::to_string);
            match part {
                Some(part) => match package.read_optional(&part)? {
                    Some(xml) => {
                        let extras = parse_sheet(&xml)?;
                        sheet.validations = extras.validations;
                        sheet.column_widths = extras.column_widths;
                        for (cell, xf) in extras.style_ids {
                            if let Some(style) = styles.style(xf) {
                                sheet.styles.insert(cell, style);
                            }
                        }
                    }
                    None => tracing::debug!(sheet = %sheet_name, part = %part, "worksheet part missing"),
                },
                None => tracing::debug!(sheet = %sheet_name, "sheet has no worksheet relationship"),
            }

            tracing::debug!(
                sheet = %sheet.name,
                cells = sheet.cell_count(),
                styles = sheet.styles.len(),
                merges = sheet.merges.len(),
                validations = sheet.validations.len(),
                "sheet loaded"
            );
            workbook.push(sheet);
        }
        workbook.defined_names = parts.names;

        tracing::info!(
            path = %self.path.display(),
            sheets = workbook.len(),
            names = workbook.defined_names.len(),
            "workbook loaded"
        );
        Ok(workbook)
    }

    fn visibility(visible: SheetVisible) -> Visibility {
        match visible {
            SheetVisible::Visible => Visibility::Visible,
            SheetVisible::Hidden => Visibility::Hidden,
            SheetVisible::VeryHidden => Visibility::VeryHidden,
        }
    }

    fn merge_range(dimensions: &Dimensions) -> CellRange {
        CellRange::new(
            CellRef::new(dimensions.start.0, dimensions.start.1 as u16),
            CellRef::new(dimensions.end.0, dimensions.end.1 as u16),
        )
    }

    fn load_values(sheet: &mut Sheet, range: &Range<Data>) {
        let Some((start_row, start_col)) = range.start() else {
            return;
        };

        for (row, col, data) in range.cells() {
            let value = Self::convert(data);
            if value.is_empty() {
                continue;
            }
            let cell = CellRef::new(start_row + row as u32, (start_col as usize + col) as u16);
            sheet.set_at(cell, value);
        }
    }

    fn load_formulas(sheet: &mut Sheet, range: &Range<String>) {
        let Some((start_row, start_col)) = range.start() else {
            return;
        };

        for (row, col, formula) in range.cells() {
            if formula.is_empty() {
                continue;
            }
            let cell = CellRef::new(start_row + row as u32, (start_col as usize + col) as u16);
            // Add leading = if not present (calamine strips it)
            sheet.set_at(cell, CellValue::formula(formula.as_str()));
        }
    }

    fn convert(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}
