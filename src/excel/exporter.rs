//! Excel exporter implementation - in-memory workbook → .xlsx

use crate::error::PatchResult;
use crate::excel::address::CellRef;
use crate::formulas::sheet_ref;
use crate::types::{
    CellStyle, CellValue, ErrorStyle, Sheet, Validation, ValidationKind, ValidationOperator,
    Visibility, Workbook,
};
use rust_xlsxwriter::{
    Color, DataValidation, DataValidationErrorStyle, DataValidationRule, Format, Formula,
    Workbook as XlsxWorkbook, Worksheet,
};
use std::path::Path;

/// Number format applied to serial dates on write
const DATE_FORMAT: &str = "mmm-yy";

/// Serializes a [`Workbook`] to an .xlsx file
pub struct WorkbookWriter<'a> {
    workbook: &'a Workbook,
}

impl<'a> WorkbookWriter<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self { workbook }
    }

    /// Write every sheet, in order, to `output_path`
    pub fn write(&self, output_path: &Path) -> PatchResult<()> {
        let mut xlsx = XlsxWorkbook::new();

        for sheet in self.workbook.sheets() {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            Self::write_sheet(worksheet, sheet)?;
        }
        self.write_names(&mut xlsx)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        xlsx.save(output_path)?;
        tracing::info!(path = %output_path.display(), sheets = self.workbook.len(), "workbook saved");
        Ok(())
    }

    fn write_names(&self, xlsx: &mut XlsxWorkbook) -> PatchResult<()> {
        for name in &self.workbook.defined_names {
            if name.is_builtin() {
                tracing::debug!(name = %name.name, "reserved name left to the writer");
                continue;
            }
            let qualified = match &name.scope {
                Some(sheet) if !self.workbook.contains(sheet) => {
                    tracing::warn!(name = %name.name, sheet = %sheet, "dropping name scoped to a missing sheet");
                    continue;
                }
                Some(sheet) => format!("{}!{}", sheet_ref(sheet), name.name),
                None => name.name.clone(),
            };
            xlsx.define_name(qualified, &format!("={}", name.formula))?;
        }
        Ok(())
    }

    fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> PatchResult<()> {
        match sheet.visibility {
            Visibility::Visible => {}
            Visibility::Hidden => {
                worksheet.set_hidden(true);
            }
            Visibility::VeryHidden => {
                worksheet.set_very_hidden(true);
            }
        }

        for (col, width) in &sheet.column_widths {
            worksheet.set_column_width(*col, *width)?;
        }

        // Merges first: merge_range blanks the whole area, cell values then land on top
        for range in &sheet.merges {
            if range.first == range.last {
                continue;
            }
            let format = sheet
                .style_at(range.first)
                .map(Self::format_for)
                .unwrap_or_default();
            worksheet.merge_range(
                range.first.row,
                range.first.col,
                range.last.row,
                range.last.col,
                "",
                &format,
            )?;
        }

        for (cell, value) in &sheet.cells {
            let format = sheet.style_at(*cell).map(|style| match value {
                CellValue::Date(_) if style.num_format.is_none() => {
                    Self::format_for(style).set_num_format(DATE_FORMAT)
                }
                _ => Self::format_for(style),
            });
            Self::write_cell(worksheet, *cell, value, format.as_ref())?;
        }

        // Styled cells without content (e.g. an emptied banner) keep their font
        for (cell, style) in &sheet.styles {
            if !sheet.cells.contains_key(cell) {
                worksheet.write_blank(cell.row, cell.col, &Self::format_for(style))?;
            }
        }

        for rule in &sheet.validations {
            Self::write_validation(worksheet, rule)?;
        }

        Ok(())
    }

    fn write_cell(
        worksheet: &mut Worksheet,
        cell: CellRef,
        value: &CellValue,
        format: Option<&Format>,
    ) -> PatchResult<()> {
        let (row, col) = (cell.row, cell.col);
        match (value, format) {
            (CellValue::Empty, _) => {}
            (CellValue::Number(n), Some(f)) => {
                worksheet.write_number_with_format(row, col, *n, f)?;
            }
            (CellValue::Number(n), None) => {
                worksheet.write_number(row, col, *n)?;
            }
            (CellValue::Text(s), Some(f)) | (CellValue::Error(s), Some(f)) => {
                worksheet.write_string_with_format(row, col, s, f)?;
            }
            (CellValue::Text(s), None) | (CellValue::Error(s), None) => {
                worksheet.write_string(row, col, s)?;
            }
            (CellValue::Bool(b), Some(f)) => {
                worksheet.write_boolean_with_format(row, col, *b, f)?;
            }
            (CellValue::Bool(b), None) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            (CellValue::Date(serial), Some(f)) => {
                worksheet.write_number_with_format(row, col, *serial, f)?;
            }
            (CellValue::Date(serial), None) => {
                let date_format = Format::new().set_num_format(DATE_FORMAT);
                worksheet.write_number_with_format(row, col, *serial, &date_format)?;
            }
            (CellValue::Formula(text), Some(f)) => {
                worksheet.write_formula_with_format(row, col, Formula::new(text), f)?;
            }
            (CellValue::Formula(text), None) => {
                worksheet.write_formula(row, col, Formula::new(text))?;
            }
        }
        Ok(())
    }

    fn format_for(style: &CellStyle) -> Format {
        let mut format = Format::new();
        if style.bold {
            format = format.set_bold();
        }
        if style.italic {
            format = format.set_italic();
        }
        if let Some(size) = style.font_size {
            format = format.set_font_size(size);
        }
        if let Some(rgb) = style.font_color {
            format = format.set_font_color(Color::RGB(rgb));
        }
        if let Some(rgb) = style.fill_color {
            format = format.set_background_color(Color::RGB(rgb));
        }
        if let Some(code) = &style.num_format {
            format = format.set_num_format(code.as_str());
        }
        format
    }

    fn write_validation(worksheet: &mut Worksheet, rule: &Validation) -> PatchResult<()> {
        let Some(mut validation) = Self::validation_for(rule) else {
            tracing::debug!(sqref = %rule.sqref(), "skipping validation without a formula");
            return Ok(());
        };
        validation = validation
            .ignore_blank(rule.allow_blank)
            .show_input_message(rule.show_input)
            .show_error_message(rule.show_error)
            .set_error_style(match rule.error_style {
                ErrorStyle::Stop => DataValidationErrorStyle::Stop,
                ErrorStyle::Warning => DataValidationErrorStyle::Warning,
                ErrorStyle::Information => DataValidationErrorStyle::Information,
            });
        if rule.is_list() {
            validation = validation.show_dropdown(rule.show_dropdown);
        }

        if let Some(title) = &rule.prompt_title {
            validation = validation.set_input_title(title.as_str())?;
        }
        if let Some(prompt) = &rule.prompt {
            validation = validation.set_input_message(prompt.as_str())?;
        }
        if let Some(title) = &rule.error_title {
            validation = validation.set_error_title(title.as_str())?;
        }
        if let Some(error) = &rule.error {
            validation = validation.set_error_message(error.as_str())?;
        }

        for range in &rule.ranges {
            worksheet.add_data_validation(
                range.first.row,
                range.first.col,
                range.last.row,
                range.last.col,
                &validation,
            )?;
        }
        Ok(())
    }

    /// Rule body by type; formulas pass through as text so references survive
    fn validation_for(rule: &Validation) -> Option<DataValidation> {
        let validation = DataValidation::new();
        if rule.kind == ValidationKind::Any {
            return Some(validation.allow_any_value());
        }
        if rule.formula1.is_empty() {
            return None;
        }

        let first = Formula::new(&rule.formula1);
        Some(match rule.kind {
            ValidationKind::List => validation.allow_list_formula(first),
            ValidationKind::Custom => validation.allow_custom(first),
            ValidationKind::Whole => validation.allow_whole_number_formula(Self::rule(rule, first)),
            ValidationKind::Decimal => validation.allow_decimal_number_formula(Self::rule(rule, first)),
            ValidationKind::Date => validation.allow_date_formula(Self::rule(rule, first)),
            ValidationKind::Time => validation.allow_time_formula(Self::rule(rule, first)),
            ValidationKind::TextLength => validation.allow_text_length_formula(Self::rule(rule, first)),
            ValidationKind::Any => validation.allow_any_value(),
        })
    }

    fn rule(rule: &Validation, first: Formula) -> DataValidationRule<Formula> {
        let second = rule
            .formula2
            .as_deref()
            .map(Formula::new)
            .unwrap_or_else(|| first.clone());
        match rule.operator {
            ValidationOperator::Between => DataValidationRule::Between(first, second),
            ValidationOperator::NotBetween => DataValidationRule::NotBetween(first, second),
            ValidationOperator::Equal => DataValidationRule::EqualTo(first),
            ValidationOperator::NotEqual => DataValidationRule::NotEqualTo(first),
            ValidationOperator::GreaterThan => DataValidationRule::GreaterThan(first),
            ValidationOperator::GreaterThanOrEqual => DataValidationRule::GreaterThanOrEqualTo(first),
            ValidationOperator::LessThan => DataValidationRule::LessThan(first),
            ValidationOperator::LessThanOrEqual => DataValidationRule::LessThanOrEqualTo(first),
        }
    }
}
