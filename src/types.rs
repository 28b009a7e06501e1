use crate::error::{PatchError, PatchResult};
use crate::excel::address::{CellRange, CellRef};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Cell Values
//==============================================================================

/// Content of a single cell
///
/// Formula text is stored verbatim with its leading `=` and is never
/// evaluated; the spreadsheet application computes it on open.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30)
    Date(f64),
    /// Error literal such as `#REF!`
    Error(String),
    Formula(String),
}

impl CellValue {
    /// Build a formula value, adding the leading `=` when missing
    pub fn formula(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            CellValue::Formula(text)
        } else {
            CellValue::Formula(format!("={}", text))
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        CellValue::Text(text.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::Date(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellValue::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// True when the formula text or literal string contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            CellValue::Formula(s) | CellValue::Text(s) | CellValue::Error(s) => s.contains(needle),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, "(empty)"),
            CellValue::Number(n) | CellValue::Date(n) => write!(f, "{}", n),
            CellValue::Text(s) | CellValue::Error(s) | CellValue::Formula(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

//==============================================================================
// Styles & Validation
//==============================================================================

/// Cell formatting carried through a load/save round trip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f64>,
    /// RGB color, e.g. `0xFF0000`
    pub font_color: Option<u32>,
    /// Solid background, RGB
    pub fill_color: Option<u32>,
    /// Excel number format code such as `0.00%`; `None` is General
    pub num_format: Option<String>,
}

impl CellStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    pub fn heading(size: f64) -> Self {
        Self {
            bold: true,
            font_size: Some(size),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, rgb: u32) -> Self {
        self.font_color = Some(rgb);
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Allowed-value type of a data validation rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationKind {
    #[default]
    Any,
    Whole,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationKind {
    /// From the `type` attribute of `<dataValidation>`
    pub fn from_xml(value: &str) -> Self {
        match value {
            "whole" => Self::Whole,
            "decimal" => Self::Decimal,
            "list" => Self::List,
            "date" => Self::Date,
            "time" => Self::Time,
            "textLength" => Self::TextLength,
            "custom" => Self::Custom,
            _ => Self::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ValidationOperator {
    pub fn from_xml(value: &str) -> Self {
        match value {
            "notBetween" => Self::NotBetween,
            "equal" => Self::Equal,
            "notEqual" => Self::NotEqual,
            "greaterThan" => Self::GreaterThan,
            "greaterThanOrEqual" => Self::GreaterThanOrEqual,
            "lessThan" => Self::LessThan,
            "lessThanOrEqual" => Self::LessThanOrEqual,
            _ => Self::Between,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStyle {
    #[default]
    Stop,
    Warning,
    Information,
}

impl ErrorStyle {
    pub fn from_xml(value: &str) -> Self {
        match value {
            "warning" => Self::Warning,
            "information" => Self::Information,
            _ => Self::Stop,
        }
    }
}

/// A data validation rule over one or more ranges
///
/// Formulas are stored without their leading `=`. For a list rule
/// `formula1` is the source of the dropdown values.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub kind: ValidationKind,
    pub operator: ValidationOperator,
    pub formula1: String,
    pub formula2: Option<String>,
    pub ranges: Vec<CellRange>,
    pub allow_blank: bool,
    /// In-cell arrow for list rules
    pub show_dropdown: bool,
    pub show_input: bool,
    pub show_error: bool,
    pub error_style: ErrorStyle,
    pub prompt_title: Option<String>,
    pub prompt: Option<String>,
    pub error_title: Option<String>,
    pub error: Option<String>,
}

impl Validation {
    pub fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            operator: ValidationOperator::default(),
            formula1: String::new(),
            formula2: None,
            ranges: Vec::new(),
            allow_blank: true,
            show_dropdown: true,
            show_input: true,
            show_error: true,
            error_style: ErrorStyle::default(),
            prompt_title: None,
            prompt: None,
            error_title: None,
            error: None,
        }
    }

    /// Dropdown whose values come from `source`
    pub fn list(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            formula1: source.trim_start_matches('=').to_string(),
            ..Self::new(ValidationKind::List)
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind == ValidationKind::List
    }

    /// Add a single cell, merging it into a vertical run when adjacent
    pub fn add_cell(&mut self, cell: CellRef) {
        if let Some(last) = self.ranges.last_mut() {
            if last.first.col == cell.col
                && last.last.col == cell.col
                && last.last.row + 1 == cell.row
            {
                last.last = cell;
                return;
            }
        }
        self.ranges.push(CellRange::single(cell));
    }

    pub fn covers(&self, cell: CellRef) -> bool {
        self.ranges.iter().any(|r| r.contains(cell))
    }

    /// Space-separated range list, as written to `sqref`
    pub fn sqref(&self) -> String {
        self.ranges
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A workbook or sheet scoped name such as `FeeRate`
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    pub name: String,
    /// Owning sheet for a local name; `None` for workbook scope
    pub scope: Option<String>,
    /// Referenced range or formula, without leading `=`
    pub formula: String,
}

impl DefinedName {
    pub fn global(name: impl Into<String>, formula: impl Into<String>) -> Self {
        let formula = formula.into();
        Self {
            name: name.into(),
            scope: None,
            formula: formula.trim_start_matches('=').to_string(),
        }
    }

    /// Excel reserved names (`_xlnm.Print_Area`, filters) are rebuilt by the writer
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("_xlnm.")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

//==============================================================================
// Sheets
//==============================================================================

/// A named grid of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub cells: BTreeMap<CellRef, CellValue>,
    pub styles: BTreeMap<CellRef, CellStyle>,
    /// 0-based column index → width in character units
    pub column_widths: BTreeMap<u16, f64>,
    pub validations: Vec<Validation>,
    pub merges: Vec<CellRange>,
    pub visibility: Visibility,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            styles: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            validations: Vec::new(),
            merges: Vec::new(),
            visibility: Visibility::Visible,
        }
    }

    /// Value at an A1 address; `Empty` when unset
    pub fn get(&self, address: &str) -> PatchResult<&CellValue> {
        let cell = CellRef::parse(address)?;
        Ok(self.get_at(cell))
    }

    pub fn get_at(&self, cell: CellRef) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&cell).unwrap_or(&EMPTY)
    }

    /// Write a value at an A1 address, replacing what was there
    pub fn set(&mut self, address: &str, value: impl Into<CellValue>) -> PatchResult<()> {
        let cell = CellRef::parse(address)?;
        self.set_at(cell, value);
        Ok(())
    }

    pub fn set_at(&mut self, cell: CellRef, value: impl Into<CellValue>) {
        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, value);
        }
    }

    /// Write formula text at an A1 address
    pub fn set_formula(&mut self, address: &str, formula: impl Into<String>) -> PatchResult<()> {
        self.set(address, CellValue::formula(formula))
    }

    pub fn clear(&mut self, cell: CellRef) {
        self.cells.remove(&cell);
        self.styles.remove(&cell);
    }

    pub fn set_style(&mut self, address: &str, style: CellStyle) -> PatchResult<()> {
        let cell = CellRef::parse(address)?;
        self.styles.insert(cell, style);
        Ok(())
    }

    pub fn style_at(&self, cell: CellRef) -> Option<&CellStyle> {
        self.styles.get(&cell)
    }

    /// Set a column width by letter (`A`, `B`, ...)
    pub fn set_column_width(&mut self, column: &str, width: f64) -> PatchResult<()> {
        let col = crate::excel::address::column_index(column)
            .ok_or_else(|| PatchError::Address(column.to_string()))?;
        self.column_widths.insert(col, width);
        Ok(())
    }

    pub fn add_validation(&mut self, validation: Validation) {
        self.validations.push(validation);
    }

    /// Cells whose formula or text contains `needle`, in row-major order
    pub fn find(&self, needle: &str) -> Vec<(CellRef, &CellValue)> {
        self.cells
            .iter()
            .filter(|(_, v)| v.contains(needle))
            .map(|(c, v)| (*c, v))
            .collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

//==============================================================================
// Workbook
//==============================================================================

/// Ordered collection of uniquely named sheets plus the workbook's names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    pub defined_names: Vec<DefinedName>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> PatchResult<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| PatchError::MissingSheet(name.to_string()))
    }

    pub fn sheet_mut(&mut self, name: &str) -> PatchResult<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| PatchError::MissingSheet(name.to_string()))
    }

    /// Append a sheet, replacing any existing sheet of the same name in place
    pub fn push(&mut self, sheet: Sheet) {
        match self.position(&sheet.name) {
            Some(idx) => self.sheets[idx] = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Insert a new sheet at `index`, removing any previous sheet of that name
    pub fn insert(&mut self, index: usize, sheet: Sheet) {
        self.remove(&sheet.name);
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, sheet);
    }

    /// Create an empty sheet at the end and return it
    pub fn create_sheet(&mut self, name: &str) -> &mut Sheet {
        self.remove(name);
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn remove(&mut self, name: &str) -> Option<Sheet> {
        self.position(name).map(|idx| self.sheets.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_gets_leading_equals() {
        assert_eq!(
            CellValue::formula("SUM(A1:A3)"),
            CellValue::Formula("=SUM(A1:A3)".to_string())
        );
        assert_eq!(
            CellValue::formula("=B5*2"),
            CellValue::Formula("=B5*2".to_string())
        );
    }

    #[test]
    fn test_sheet_set_replaces_value() {
        let mut sheet = Sheet::new("Inputs");
        sheet.set("B26", 0.005).unwrap();
        sheet.set("B26", 0.0001).unwrap();
        assert_eq!(sheet.get("B26").unwrap(), &CellValue::Number(0.0001));
        assert_eq!(sheet.cell_count(), 1);
        assert!(sheet.get("B25").unwrap().is_empty());
    }

    #[test]
    fn test_validation_merges_adjacent_rows() {
        let mut dv = Validation::list("=XAUconfig!$B$6:$BI$6");
        for row in [1u32, 2, 3, 5, 6] {
            dv.add_cell(CellRef::new(row, 1));
        }
        assert!(dv.is_list());
        assert_eq!(dv.formula1, "XAUconfig!$B$6:$BI$6");
        assert_eq!(dv.sqref(), "B2:B4 B6:B7");
        assert!(dv.covers(CellRef::parse("B3").unwrap()));
        assert!(!dv.covers(CellRef::parse("B5").unwrap()));
    }

    #[test]
    fn test_workbook_insert_replaces_and_orders() {
        let mut wb = Workbook::new();
        wb.push(Sheet::new("Inputs"));
        wb.push(Sheet::new("Mine Inventory"));
        wb.insert(0, Sheet::new("Model Health"));
        wb.create_sheet("XAUconfig");
        assert_eq!(
            wb.sheet_names(),
            vec!["Model Health", "Inputs", "Mine Inventory", "XAUconfig"]
        );

        let mut fresh = Sheet::new("Model Health");
        fresh.set("A1", "fresh").unwrap();
        wb.insert(0, fresh);
        assert_eq!(wb.len(), 4);
        assert_eq!(
            wb.sheet("Model Health").unwrap().get("A1").unwrap(),
            &CellValue::text("fresh")
        );
        assert_eq!(wb.position("Model Health"), Some(0));
    }

    #[test]
    fn test_empty_value_display() {
        assert_eq!(CellValue::Empty.to_string(), "(empty)");
        assert_eq!(format!("{} → {}", CellValue::Empty, "Jan '26"), "(empty) → Jan '26");
    }

    #[test]
    fn test_validation_attributes_from_xml() {
        assert_eq!(ValidationKind::from_xml("whole"), ValidationKind::Whole);
        assert_eq!(ValidationKind::from_xml("none"), ValidationKind::Any);
        assert_eq!(
            ValidationOperator::from_xml("greaterThanOrEqual"),
            ValidationOperator::GreaterThanOrEqual
        );
        assert_eq!(ValidationOperator::from_xml(""), ValidationOperator::Between);
        assert_eq!(ErrorStyle::from_xml("warning"), ErrorStyle::Warning);
    }

    #[test]
    fn test_defined_name_strips_equals() {
        let name = DefinedName::global("FeeRate", "=Inputs!$B$26");
        assert_eq!(name.formula, "Inputs!$B$26");
        assert!(!name.is_builtin());
        assert!(DefinedName::global("_xlnm.Print_Area", "Inputs!$A$1:$D$9").is_builtin());
    }

    #[test]
    fn test_missing_sheet_is_error() {
        let wb = Workbook::new();
        assert!(matches!(
            wb.sheet("Inputs"),
            Err(PatchError::MissingSheet(name)) if name == "Inputs"
        ));
    }
}
