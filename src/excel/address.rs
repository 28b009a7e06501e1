//! A1-style cell addressing
//!
//! Rows and columns are 0-based internally (the same convention as
//! `rust_xlsxwriter` and `calamine`) and 1-based / lettered when printed.

use crate::error::{PatchError, PatchResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Convert a 0-based column index to its letter form
///
/// Examples:
/// - 0 → A
/// - 25 → Z
/// - 26 → AA
/// - 40 → AO
pub fn column_letter(index: u16) -> String {
    let mut result = String::new();
    let mut idx = index as usize;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Convert a column letter (case-insensitive) back to its 0-based index
pub fn column_index(letters: &str) -> Option<u16> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut value: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        value = value * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    // XFD is the last column a worksheet can hold
    if value == 0 || value > 16_384 {
        return None;
    }
    Some((value - 1) as u16)
}

fn a1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("static A1 pattern compiles")
    })
}

/// A single cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse `B26`, `$AO$2` or `ao2`
    pub fn parse(text: &str) -> PatchResult<Self> {
        let caps = a1_pattern()
            .captures(text.trim())
            .ok_or_else(|| PatchError::Address(text.to_string()))?;

        let col = column_index(&caps[1]).ok_or_else(|| PatchError::Address(text.to_string()))?;
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| PatchError::Address(text.to_string()))?;
        if row == 0 || row > 1_048_576 {
            return Err(PatchError::Address(text.to_string()));
        }

        Ok(Self { row: row - 1, col })
    }

    /// Column letter of this cell
    pub fn column(&self) -> String {
        column_letter(self.col)
    }

    /// 1-based row number as shown in a spreadsheet
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column(), self.row_number())
    }
}

/// A rectangular block of cells (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    pub fn new(first: CellRef, last: CellRef) -> Self {
        Self {
            first: CellRef::new(first.row.min(last.row), first.col.min(last.col)),
            last: CellRef::new(first.row.max(last.row), first.col.max(last.col)),
        }
    }

    pub fn single(cell: CellRef) -> Self {
        Self {
            first: cell,
            last: cell,
        }
    }

    /// Parse `B2`, `B2:B13` or `$B$6:$BI$6`
    pub fn parse(text: &str) -> PatchResult<Self> {
        match text.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellRef::parse(a)?, CellRef::parse(b)?)),
            None => Ok(Self::single(CellRef::parse(text)?)),
        }
    }

    /// Parse a space-separated `sqref` list as stored in sheet XML
    pub fn parse_list(text: &str) -> PatchResult<Vec<Self>> {
        text.split_whitespace().map(Self::parse).collect()
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.first.row
            && cell.row <= self.last.row
            && cell.col >= self.first.col
            && cell.col <= self.last.col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(40), "AO");
        assert_eq!(column_letter(60), "BI");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(16_383), "XFD");
    }

    #[test]
    fn test_column_index_inverts_letter() {
        for idx in [0u16, 1, 25, 26, 40, 60, 701, 702, 16_383] {
            assert_eq!(column_index(&column_letter(idx)), Some(idx));
        }
        assert_eq!(column_index("ao"), Some(40));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index("XFE"), None);
    }

    #[test]
    fn test_parse_cell() {
        let cell = CellRef::parse("B26").unwrap();
        assert_eq!(cell, CellRef::new(25, 1));
        assert_eq!(cell.to_string(), "B26");

        let abs = CellRef::parse("$AO$2").unwrap();
        assert_eq!(abs, CellRef::new(1, 40));
    }

    #[test]
    fn test_parse_cell_rejects_garbage() {
        assert!(CellRef::parse("B0").is_err());
        assert!(CellRef::parse("26B").is_err());
        assert!(CellRef::parse("Inputs!B26").is_err());
    }

    #[test]
    fn test_parse_range_list() {
        let ranges = CellRange::parse_list("B2:B5 B7 B9:B12").unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].to_string(), "B2:B5");
        assert_eq!(ranges[1].to_string(), "B7");
        assert!(ranges[2].contains(CellRef::parse("B10").unwrap()));
        assert!(!ranges[2].contains(CellRef::parse("C10").unwrap()));
    }
}
