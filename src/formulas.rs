//! Formula text builders
//!
//! Every function returns the exact text written to a cell. Nothing here
//! evaluates a formula; the output is an opaque templated string built from
//! cell coordinates and month offsets.

/// Sheet holding the month timeline
pub const TIMELINE_SHEET: &str = "XAUconfig";
/// Mine schedule sheet
pub const MINE_SHEET: &str = "Mine Inventory";
/// Column holding each mine's month offset
pub const OFFSET_COLUMN: &str = "AO";
/// First and last mine rows (1-based)
pub const MINE_FIRST_ROW: u32 = 2;
pub const MINE_LAST_ROW: u32 = 13;
/// Absolute reference to the unitization fee
pub const UNITIZATION_FEE_REF: &str = "Inputs!$B$26";

/// Timeline row with gold prices
pub const PRICE_ROW: u32 = 3;
/// Timeline row with month labels
pub const LABEL_ROW: u32 = 4;
/// Timeline row feeding the dropdown
pub const DROPDOWN_ROW: u32 = 6;

/// Quote a sheet name for use in a reference when it needs it
pub fn sheet_ref(sheet: &str) -> String {
    let plain = sheet
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if plain && !sheet.is_empty() {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// Absolute mine column range: `'Mine Inventory'!$F$2:$F$13`
pub fn mine_range(column: &str) -> String {
    format!(
        "{}!${col}${}:${col}${}",
        sheet_ref(MINE_SHEET),
        MINE_FIRST_ROW,
        MINE_LAST_ROW,
        col = column
    )
}

/// Absolute timeline row range: `XAUconfig!$B$4:$BI$4`
pub fn timeline_row_range(row: u32, first_col: &str, last_col: &str) -> String {
    format!(
        "{}!${}${row}:${}${row}",
        TIMELINE_SHEET,
        first_col,
        last_col,
        row = row
    )
}

/// Month header linked to the timeline: `=XAUconfig!C4`
pub fn header_link(col: &str) -> String {
    format!("={}!{}{}", TIMELINE_SHEET, col, LABEL_ROW)
}

/// Gold price cell for a month column: `XAUconfig!C3`
pub fn price_ref(col: &str) -> String {
    format!("{}!{}{}", TIMELINE_SHEET, col, PRICE_ROW)
}

/// 0-based offset of the date picked in `B<row>`
pub fn match_offset(row: u32, first_col: &str, last_col: &str) -> String {
    format!(
        "=IFERROR(MATCH(B{row},{},0)-1,\"\")",
        timeline_row_range(LABEL_ROW, first_col, last_col),
        row = row
    )
}

/// Number of mines onboarding at `offset`
pub fn countif_offset(offset: u16) -> String {
    format!("=COUNTIF({},{})", mine_range(OFFSET_COLUMN), offset)
}

/// Sum of a mine column over mines onboarding at `offset`
pub fn sumif_offset(offset: u16, source_col: &str) -> String {
    format!(
        "=SUMIF({},{},{})",
        mine_range(OFFSET_COLUMN),
        offset,
        mine_range(source_col)
    )
}

/// `SUMPRODUCT` body selecting mines at `offset` and multiplying the given columns
pub fn sumproduct_offset(offset: u16, columns: &[&str]) -> String {
    let mut terms = vec![format!("({}={})", mine_range(OFFSET_COLUMN), offset)];
    terms.extend(columns.iter().map(|c| format!("({})", mine_range(c))));
    format!("SUMPRODUCT({})", terms.join("*"))
}

/// `=<col><row>*Inputs!$B$26`
pub fn fee_of(col: &str, row: u32) -> String {
    format!("={}{}*{}", col, row, UNITIZATION_FEE_REF)
}

/// `=<col><row>*XAUconfig!<col>3`
pub fn dollars_of(col: &str, row: u32) -> String {
    format!("={}{}*{}", col, row, price_ref(col))
}

/// Running total from the first month column: `=SUM($B$4:E4)`
pub fn cumulative_sum(first_col: &str, col: &str, row: u32) -> String {
    format!("=SUM(${}${row}:{}{row})", first_col, col, row = row)
}

/// Sum along one row between two columns: `=SUM(N3:Y3)`
pub fn row_sum(first_col: &str, last_col: &str, row: u32) -> String {
    format!("=SUM({}{row}:{}{row})", first_col, last_col, row = row)
}

/// Sum down one column between two rows: `=SUM(C3:C15)`
pub fn column_sum(col: &str, first_row: u32, last_row: u32) -> String {
    format!("=SUM({col}{}:{col}{})", first_row, last_row, col = col)
}

/// Plain cross-sheet reference: `='Resource Supply (5yr)'!C11`
pub fn cell_link(sheet: &str, col: &str, row: u32) -> String {
    format!("={}!{}{}", sheet_ref(sheet), col, row)
}

/// Dashboard check comparing a cell with a constant
pub fn pass_fail(cell: &str, expected: f64, failure: &str) -> String {
    format!("=IF({}={},\"✓ PASS\",\"{}\")", cell, expected, failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_ref_quotes_when_needed() {
        assert_eq!(sheet_ref("XAUconfig"), "XAUconfig");
        assert_eq!(sheet_ref("Inputs"), "Inputs");
        assert_eq!(sheet_ref("Mine Inventory"), "'Mine Inventory'");
        assert_eq!(sheet_ref("Resource Supply (5yr)"), "'Resource Supply (5yr)'");
        assert_eq!(sheet_ref("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_match_offset() {
        assert_eq!(
            match_offset(2, "B", "BI"),
            "=IFERROR(MATCH(B2,XAUconfig!$B$4:$BI$4,0)-1,\"\")"
        );
    }

    #[test]
    fn test_countif_and_sumif() {
        assert_eq!(
            countif_offset(0),
            "=COUNTIF('Mine Inventory'!$AO$2:$AO$13,0)"
        );
        assert_eq!(
            sumif_offset(7, "M"),
            "=SUMIF('Mine Inventory'!$AO$2:$AO$13,7,'Mine Inventory'!$M$2:$M$13)"
        );
    }

    #[test]
    fn test_sumproduct_offset() {
        assert_eq!(
            sumproduct_offset(3, &["Q", "AE"]),
            "SUMPRODUCT(('Mine Inventory'!$AO$2:$AO$13=3)*('Mine Inventory'!$Q$2:$Q$13)*('Mine Inventory'!$AE$2:$AE$13))"
        );
    }

    #[test]
    fn test_simple_builders() {
        assert_eq!(header_link("C"), "=XAUconfig!C4");
        assert_eq!(fee_of("B", 5), "=B5*Inputs!$B$26");
        assert_eq!(dollars_of("D", 4), "=D4*XAUconfig!D3");
        assert_eq!(cumulative_sum("B", "E", 4), "=SUM($B$4:E4)");
        assert_eq!(row_sum("N", "Y", 3), "=SUM(N3:Y3)");
        assert_eq!(column_sum("C", 3, 15), "=SUM(C3:C15)");
        assert_eq!(
            cell_link("Resource Supply (5yr)", "C", 11),
            "='Resource Supply (5yr)'!C11"
        );
        assert_eq!(
            pass_fail("Inputs!B26", 0.0001, "✗ FAIL"),
            "=IF(Inputs!B26=0.0001,\"✓ PASS\",\"✗ FAIL\")"
        );
    }
}
