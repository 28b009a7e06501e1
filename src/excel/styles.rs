//! Cell formats from `xl/styles.xml`
//!
//! A cell's `s` attribute indexes `<cellXfs>`; each xf points at a number
//! format, a font and a fill. Only the parts the writer can reproduce are
//! kept: number format code, bold, italic, size, font color, solid fill.

use crate::error::PatchResult;
use crate::excel::package::{attribute, flag};
use crate::types::CellStyle;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
struct Font {
    bold: bool,
    italic: bool,
    size: Option<f64>,
    color: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Xf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StyleTable {
    num_formats: HashMap<u32, String>,
    fonts: Vec<Font>,
    fills: Vec<Option<u32>>,
    xfs: Vec<Xf>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    CellXfs,
    Other,
}

impl StyleTable {
    pub fn parse(xml: &str) -> PatchResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut table = StyleTable::default();
        let mut section = Section::Other;
        let mut solid = false;

        loop {
            let (e, is_start) = match reader.read_event()? {
                Event::Start(e) => (e, true),
                Event::Empty(e) => (e, false),
                Event::End(e) => {
                    match e.local_name().as_ref() {
                        b"numFmts" | b"fonts" | b"fills" | b"cellXfs" | b"cellStyleXfs" | b"dxfs" => {
                            section = Section::Other;
                        }
                        _ => {}
                    }
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            match (e.local_name().as_ref(), section) {
                (b"numFmts", _) if is_start => section = Section::NumFmts,
                (b"fonts", _) if is_start => section = Section::Fonts,
                (b"fills", _) if is_start => section = Section::Fills,
                (b"cellXfs", _) if is_start => section = Section::CellXfs,
                (b"cellStyleXfs", _) | (b"dxfs", _) if is_start => section = Section::Other,

                (b"numFmt", Section::NumFmts) => {
                    let id = attribute(&e, b"numFmtId")?.and_then(|v| v.parse().ok());
                    if let (Some(id), Some(code)) = (id, attribute(&e, b"formatCode")?) {
                        table.num_formats.insert(id, code);
                    }
                }

                (b"font", Section::Fonts) => table.fonts.push(Font::default()),
                (b"b", Section::Fonts) => {
                    if let Some(font) = table.fonts.last_mut() {
                        font.bold = flag(&e, b"val", true)?;
                    }
                }
                (b"i", Section::Fonts) => {
                    if let Some(font) = table.fonts.last_mut() {
                        font.italic = flag(&e, b"val", true)?;
                    }
                }
                (b"sz", Section::Fonts) => {
                    if let Some(font) = table.fonts.last_mut() {
                        font.size = attribute(&e, b"val")?.and_then(|v| v.parse().ok());
                    }
                }
                (b"color", Section::Fonts) => {
                    if let Some(font) = table.fonts.last_mut() {
                        font.color = rgb(&e)?;
                    }
                }

                (b"fill", Section::Fills) => {
                    table.fills.push(None);
                    solid = false;
                }
                (b"patternFill", Section::Fills) => {
                    solid = attribute(&e, b"patternType")?.as_deref() == Some("solid");
                }
                (b"fgColor", Section::Fills) if solid => {
                    let color = rgb(&e)?;
                    if let Some(fill) = table.fills.last_mut() {
                        *fill = color;
                    }
                }

                (b"xf", Section::CellXfs) => {
                    let number = |key: &[u8]| -> PatchResult<u32> {
                        Ok(attribute(&e, key)?.and_then(|v| v.parse().ok()).unwrap_or(0))
                    };
                    table.xfs.push(Xf {
                        num_fmt_id: number(b"numFmtId")?,
                        font_id: number(b"fontId")? as usize,
                        fill_id: number(b"fillId")? as usize,
                    });
                }
                _ => {}
            }
        }

        Ok(table)
    }

    /// Style for a cell's `s` index; `None` when it matches the workbook default
    pub fn style(&self, xf_index: usize) -> Option<CellStyle> {
        let xf = self.xfs.get(xf_index)?;
        let default_font = self.fonts.first().cloned().unwrap_or_default();
        let font = self.fonts.get(xf.font_id).cloned().unwrap_or_default();

        let style = CellStyle {
            bold: font.bold,
            italic: font.italic,
            font_size: font.size.filter(|size| Some(*size) != default_font.size),
            font_color: font.color,
            fill_color: self.fills.get(xf.fill_id).copied().flatten(),
            num_format: self.num_format(xf.num_fmt_id),
        };
        (!style.is_default()).then_some(style)
    }

    fn num_format(&self, id: u32) -> Option<String> {
        if id == 0 {
            return None;
        }
        self.num_formats
            .get(&id)
            .cloned()
            .or_else(|| builtin_format(id).map(str::to_string))
    }
}

/// `FFRRGGBB` / `RRGGBB` → RGB; theme and indexed colors are skipped
fn rgb(e: &BytesStart<'_>) -> PatchResult<Option<u32>> {
    Ok(attribute(e, b"rgb")?.and_then(|hex| {
        let digits = hex.get(hex.len().saturating_sub(6)..)?;
        u32::from_str_radix(digits, 16).ok()
    }))
}

/// Excel's built-in number formats that have no `<numFmt>` entry
pub(crate) fn builtin_format(id: u32) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "($#,##0_);($#,##0)",
        6 => "($#,##0_);[Red]($#,##0)",
        7 => "($#,##0.00_);($#,##0.00)",
        8 => "($#,##0.00_);[Red]($#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yyyy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yyyy h:mm",
        37 => "(#,##0_);(#,##0)",
        38 => "(#,##0_);[Red](#,##0)",
        39 => "(#,##0.00_);(#,##0.00)",
        40 => "(#,##0.00_);[Red](#,##0.00)",
        41 => r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#,
        42 => r#"_($* #,##0_);_($* \(#,##0\);_($* "-"_);_(@_)"#,
        43 => r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#,
        44 => r#"_($* #,##0.00_);_($* \(#,##0.00\);_($* "-"??_);_(@_)"#,
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0"/></numFmts>
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="16"/><color rgb="FF1F4E78"/><name val="Calibri"/></font>
    <font><b val="0"/><i/><sz val="11"/><color theme="1"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="2"/></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" xfId="0"/>
    <xf numFmtId="10" fontId="0" fillId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="164" fontId="1" fillId="2" xfId="0"/>
    <xf numFmtId="0" fontId="2" fillId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_default_xf_has_no_style() {
        let table = StyleTable::parse(STYLES).unwrap();
        assert_eq!(table.style(0), None);
        assert_eq!(table.style(9), None);
    }

    #[test]
    fn test_builtin_percentage_format() {
        let table = StyleTable::parse(STYLES).unwrap();
        let style = table.style(1).unwrap();
        assert_eq!(style.num_format.as_deref(), Some("0.00%"));
        assert!(!style.bold);
    }

    #[test]
    fn test_custom_format_font_and_fill() {
        let table = StyleTable::parse(STYLES).unwrap();
        let style = table.style(2).unwrap();

        assert_eq!(style.num_format.as_deref(), Some("\"$\"#,##0"));
        assert!(style.bold);
        assert_eq!(style.font_size, Some(16.0));
        assert_eq!(style.font_color, Some(0x1F4E78));
        assert_eq!(style.fill_color, Some(0xFFFF00));
    }

    #[test]
    fn test_explicit_false_bold_and_theme_color() {
        let table = StyleTable::parse(STYLES).unwrap();
        let style = table.style(3).unwrap();

        assert!(!style.bold);
        assert!(style.italic);
        assert_eq!(style.font_size, None);
        assert_eq!(style.font_color, None);
    }
}
