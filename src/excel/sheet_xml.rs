//! Worksheet part details calamine does not expose
//!
//! One pass over `xl/worksheets/sheetN.xml` collects data validations of
//! every type, custom column widths and the style index of each cell.

use crate::error::PatchResult;
use crate::excel::address::{CellRange, CellRef};
use crate::excel::package::{attribute, flag};
use crate::types::{ErrorStyle, Validation, ValidationKind, ValidationOperator};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// `<col>` spans wider than this are sheet-wide defaults, not layout
const MAX_WIDTH_SPAN: u32 = 256;

#[derive(Debug, Default)]
pub(crate) struct SheetExtras {
    pub validations: Vec<Validation>,
    pub column_widths: BTreeMap<u16, f64>,
    /// `(cell, index into cellXfs)` for every cell with a non-zero `s`
    pub style_ids: Vec<(CellRef, usize)>,
}

#[derive(Clone, Copy, PartialEq)]
enum Text {
    None,
    Formula1,
    Formula2,
    Sqref,
}

pub(crate) fn parse_sheet(xml: &str) -> PatchResult<SheetExtras> {
    let mut reader = Reader::from_str(xml);
    let mut extras = SheetExtras::default();

    let mut current: Option<Validation> = None;
    let mut text = Text::None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let style = attribute(&e, b"s")?.and_then(|s| s.parse::<usize>().ok());
                if let (Some(r), Some(style)) = (attribute(&e, b"r")?, style) {
                    if style > 0 {
                        extras.style_ids.push((CellRef::parse(&r)?, style));
                    }
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"col" => {
                read_width(&e, &mut extras.column_widths)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"dataValidation" => {
                current = Some(start_rule(&e)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"dataValidation" => {
                extras.validations.push(start_rule(&e)?);
            }
            Event::Start(e) if current.is_some() => {
                text = match e.local_name().as_ref() {
                    b"formula1" => Text::Formula1,
                    b"formula2" => Text::Formula2,
                    // x14 extension rules carry the ranges as a child element
                    b"sqref" => Text::Sqref,
                    _ => text,
                };
            }
            Event::Text(t) if text != Text::None => {
                if let Some(rule) = current.as_mut() {
                    let value = t.unescape()?;
                    match text {
                        Text::Formula1 => rule.formula1.push_str(&value),
                        Text::Formula2 => rule.formula2.get_or_insert_with(String::new).push_str(&value),
                        Text::Sqref => rule.ranges.extend(CellRange::parse_list(value.trim())?),
                        Text::None => {}
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"formula1" | b"formula2" | b"sqref" => text = Text::None,
                b"dataValidation" => {
                    if let Some(mut rule) = current.take() {
                        rule.formula1 = rule.formula1.trim().to_string();
                        rule.formula2 = rule.formula2.map(|f| f.trim().to_string());
                        extras.validations.push(rule);
                    }
                    text = Text::None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(extras)
}

fn read_width(e: &BytesStart<'_>, widths: &mut BTreeMap<u16, f64>) -> PatchResult<()> {
    let number = |key: &[u8]| -> PatchResult<Option<u32>> {
        Ok(attribute(e, key)?.and_then(|v| v.parse().ok()))
    };
    let width: Option<f64> = attribute(e, b"width")?.and_then(|v| v.parse().ok());
    let (Some(min), Some(max), Some(width)) = (number(b"min")?, number(b"max")?, width) else {
        return Ok(());
    };
    if min == 0 || max < min || max - min >= MAX_WIDTH_SPAN || !flag(e, b"customWidth", false)? {
        return Ok(());
    }
    for col in min..=max {
        widths.insert((col - 1) as u16, width);
    }
    Ok(())
}

fn start_rule(e: &BytesStart<'_>) -> PatchResult<Validation> {
    let kind = attribute(e, b"type")?
        .map(|t| ValidationKind::from_xml(&t))
        .unwrap_or_default();
    let mut rule = Validation::new(kind);

    if let Some(sqref) = attribute(e, b"sqref")? {
        rule.ranges = CellRange::parse_list(&sqref)?;
    }
    if let Some(operator) = attribute(e, b"operator")? {
        rule.operator = ValidationOperator::from_xml(&operator);
    }
    if let Some(style) = attribute(e, b"errorStyle")? {
        rule.error_style = ErrorStyle::from_xml(&style);
    }
    rule.allow_blank = flag(e, b"allowBlank", false)?;
    // The attribute hides the in-cell arrow despite its name
    rule.show_dropdown = !flag(e, b"showDropDown", false)?;
    rule.show_input = flag(e, b"showInputMessage", false)?;
    rule.show_error = flag(e, b"showErrorMessage", false)?;
    rule.prompt_title = attribute(e, b"promptTitle")?;
    rule.prompt = attribute(e, b"prompt")?;
    rule.error_title = attribute(e, b"errorTitle")?;
    rule.error = attribute(e, b"error")?;

    Ok(rule)
}
