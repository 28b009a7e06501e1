//! Raw access to the parts of an .xlsx package
//!
//! calamine covers values and formulas. Names with their scope, styles and
//! validations are read here, straight from the XML parts.

use crate::error::PatchResult;
use crate::types::DefinedName;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) struct Package<R> {
    archive: ZipArchive<R>,
}

/// A worksheet and the zip path of its XML part
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub part: String,
}

/// What `xl/workbook.xml` says about sheets and names
#[derive(Debug, Default)]
pub(crate) struct WorkbookPart {
    pub sheets: Vec<SheetEntry>,
    pub names: Vec<DefinedName>,
}

impl WorkbookPart {
    pub fn part_of(&self, sheet: &str) -> Option<&str> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .map(|s| s.part.as_str())
    }
}

impl Package<File> {
    pub fn open(path: &Path) -> PatchResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            archive: ZipArchive::new(file)?,
        })
    }
}

impl<R: Read + Seek> Package<R> {
    pub fn read_part(&mut self, name: &str) -> PatchResult<String> {
        let mut file = self.archive.by_name(name)?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        Ok(xml)
    }

    /// `None` when the part is absent from the package
    pub fn read_optional(&mut self, name: &str) -> PatchResult<Option<String>> {
        match self.read_part(name) {
            Ok(xml) => Ok(Some(xml)),
            Err(crate::error::PatchError::Archive(ZipError::FileNotFound)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn workbook(&mut self) -> PatchResult<WorkbookPart> {
        let workbook_xml = self.read_part("xl/workbook.xml")?;
        let rels_xml = self.read_part("xl/_rels/workbook.xml.rels")?;
        let targets = parse_relationships(&rels_xml)?;
        let (entries, names) = parse_workbook(&workbook_xml)?;

        let sheets = entries
            .into_iter()
            .filter_map(|(name, rel_id)| {
                let target = targets.get(&rel_id)?;
                Some(SheetEntry {
                    name,
                    part: resolve_target(target),
                })
            })
            .collect();

        Ok(WorkbookPart { sheets, names })
    }
}

/// `worksheets/sheet1.xml` → `xl/worksheets/sheet1.xml`; absolute targets drop the `/`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => format!("xl/{}", target),
    }
}

pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> PatchResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key || attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// `"1"`/`"true"` attributes; `default` when absent
pub(crate) fn flag(element: &BytesStart<'_>, key: &[u8], default: bool) -> PatchResult<bool> {
    Ok(attribute(element, key)?
        .map(|v| v == "1" || v == "true")
        .unwrap_or(default))
}

/// `(sheet name, relationship id)` in workbook order, and the defined names
fn parse_workbook(xml: &str) -> PatchResult<(Vec<(String, String)>, Vec<DefinedName>)> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    // (name, localSheetId, formula)
    let mut raw_names: Vec<(String, Option<usize>, String)> = Vec::new();
    let mut in_name = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name")?;
                let id = attribute(&e, b"r:id")?.or(attribute(&e, b"id")?);
                if let (Some(name), Some(id)) = (name, id) {
                    entries.push((name, id));
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"definedName" => {
                if let Some(name) = attribute(&e, b"name")? {
                    let local = attribute(&e, b"localSheetId")?.and_then(|id| id.parse().ok());
                    raw_names.push((name, local, String::new()));
                    in_name = true;
                }
            }
            Event::Text(t) if in_name => {
                if let Some((_, _, formula)) = raw_names.last_mut() {
                    formula.push_str(&t.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                in_name = false;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let names = raw_names
        .into_iter()
        .map(|(name, local, formula)| DefinedName {
            name,
            scope: local.and_then(|i| entries.get(i)).map(|(sheet, _)| sheet.clone()),
            formula: formula.trim().trim_start_matches('=').to_string(),
        })
        .collect();

    Ok((entries, names))
}

fn parse_relationships(xml: &str) -> PatchResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Inputs" sheetId="1" r:id="rId1"/>
    <sheet name="Mine Inventory" sheetId="2" state="hidden" r:id="rId2"/>
  </sheets>
  <definedNames>
    <definedName name="FeeRate">Inputs!$B$26</definedName>
    <definedName name="Mines" localSheetId="1">'Mine Inventory'!$A$2:$A$13</definedName>
  </definedNames>
</workbook>"#;

    #[test]
    fn test_sheet_entries_and_relationships() {
        let rels = r#"<Relationships>
  <Relationship Id="rId1" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Target="/xl/worksheets/sheet2.xml"/>
</Relationships>"#;

        let (entries, _) = parse_workbook(WORKBOOK).unwrap();
        assert_eq!(
            entries,
            vec![
                ("Inputs".to_string(), "rId1".to_string()),
                ("Mine Inventory".to_string(), "rId2".to_string()),
            ]
        );

        let targets = parse_relationships(rels).unwrap();
        assert_eq!(resolve_target(&targets["rId1"]), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_target(&targets["rId2"]), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_defined_names_keep_scope() {
        let (_, names) = parse_workbook(WORKBOOK).unwrap();

        assert_eq!(names.len(), 2);
        assert_eq!(names[0], DefinedName::global("FeeRate", "Inputs!$B$26"));
        assert_eq!(names[1].name, "Mines");
        assert_eq!(names[1].scope.as_deref(), Some("Mine Inventory"));
        assert_eq!(names[1].formula, "'Mine Inventory'!$A$2:$A$13");
    }
}
