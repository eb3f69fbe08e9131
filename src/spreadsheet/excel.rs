//! Workbook-level parts shared by every worksheet: relationships, date system and number formats
use crate::error::Gl860Error;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

/// An `.xlsx` container read from memory
pub(crate) type Workbook<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Compound File Binary signature. Password-protected `.xlsx` files and legacy `.xls`
/// workbooks start with it instead of a ZIP header.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PATH: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PATH: &str = "xl/styles.xml";

const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_SHEET: QName = QName(b"sheet");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");

/// Opens the ZIP container of a workbook held in memory.
///
/// # Errors
/// `SpreadsheetEncryptedError` when the bytes are a compound file, ZIP errors otherwise.
pub(super) fn open<'a>(file_name: &str, bytes: &'a [u8]) -> Result<Workbook<'a>, Gl860Error> {
    if bytes.starts_with(&CFB_SIGNATURE) {
        Err(SpreadsheetError::SpreadsheetEncryptedError(file_name.to_owned()))?
    }
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Lists the worksheets in workbook order as `(name, zip path)` pairs and reports whether
/// the workbook uses the 1904 date system.
pub(super) fn load_workbook(
    zip: &mut Workbook<'_>,
    file_name: &str,
) -> Result<(Vec<(String, String)>, bool), Gl860Error> {
    let relationships = load_relationships(zip, file_name)?;
    let mut reader = zip
        .xml_reader(WORKBOOK_PATH)?
        .ok_or_else(|| SpreadsheetError::FileError(file_name.to_owned(), WORKBOOK_PATH.to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.get_value()?),
                    b"id" => id = Some(attribute.get_value()?),
                    _ => (),
                }
            }
            if let Some(path) = id.and_then(|id| relationships.get(id.as_ref())) {
                if let Some(name) = name {
                    sheets.push((name.into_owned(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event
                .get_attribute_value("date1904")?
                .is_some_and(|value| value == "1" || value == "true");
        }
    });
    Ok((sheets, is_1904))
}

/// Maps worksheet relationship IDs to their ZIP paths.
fn load_relationships(zip: &mut Workbook<'_>, file_name: &str) -> Result<HashMap<String, String>, Gl860Error> {
    let mut reader = zip.xml_reader(WORKBOOK_RELATIONSHIPS_PATH)?.ok_or_else(|| {
        SpreadsheetError::FileError(file_name.to_owned(), WORKBOOK_RELATIONSHIPS_PATH.to_owned())
    })?;
    let mut relationships = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.is_none_or(|kind| kind.ends_with("/worksheet")) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.into_owned(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves the number format of every cell style (`cellXfs` entry) to a cell type.
/// Workbooks without `styles.xml` give an empty list, so every number stays plain.
pub(super) fn load_number_formats(zip: &mut Workbook<'_>, is_1904: bool) -> Result<Vec<CellType>, Gl860Error> {
    let mut reader = match zip.xml_reader(STYLES_PATH)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut in_custom_formats = false;
    let mut in_format_indexes = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = false,
        Event::Start(event) if in_custom_formats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.into_owned(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = false,
        Event::Start(event) if in_format_indexes && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or(Cow::Borrowed("0"));
            format_indexes.push(id.into_owned());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

/// Normalizes a relationship target to a path inside the ZIP archive.
pub(crate) fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}
