//! Builds small GL860-style `.xlsx` workbooks in memory.
#![allow(dead_code)]

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Style index of the `yyyy/mm/dd hh:mm:ss`-like built-in format 22.
const DATE_TIME_STYLE: usize = 1;

#[derive(Clone, Debug)]
pub enum Value {
    /// Shared string
    Text(String),
    /// Inline string
    Inline(String),
    Number(f64),
    /// Date-styled serial number
    DateTime(NaiveDateTime),
    /// `#N/A`-like error cell
    Error(String),
    Blank,
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}

pub fn number(value: f64) -> Value {
    Value::Number(value)
}

pub fn timestamp(value: &str) -> Value {
    Value::DateTime(parse_timestamp(value))
}

pub fn parse_timestamp(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn to_serial(timestamp: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap().and_hms_opt(0, 0, 0).unwrap();
    (timestamp - epoch).num_milliseconds() as f64 / 86_400_000.0
}

/// Rows of the first worksheet, in order, starting at `A1`.
#[derive(Clone, Debug, Default)]
pub struct WorkbookBuilder {
    rows: Vec<Vec<Value>>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn blank_row(self) -> Self {
        self.row(Vec::new())
    }

    /// A logger export: metadata, the `Data` marker, field names, units, then `readings`.
    pub fn gl860(units: &[&str], readings: Vec<Vec<Value>>) -> Self {
        let mut field_names = vec![text("NO."), text("Time")];
        let mut unit_row = vec![Value::Blank, Value::Blank];
        for (index, unit) in units.iter().enumerate() {
            field_names.push(text(&format!("CH{}", index + 1)));
            unit_row.push(text(unit));
        }

        let mut builder = WorkbookBuilder::new()
            .row(vec![text("Model"), text("GL860")])
            .row(vec![text("Measurement interval"), text("10min")])
            .blank_row()
            .row(vec![text("Data")])
            .row(field_names)
            .row(unit_row);
        for (index, values) in readings.into_iter().enumerate() {
            let mut row = vec![number((index + 1) as f64)];
            row.extend(values);
            builder = builder.row(row);
        }
        builder
    }

    pub fn build(&self) -> Vec<u8> {
        let mut shared_strings = Vec::<String>::new();
        let mut sheet_data = String::new();
        for (row_index, values) in self.rows.iter().enumerate() {
            sheet_data.push_str(&format!("<row r=\"{}\">", row_index + 1));
            for (col_index, value) in values.iter().enumerate() {
                let reference = format!("{}{}", column_name(col_index), row_index + 1);
                let cell = match value {
                    Value::Text(text) => {
                        shared_strings.push(text.to_owned());
                        format!("<c r=\"{}\" t=\"s\"><v>{}</v></c>", reference, shared_strings.len() - 1)
                    }
                    Value::Inline(text) => format!(
                        "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        reference,
                        escape(text)
                    ),
                    Value::Number(number) => format!("<c r=\"{}\"><v>{}</v></c>", reference, number),
                    Value::DateTime(timestamp) => format!(
                        "<c r=\"{}\" s=\"{}\"><v>{}</v></c>",
                        reference,
                        DATE_TIME_STYLE,
                        to_serial(*timestamp)
                    ),
                    Value::Error(error) => format!("<c r=\"{}\" t=\"e\"><v>{}</v></c>", reference, escape(error)),
                    Value::Blank => continue,
                };
                sheet_data.push_str(&cell);
            }
            sheet_data.push_str("</row>");
        }

        let shared_strings_xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{0}\" uniqueCount=\"{0}\">{1}</sst>",
            shared_strings.len(),
            shared_strings
                .iter()
                .map(|text| format!("<si><t>{}</t></si>", escape(text)))
                .collect::<String>()
        );
        let sheet_xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
             <sheetData>{}</sheetData></worksheet>",
            sheet_data
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES.to_owned()),
            ("_rels/.rels", ROOT_RELATIONSHIPS.to_owned()),
            ("xl/workbook.xml", WORKBOOK.to_owned()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELATIONSHIPS.to_owned()),
            ("xl/styles.xml", STYLES.to_owned()),
            ("xl/sharedStrings.xml", shared_strings_xml),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Writes the workbook to `dir/name` and returns its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn column_name(index: usize) -> String {
    let mut index = index + 1;
    let mut name = String::new();
    while index > 0 {
        let remainder = (index - 1) % 26;
        name.insert(0, (b'A' + remainder as u8) as char);
        index = (index - 1) / 26;
    }
    name
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// One reading of the full five-channel layout used by most tests.
pub fn full_reading(time: &str, temperature: f64) -> Vec<Value> {
    vec![
        timestamp(time),
        number(temperature),
        number(65.5),
        number(812.0),
        number(40250.0),
        number(temperature + 6.0),
    ]
}

pub const FULL_UNITS: [&str; 5] = ["degC", "%", "W/m2", "lux", "degC"];

/// A full export with `count` readings every ten minutes from the first of the month.
pub fn august_export(count: usize) -> WorkbookBuilder {
    let start = parse_timestamp("2025-08-01 00:00:00");
    let readings = (0..count)
        .map(|index| {
            let time = start + chrono::Duration::minutes(10 * index as i64);
            full_reading(&time.format("%Y-%m-%d %H:%M:%S").to_string(), 20.0 + index as f64)
        })
        .collect();
    WorkbookBuilder::gl860(&FULL_UNITS, readings)
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
</Types>";

const ROOT_RELATIONSHIPS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

const WORKBOOK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<sheets><sheet name=\"GL860\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>";

const WORKBOOK_RELATIONSHIPS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>\
</Relationships>";

const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
<cellXfs count=\"2\"><xf numFmtId=\"0\"/><xf numFmtId=\"22\" applyNumberFormat=\"1\"/></cellXfs>\
</styleSheet>";
