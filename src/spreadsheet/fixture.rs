//! In-memory workbook builders for tests.

use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetFormat;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use quick_xml::escape::escape;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One cell of a fixture sheet.
#[derive(Clone, Debug)]
pub(crate) enum Entry<'a> {
    Text(&'a str),
    Number(&'a str),
    /// `YYYY-MM-DD`
    Date(&'a str),
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime(&'a str),
    Boolean(bool),
    Error(&'a str),
    Blank,
}

pub(crate) type FixtureSheet<'a> = (&'a str, Vec<Vec<Entry<'a>>>);

/// Builds a zip archive from (path, content) pairs.
pub(crate) fn zip(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = ZipWriter::new(&mut buffer);
    for (path, content) in parts {
        writer.start_file(*path, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    buffer.into_inner()
}

/// Builds a workbook of the given format.
pub(crate) fn workbook(format: SpreadsheetFormat, sheets: &[FixtureSheet]) -> Vec<u8> {
    match format {
        SpreadsheetFormat::Xlsx | SpreadsheetFormat::Xlsm => xlsx(sheets),
        SpreadsheetFormat::Ods => ods(sheets),
    }
}

/// Builds an xlsx package. Text goes through the shared string table; style 1 is a
/// date format and style 2 a date-time format.
pub(crate) fn xlsx(sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut shared_strings = Vec::<String>::new();
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#,
    );
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    let mut worksheets = Vec::<(String, String)>::new();
    for (index, (name, rows)) in sheets.iter().enumerate() {
        let number = index + 1;
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#,
            escape(*name)
        ));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
        ));

        let mut worksheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (row, entries) in rows.iter().enumerate() {
            worksheet.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, entry) in entries.iter().enumerate() {
                let reference = index_to_reference(row, col);
                let cell = match entry {
                    Entry::Text(text) => {
                        shared_strings.push(text.to_string());
                        format!(r#"<c r="{reference}" t="s"><v>{}</v></c>"#, shared_strings.len() - 1)
                    }
                    Entry::Number(number) => format!(r#"<c r="{reference}"><v>{number}</v></c>"#),
                    Entry::Date(date) => format!(r#"<c r="{reference}" s="1"><v>{}</v></c>"#, serial(date)),
                    Entry::DateTime(datetime) => {
                        format!(r#"<c r="{reference}" s="2"><v>{}</v></c>"#, serial(datetime))
                    }
                    Entry::Boolean(value) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value)),
                    Entry::Error(error) => format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(*error)),
                    Entry::Blank => continue,
                };
                worksheet.push_str(&cell);
            }
            worksheet.push_str("</row>");
        }
        worksheet.push_str("</sheetData></worksheet>");
        worksheets.push((format!("xl/worksheets/sheet{number}.xml"), worksheet));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    let mut strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        shared_strings.len()
    );
    for string in &shared_strings {
        strings.push_str(&format!("<si><t>{}</t></si>", escape(string.as_str())));
    }
    strings.push_str("</sst>");

    let styles = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm:ss"/></numFmts><cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/><xf numFmtId="164" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    let mut parts: Vec<(&str, &str)> = vec![
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", relationships.as_str()),
        ("xl/styles.xml", styles),
        ("xl/sharedStrings.xml", strings.as_str()),
    ];
    for (path, worksheet) in &worksheets {
        parts.push((path.as_str(), worksheet.as_str()));
    }
    zip(&parts)
}

/// Builds an OpenDocument spreadsheet.
pub(crate) fn ods(sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0" office:version="1.3"><office:body><office:spreadsheet>"#,
    );
    for (name, rows) in sheets {
        content.push_str(&format!(r#"<table:table table:name="{}">"#, escape(*name)));
        for entries in rows {
            content.push_str("<table:table-row>");
            for entry in entries {
                let cell = match entry {
                    Entry::Text(text) => format!(
                        r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                        escape(*text)
                    ),
                    Entry::Number(number) => format!(
                        r#"<table:table-cell office:value-type="float" office:value="{number}"><text:p>{number}</text:p></table:table-cell>"#
                    ),
                    Entry::Date(date) => format!(
                        r#"<table:table-cell office:value-type="date" office:date-value="{date}"><text:p>{date}</text:p></table:table-cell>"#
                    ),
                    Entry::DateTime(datetime) => format!(
                        r#"<table:table-cell office:value-type="date" office:date-value="{}"><text:p>{datetime}</text:p></table:table-cell>"#,
                        datetime.replace(' ', "T")
                    ),
                    Entry::Boolean(value) => format!(
                        r#"<table:table-cell office:value-type="boolean" office:boolean-value="{value}"><text:p>{value}</text:p></table:table-cell>"#
                    ),
                    Entry::Error(error) => format!(
                        r#"<table:table-cell office:value-type="string" calcext:value-type="error"><text:p>{}</text:p></table:table-cell>"#,
                        escape(*error)
                    ),
                    Entry::Blank => "<table:table-cell/>".to_owned(),
                };
                content.push_str(&cell);
            }
            content.push_str("</table:table-row>");
        }
        content.push_str("</table:table>");
    }
    content.push_str("</office:spreadsheet></office:body></office:document-content>");

    let manifest = r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

    zip(&[
        ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
        ("META-INF/manifest.xml", manifest),
        ("content.xml", content.as_str()),
    ])
}

/// Converts `YYYY-MM-DD[ HH:MM:SS]` to a 1900 date system serial number.
fn serial(text: &str) -> String {
    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_hms_opt(0, 0, 0).unwrap()))
        .unwrap();
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let seconds = (datetime - epoch).num_seconds();
    let (days, seconds) = (seconds / 86_400, seconds % 86_400);
    if seconds == 0 {
        days.to_string()
    } else {
        (days as f64 + seconds as f64 / 86_400f64).to_string()
    }
}
