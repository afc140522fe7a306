use crate::error::ReadError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::SpreadsheetReader;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const CONTENT_PATH: &str = "content.xml";
const MANIFEST_PATH: &str = "META-INF/manifest.xml";
/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");
const MANIFEST_FILE_ENTRY: QName = QName(b"manifest:file-entry");
const MANIFEST_ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// Error types specific to ODS spreadsheet processing
#[derive(Error, Debug)]
pub(crate) enum OdsError {
    /// Invalid ODS MIME type detected in file
    #[error("Invalid ODS MIME type")]
    MimeTypeError,

    #[error("Table without a name")]
    SheetNameError,
}

/// An OpenDocument spreadsheet held in memory.
pub(crate) struct OdsSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<SpreadsheetReader>,
}

impl OdsSpreadsheet {
    /// Opens the package, validating its MIME type and rejecting encrypted content.
    pub(crate) fn open(name: &str, reader: SpreadsheetReader) -> Result<Self, ReadError> {
        let mut zip = ZipArchive::new(reader)?;
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip).with_prefix(MANIFEST_PATH)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    /// Reads every table of `content.xml` in document order.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError> {
        let sheets = read_content(&mut self.zip, criteria).with_prefix(CONTENT_PATH)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(self.name.to_owned()))?
        }
        Ok(sheets)
    }
}

fn read_content(zip: &mut ZipArchive<SpreadsheetReader>, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError> {
    let mut sheets = Vec::<Sheet>::new();
    let mut sheet_name = String::new();
    let mut reader = zip
        .xml_reader(CONTENT_PATH)?
        .ok_or_else(|| SpreadsheetError::FileError(CONTENT_PATH.to_owned()))?;
    'sheets: loop {
        let mut found = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break 'sheets,
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.ok_or(OdsError::SheetNameError)?;
                sheet_name.clear();
                sheet_name.push_str(&table_name);
                found = true;
                break;
            }
        });
        if !found {
            break;
        }

        let mut sheet = Sheet::new(&sheet_name);
        // Cell position
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        // Whether child text belongs to the cell value
        let mut element_context = false;
        // Whether child text is a comment
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row += row_count;
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                kind = match event.get_attribute_value("office:value-type")? {
                    Some(value_type) => match value_type.as_ref() {
                        "boolean" => CellType::Boolean,
                        "date" => CellType::IsoDateTime,
                        "time" => CellType::IsoDuration,
                        "string" => {
                            let is_error = event
                                .get_attribute_value("calcext:value-type")?
                                .map(|cow| cow == "error")
                                .unwrap_or(false);
                            match (is_error, criteria.error_as_null) {
                                (true, true) => CellType::Empty,
                                (true, false) => CellType::Error,
                                (false, _) => CellType::InlineString,
                            }
                        }
                        _ => CellType::Number,
                    },
                    None => CellType::Empty,
                };

                match kind {
                    CellType::InlineString | CellType::Error => element_context = true,
                    CellType::Boolean => {
                        let is_true = event
                            .get_attribute_value("office:boolean-value")?
                            .map(|cow| cow != "false" && cow != "0")
                            .unwrap_or(false);
                        value.push_str(if is_true { "1" } else { "0" });
                    }
                    CellType::IsoDateTime => {
                        if let Some(data) = event.get_attribute_value("office:date-value")? {
                            value.push_str(&data);
                        }
                    }
                    CellType::IsoDuration => {
                        if let Some(data) = event.get_attribute_value("office:time-value")? {
                            value.push_str(&data);
                        }
                    }
                    CellType::Number => {
                        if let Some(data) = event.get_attribute_value("office:value")? {
                            value.push_str(&data);
                        }
                    }
                    _ => (),
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                let is_null = value.is_empty() || (kind == CellType::InlineString && criteria.is_null(&value));
                if kind != CellType::Empty && !is_null {
                    for row_offset in 0..row_count {
                        for col_offset in 0..col_count {
                            sheet.push(Cell {
                                row: row + row_offset,
                                col: col + col_offset,
                                kind,
                                value: value.to_owned(),
                            });
                        }
                    }
                }
                col += col_count;
                kind = CellType::Empty;
                element_context = false;
                comment_context = false;
            }
            // String content
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == STRING => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        sheet.finish();
        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Validates the `mimetype` entry. Packages without one are accepted.
fn check_mime(zip: &mut ZipArchive<SpreadsheetReader>) -> Result<(), ReadError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encryption data. A package without a manifest is not encrypted.
fn is_password_protected(zip: &mut ZipArchive<SpreadsheetReader>) -> Result<bool, ReadError> {
    let mut reader = match zip.xml_reader(MANIFEST_PATH)? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == MANIFEST_FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == MANIFEST_FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == MANIFEST_ENCRYPTION_DATA => {
            return Ok(true);
        }
    });
    Ok(false)
}
