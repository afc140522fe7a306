//! Spreadsheet decoding for the zip-packaged formats: Office Open XML workbooks
//! (`.xlsx`, `.xlsm`) and OpenDocument spreadsheets (`.ods`).

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
#[cfg(test)]
pub(crate) mod fixture;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod workbook;
pub(crate) mod xlsx;

use crate::error::ReadError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use bytes::Bytes;
use std::fmt::Display;
use std::io::Cursor;
use thiserror::Error;

/// Signature of an OLE compound file: legacy `.xls` workbooks and password protected
/// Office Open XML packages both start with it.
const COMPOUND_FILE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// In-memory source every reader decodes from.
pub(crate) type SpreadsheetReader = Cursor<Bytes>;

#[derive(Error, Debug)]
pub(crate) enum SpreadsheetError {
    #[error("Missing package part '{0}'")]
    FileError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' is an OLE compound file (password protected workbook or legacy xls)")]
    CompoundFileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Shared string index {0} is out of range")]
    SharedStringIndexError(usize),
}

/// Spreadsheet file formats served from the object store, one per configured extension.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    #[default]
    Xlsx,
    Xlsm,
    Ods,
}

impl SpreadsheetFormat {
    /// Parses a file extension, ignoring ASCII case and a leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }

    /// Lower case extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xlsm => "xlsm",
            Self::Ods => "ods",
        }
    }
}

impl Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A spreadsheet opened for reading.
pub(crate) trait Spreadsheet {
    /// Name of the spreadsheet, used in error messages.
    fn name(&self) -> String;

    /// Decodes every sheet, in workbook order.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError>;
}

/// Opens in-memory spreadsheet bytes with the reader for the given format.
pub(crate) fn open_spreadsheet(
    name: &str,
    format: SpreadsheetFormat,
    bytes: Bytes,
) -> Result<Box<dyn Spreadsheet>, ReadError> {
    if bytes.starts_with(&COMPOUND_FILE_SIGNATURE) {
        Err(SpreadsheetError::CompoundFileError(name.to_owned()))?;
    }

    let reader = Cursor::new(bytes);
    match format {
        SpreadsheetFormat::Xlsx | SpreadsheetFormat::Xlsm => Ok(Box::new(XlsxSpreadsheet::open(name, reader)?)),
        SpreadsheetFormat::Ods => Ok(Box::new(OdsSpreadsheet::open(name, reader)?)),
    }
}
