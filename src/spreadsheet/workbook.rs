use crate::error::ReadError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetFormat;
use bytes::Bytes;

/// A fully decoded spreadsheet object: every sheet and every non-empty cell.
///
/// A workbook is a frozen snapshot of the object as fetched. It is owned by the call
/// that loaded it and never shared or cached.
#[derive(Clone, Debug)]
pub struct Workbook {
    /// Database name the workbook was loaded for
    pub name: String,
    pub(crate) sheets: Vec<Sheet>,
}

impl Workbook {
    /// Decodes spreadsheet bytes of the given format.
    pub(crate) fn decode(
        name: &str,
        format: SpreadsheetFormat,
        bytes: Bytes,
        criteria: &Criteria,
    ) -> Result<Workbook, ReadError> {
        let mut spreadsheet = open_spreadsheet(name, format, bytes)?;
        let sheets = spreadsheet.read_sheets(criteria)?;
        Ok(Workbook {
            name: spreadsheet.name(),
            sheets,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.to_owned()).collect()
    }

    pub(crate) fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}
