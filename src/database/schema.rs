//! Sheet resolution and schema inference.

use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::table::Table;
use crate::error::CatalogError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::workbook::Workbook;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// Header row of a sheet: its position and the column names read from it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Header {
    pub(crate) row: usize,
    pub(crate) names: Vec<String>,
}

/// The header is always the first row of the sheet.
const HEADER_ROW: usize = 0;

/// Sheet names of the workbook, in workbook order.
pub fn list_tables(workbook: &Workbook) -> Vec<String> {
    workbook.sheet_names()
}

/// Returns the header cell values of a table, left to right.
pub fn get_header(workbook: &Workbook, table: &str) -> Result<Vec<String>, CatalogError> {
    let sheet = resolve_sheet(workbook, table)?;
    Ok(locate_header(sheet).map(|header| header.names).unwrap_or_default())
}

/// Infers the ordered `(column, type)` schema of a table.
///
/// Column names come verbatim from the header row. Each column's type is the most
/// specific type all of its non-empty data cells convert to. With `analyze_rows` set
/// only that many leading data rows are sampled.
pub fn infer_schema(workbook: &Workbook, table: &str, analyze_rows: Option<usize>) -> Result<Table, CatalogError> {
    let sheet = resolve_sheet(workbook, table)?;
    let Some(header) = locate_header(sheet) else {
        debug!(database = %workbook.name, table, "Sheet has no header columns");
        return Ok(Table {
            name: table.to_owned(),
            columns: Vec::new(),
            row_lower_bound: None,
        });
    };

    let mut names = HashSet::with_capacity(header.names.len());
    if let Some(duplicate) = header.names.iter().find(|name| !names.insert(name.as_str())) {
        return Err(CatalogError::AmbiguousSchema {
            database: workbook.name.to_owned(),
            table: table.to_owned(),
            column: duplicate.to_owned(),
        });
    }

    let rows = data_rows(sheet, header.row, analyze_rows);
    let grid = sheet.grid(rows, 0..=header.names.len() - 1);
    let columns: Vec<Column> = header
        .names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let kind = ColumnType::detect(grid.iter().map(|row| row[index].and_then(ColumnType::from)));
            Column { name, kind }
        })
        .collect();
    debug!(
        database = %workbook.name,
        table,
        columns = columns.len(),
        sampled_rows = grid.len(),
        "Inferred schema"
    );

    Ok(Table {
        name: table.to_owned(),
        columns,
        row_lower_bound: Some(header.row),
    })
}

pub(crate) fn resolve_sheet<'a>(workbook: &'a Workbook, table: &str) -> Result<&'a Sheet, CatalogError> {
    workbook.sheet(table).ok_or_else(|| CatalogError::TableNotFound {
        database: workbook.name.to_owned(),
        table: table.to_owned(),
    })
}

/// Reads the header from column `A` rightwards. The first empty cell ends the column
/// list, so a blank `A1` or an empty first row yields no header.
pub(crate) fn locate_header(sheet: &Sheet) -> Option<Header> {
    let names: Vec<String> = sheet
        .row(HEADER_ROW)
        .iter()
        .enumerate()
        .take_while(|(offset, cell)| cell.col == *offset)
        .map(|(_, cell)| cell.to_string())
        .collect();
    (!names.is_empty()).then_some(Header { row: HEADER_ROW, names })
}

/// Data rows below the header, up to the sheet's last used row. Blank rows in between
/// are kept. `limit` caps the number of rows.
pub(crate) fn data_rows(sheet: &Sheet, header_row: usize, limit: Option<usize>) -> RangeInclusive<usize> {
    let last = sheet.row_upper_bound.unwrap_or(header_row);
    let last = match limit {
        Some(limit) => last.min(header_row.saturating_add(limit)),
        None => last,
    };
    header_row + 1..=last
}
