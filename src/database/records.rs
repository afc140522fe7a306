//! Record materialization: typed, column-major batches from sheet rows.

use crate::database::batch::RecordBatch;
use crate::database::column::Column;
use crate::database::schema::data_rows;
use crate::database::schema::infer_schema;
use crate::database::schema::resolve_sheet;
use crate::database::split::Split;
use crate::database::table::Table;
use crate::database::value::Value;
use crate::error::CatalogError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::workbook::Workbook;
use tracing::debug;

/// Reads every data row of a table into a record batch.
///
/// The schema is inferred again so that column order and types match `infer_schema`.
/// Rows shorter than the header are padded with nulls and blank rows become all-null
/// rows. Any cell that does not convert to its column's type fails the whole call.
pub fn materialize(
    workbook: &Workbook,
    table: &str,
    split: &Split,
    analyze_rows: Option<usize>,
) -> Result<RecordBatch, CatalogError> {
    if !split.is_whole_sheet() {
        return Err(CatalogError::UnsupportedSplit {
            database: workbook.name.to_owned(),
            table: table.to_owned(),
            split: split.token().to_owned(),
        });
    }

    let schema = infer_schema(workbook, table, analyze_rows)?;
    let sheet = resolve_sheet(workbook, table)?;
    let (Some(header_row), Some(col_upper_bound)) = (schema.row_lower_bound, schema.col_upper_bound()) else {
        return Ok(RecordBatch::new(schema.columns, Vec::new(), 0));
    };

    let grid = sheet.grid(data_rows(sheet, header_row, None), 0..=col_upper_bound);
    let rows = grid
        .iter()
        .enumerate()
        .map(|(index, cells)| coerce_row(workbook, &schema, index, cells))
        .collect::<Result<Vec<_>, _>>()?;
    let row_count = rows.len();
    debug!(
        database = %workbook.name,
        table,
        rows = row_count,
        columns = schema.columns.len(),
        "Materialized records"
    );

    let values = transpose(rows, schema.columns.len());
    Ok(RecordBatch::new(schema.columns, values, row_count))
}

/// Converts one padded row to its columns' types. `index` is the 0-based data row.
fn coerce_row(workbook: &Workbook, schema: &Table, index: usize, cells: &[Option<&Cell>]) -> Result<Vec<Value>, CatalogError> {
    cells
        .iter()
        .zip(&schema.columns)
        .map(|(cell, column)| match cell {
            None => Ok(Value::Null),
            Some(cell) => cell
                .to_value(column.kind)
                .map_err(|_| coercion_error(workbook, schema, index, cell, column)),
        })
        .collect()
}

fn coercion_error(workbook: &Workbook, schema: &Table, index: usize, cell: &Cell, column: &Column) -> CatalogError {
    CatalogError::TypeCoercionError {
        database: workbook.name.to_owned(),
        table: schema.name.to_owned(),
        row: index,
        column: column.name.to_owned(),
        reference: cell.reference(),
        kind: column.kind.as_str().to_owned(),
        value: cell.value.to_owned(),
    }
}

/// Re-projects equal-length typed rows into `width` columns.
fn transpose(rows: Vec<Vec<Value>>, width: usize) -> Vec<Vec<Value>> {
    let mut columns: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ColumnType;
    use crate::spreadsheet::criteria::Criteria;
    use crate::spreadsheet::fixture;
    use crate::spreadsheet::fixture::Entry;
    use crate::spreadsheet::fixture::Entry::*;
    use crate::spreadsheet::SpreadsheetFormat;
    use bytes::Bytes;
    use chrono::NaiveDateTime;

    fn workbook(format: SpreadsheetFormat, rows: Vec<Vec<Entry>>) -> Workbook {
        let bytes = fixture::workbook(format, &[("Q1", rows), ("Empty", vec![])]);
        Workbook::decode("2024", format, Bytes::from(bytes), &Criteria::default()).unwrap()
    }

    fn text(value: &str) -> Value {
        Value::String(value.to_owned())
    }

    fn timestamp(value: &str) -> Value {
        Value::Timestamp(NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn materializes_regional_sales() {
        for format in [SpreadsheetFormat::Xlsx, SpreadsheetFormat::Ods] {
            let workbook = workbook(
                format,
                vec![
                    vec![Text("region"), Text("units")],
                    vec![Text("east"), Number("10")],
                    vec![Text("west"), Blank],
                ],
            );
            let schema = infer_schema(&workbook, "Q1", None).unwrap();
            assert_eq!(
                schema.columns,
                vec![Column::new("region", ColumnType::String), Column::new("units", ColumnType::Integer)]
            );

            let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
            assert_eq!(batch.row_count(), 2);
            assert_eq!(batch.columns(), schema.columns.as_slice());
            assert_eq!(batch.column("region"), Some(&[text("east"), text("west")][..]));
            assert_eq!(batch.column("units"), Some(&[Value::Integer(10), Value::Null][..]));
            assert_eq!(
                serde_json::to_string(&batch).unwrap(),
                r#"{"region":["east","west"],"units":[10,null]}"#
            );
        }
    }

    #[test]
    fn pads_ragged_and_blank_rows() {
        let workbook = workbook(
            SpreadsheetFormat::Xlsx,
            vec![
                vec![Text("a"), Text("b"), Text("c")],
                vec![Number("1")],
                vec![],
                vec![Number("3"), Number("4"), Number("5"), Text("outside")],
            ],
        );
        let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
        assert_eq!(batch.row_count(), 3);
        for (_, values) in batch.iter() {
            assert_eq!(values.len(), 3);
        }
        assert_eq!(batch.column("a"), Some(&[Value::Integer(1), Value::Null, Value::Integer(3)][..]));
        assert_eq!(batch.column("c"), Some(&[Value::Null, Value::Null, Value::Integer(5)][..]));
    }

    #[test]
    fn renders_string_columns_like_a_spreadsheet() {
        let workbook = workbook(
            SpreadsheetFormat::Xlsx,
            vec![
                vec![Text("note"), Text("when")],
                vec![Date("2024-01-01"), DateTime("2024-01-01 12:00:00")],
                vec![Boolean(true), Date("2024-01-02")],
                vec![Number("2.5"), Blank],
                vec![Error("#N/A"), Blank],
            ],
        );
        let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
        assert_eq!(
            batch.column("note"),
            Some(&[text("2024-01-01"), text("true"), text("2.5"), text("#N/A")][..])
        );
        assert_eq!(
            batch.column("when"),
            Some(
                &[
                    timestamp("2024-01-01 12:00:00"),
                    timestamp("2024-01-02 00:00:00"),
                    Value::Null,
                    Value::Null
                ][..]
            )
        );
    }

    #[test]
    fn rejects_other_splits() {
        let workbook = workbook(SpreadsheetFormat::Xlsx, vec![vec![Text("region")]]);
        assert_eq!(
            materialize(&workbook, "Q1", &Split::from("rows_0_100"), None),
            Err(CatalogError::UnsupportedSplit {
                database: "2024".to_owned(),
                table: "Q1".to_owned(),
                split: "rows_0_100".to_owned(),
            })
        );
    }

    #[test]
    fn narrow_sample_fails_on_later_cell() {
        let workbook = workbook(
            SpreadsheetFormat::Xlsx,
            vec![
                vec![Text("region"), Text("units")],
                vec![Text("east"), Number("10")],
                vec![Text("west"), Text("ten")],
            ],
        );
        assert_eq!(
            materialize(&workbook, "Q1", &Split::whole_sheet(), Some(1)),
            Err(CatalogError::TypeCoercionError {
                database: "2024".to_owned(),
                table: "Q1".to_owned(),
                row: 1,
                column: "units".to_owned(),
                reference: "B3".to_owned(),
                kind: "integer".to_owned(),
                value: "ten".to_owned(),
            })
        );

        let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
        assert_eq!(batch.column("units"), Some(&[text("10"), text("ten")][..]));
    }

    #[test]
    fn empty_tables_have_no_rows() {
        let workbook = workbook(SpreadsheetFormat::Xlsx, vec![vec![Text("region"), Text("units")]]);
        let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
        assert_eq!(batch.row_count(), 0);
        assert_eq!(batch.column("units"), Some(&[][..]));

        let batch = materialize(&workbook, "Empty", &Split::whole_sheet(), None).unwrap();
        assert_eq!(batch.row_count(), 0);
        assert!(batch.columns().is_empty());
        assert_eq!(serde_json::to_string(&batch).unwrap(), "{}");
    }

    #[test]
    fn blank_first_header_cell_has_no_records() {
        let workbook = workbook(
            SpreadsheetFormat::Ods,
            vec![vec![Blank, Text("region")], vec![Number("7"), Text("east")]],
        );
        let batch = materialize(&workbook, "Q1", &Split::whole_sheet(), None).unwrap();
        assert_eq!(batch.row_count(), 0);
        assert!(batch.columns().is_empty());
    }

    #[test]
    fn missing_table_is_not_found() {
        let workbook = workbook(SpreadsheetFormat::Xlsx, vec![]);
        let result = materialize(&workbook, "Q9", &Split::whole_sheet(), None);
        assert_eq!(result.map(|batch| batch.row_count()).unwrap_err().kind(), "TableNotFound");
    }

    #[test]
    fn transposes_rows_into_columns() {
        let rows = vec![
            vec![Value::Integer(1), text("a")],
            vec![Value::Integer(2), text("b")],
        ];
        assert_eq!(
            transpose(rows, 2),
            vec![vec![Value::Integer(1), Value::Integer(2)], vec![text("a"), text("b")]]
        );
    }
}
