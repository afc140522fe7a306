use crate::database::column::Column;
use crate::database::value::Value;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

/// Column-major records of one table: for each column in schema order, one value per
/// data row. Every column holds exactly `row_count` values.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordBatch {
    columns: Vec<Column>,
    values: Vec<Vec<Value>>,
    row_count: usize,
}

impl RecordBatch {
    /// Builds a batch from per-column values. Callers guarantee one value vector per
    /// column, each `row_count` long.
    pub(crate) fn new(columns: Vec<Column>, values: Vec<Vec<Value>>, row_count: usize) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        debug_assert!(values.iter().all(|column| column.len() == row_count));
        RecordBatch {
            columns,
            values,
            row_count,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .position(|column| column.name == name)
            .map(|index| self.values[index].as_slice())
    }

    /// (name, values) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(column, values)| (column.name.as_str(), values.as_slice()))
    }
}

/// Serializes as a map from column name to values, keeping schema order.
impl Serialize for RecordBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in self.iter() {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}
