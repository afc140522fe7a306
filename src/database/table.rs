use crate::database::column::Column;
use serde::Serialize;

/// Schema of a table: a sheet's name and its columns in header order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Table/sheet name
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// Header row, `None` when the header has no columns
    #[serde(skip)]
    pub(crate) row_lower_bound: Option<usize>,
}

impl Table {
    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Last header column, `None` without columns. Columns start at `A`.
    pub(crate) fn col_upper_bound(&self) -> Option<usize> {
        self.columns.len().checked_sub(1)
    }
}
