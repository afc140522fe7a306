use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use serde::Serialize;
use std::fmt::Display;

/// Scalar types a column can be inferred as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integers
    Integer,
    /// Double-precision floating point numbers
    Float,
    /// Date and time without time zone
    Timestamp,
    /// Text, and everything that is not one of the other types
    String,
}

/// A named, typed column of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name, verbatim from the header row
    pub name: String,
    /// Column data type
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

impl ColumnType {
    /// Returns the lower case type name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Timestamp => "timestamp",
            ColumnType::String => "string",
        }
    }

    /// Returns the narrowest type the cell converts to, trying integer, float and
    /// timestamp in turn. Empty cells have no type.
    ///
    /// Uses the same conversions as materialization, so a column inferred from its
    /// cells always accepts them.
    pub(crate) fn from(cell: &Cell) -> Option<Self> {
        if cell.kind == CellType::Empty {
            None
        } else if cell.to_integer().is_ok() {
            Some(ColumnType::Integer)
        } else if cell.to_float().is_ok() {
            Some(ColumnType::Float)
        } else if cell.to_timestamp().is_ok() {
            Some(ColumnType::Timestamp)
        } else {
            Some(ColumnType::String)
        }
    }

    /// Detects the most specific common type from a collection of candidate types.
    /// Falls back to string if types are inconsistent or empty.
    pub(crate) fn detect(types: impl IntoIterator<Item = Option<ColumnType>>) -> ColumnType {
        let types: Vec<ColumnType> = types.into_iter().flatten().collect();
        if types.is_empty() {
            ColumnType::String
        } else if types.iter().all(|kind| kind.is_int()) {
            ColumnType::Integer
        } else if types.iter().all(|kind| kind.is_float()) {
            ColumnType::Float
        } else if types.iter().all(|kind| kind.is_timestamp()) {
            ColumnType::Timestamp
        } else {
            ColumnType::String
        }
    }

    /// Returns true if this column type represents integer values.
    #[inline]
    pub(crate) fn is_int(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }

    /// Returns true if this column type represents numeric values (integer or floating point).
    #[inline]
    pub(crate) fn is_float(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    #[inline]
    pub(crate) fn is_timestamp(&self) -> bool {
        matches!(self, ColumnType::Timestamp)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
