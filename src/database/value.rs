use crate::database::column::ColumnType;
use chrono::NaiveDateTime;
use serde::Serialize;

/// A typed scalar in a record batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of the value, `None` for null.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::String(_) => Some(ColumnType::String),
        }
    }
}
