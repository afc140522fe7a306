//! Relational view of decoded workbooks: tables, typed columns and record batches.

pub(crate) mod batch;
pub(crate) mod column;
pub(crate) mod records;
pub(crate) mod schema;
pub(crate) mod split;
pub(crate) mod table;
pub(crate) mod value;
