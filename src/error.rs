use thiserror::Error;

/// Error raised while decoding spreadsheet bytes.
/// Aggregates errors from the standard library, the format dependencies and internal modules.
#[derive(Error, Debug)]
pub(crate) enum ReadError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, ReadError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| ReadError::WithContextError(format!("{}: {}", message, e)))
    }
}

/// Errors surfaced to the federation transport.
///
/// Every variant is deterministic for a given object content, so none of them is retried
/// inside the catalog. Each carries the database and, where it applies, the table, row and
/// column involved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Listing the source prefix failed or timed out.
    #[error("Catalog unavailable under prefix '{prefix}': {reason}")]
    CatalogUnavailable { prefix: String, reason: String },

    /// No spreadsheet object could be fetched for the database.
    #[error("Database '{database}' not found at '{key}': {reason}")]
    ObjectNotFound {
        database: String,
        key: String,
        reason: String,
    },

    /// The object bytes are not a readable spreadsheet.
    #[error("Database '{database}' is not a valid spreadsheet: {reason}")]
    DecodeError { database: String, reason: String },

    /// The workbook has no sheet with the requested name.
    #[error("Table '{table}' not found in database '{database}'")]
    TableNotFound { database: String, table: String },

    /// Two header cells carry the same column name.
    #[error("Duplicate column '{column}' in table '{table}' of database '{database}'")]
    AmbiguousSchema {
        database: String,
        table: String,
        column: String,
    },

    /// A cell cannot be coerced to its column's inferred type.
    #[error("Cannot coerce '{value}' at {reference} (row {row}, column '{column}') to {kind} in table '{table}' of database '{database}'")]
    TypeCoercionError {
        database: String,
        table: String,
        row: usize,
        column: String,
        reference: String,
        kind: String,
        value: String,
    },

    /// Only the whole-sheet split can be materialized.
    #[error("Unsupported split '{split}' for table '{table}' of database '{database}'")]
    UnsupportedSplit {
        database: String,
        table: String,
        split: String,
    },
}

impl CatalogError {
    /// Returns the taxonomy name of the error, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::CatalogUnavailable { .. } => "CatalogUnavailable",
            CatalogError::ObjectNotFound { .. } => "ObjectNotFound",
            CatalogError::DecodeError { .. } => "DecodeError",
            CatalogError::TableNotFound { .. } => "TableNotFound",
            CatalogError::AmbiguousSchema { .. } => "AmbiguousSchema",
            CatalogError::TypeCoercionError { .. } => "TypeCoercionError",
            CatalogError::UnsupportedSplit { .. } => "UnsupportedSplit",
        }
    }
}
