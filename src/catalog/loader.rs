use crate::catalog::lister::object_key;
use crate::config::SourceConfig;
use crate::error::CatalogError;
use crate::spreadsheet::workbook::Workbook;
use crate::store::ObjectSource;
use tracing::debug;

/// Fetches the object of a database and decodes every sheet.
pub(crate) fn load_workbook(
    source: &dyn ObjectSource,
    config: &SourceConfig,
    database: &str,
) -> Result<Workbook, CatalogError> {
    let key = object_key(&config.prefix, database, config.extension());
    let bytes = source.get(&key).map_err(|error| CatalogError::ObjectNotFound {
        database: database.to_owned(),
        key: key.to_owned(),
        reason: error.to_string(),
    })?;
    debug!(database, key = %key, size = bytes.len(), "Decoding workbook");

    Workbook::decode(database, config.format, bytes, &config.criteria()).map_err(|error| {
        CatalogError::DecodeError {
            database: database.to_owned(),
            reason: error.to_string(),
        }
    })
}
