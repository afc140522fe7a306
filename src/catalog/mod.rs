//! The catalog facade the federation transport calls into.
//!
//! Every call lists or fetches from the object store again. Nothing is cached between
//! calls, so each answer reflects the objects as they were when the call ran.

mod lister;
mod loader;

use crate::config::SourceConfig;
use crate::database::batch::RecordBatch;
use crate::database::records::materialize;
use crate::database::schema::infer_schema;
use crate::database::schema::list_tables;
use crate::database::schema::resolve_sheet;
use crate::database::split::Split;
use crate::database::table::Table;
use crate::error::CatalogError;
use crate::spreadsheet::workbook::Workbook;
use crate::store::ObjectSource;
use tracing::info;
use tracing::warn;

/// Serves databases, tables, schemas and records from spreadsheet objects.
#[derive(Debug)]
pub struct SheetCatalog<S: ObjectSource> {
    source: S,
    config: SourceConfig,
}

impl<S: ObjectSource> SheetCatalog<S> {
    pub fn new(source: S, config: SourceConfig) -> Self {
        SheetCatalog { source, config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Names of all spreadsheet objects under the configured prefix, sorted.
    pub fn list_databases(&self) -> Result<Vec<String>, CatalogError> {
        let databases = lister::list_databases(&self.source, &self.config.prefix, self.config.extension())
            .inspect_err(|error| warn!(prefix = %self.config.prefix, kind = error.kind(), "{error}"))?;
        info!(prefix = %self.config.prefix, count = databases.len(), "Listed databases");
        Ok(databases)
    }

    /// Fetches and decodes the object of a database.
    pub fn load_workbook(&self, database: &str) -> Result<Workbook, CatalogError> {
        loader::load_workbook(&self.source, &self.config, database)
            .inspect_err(|error| warn!(database, kind = error.kind(), "{error}"))
    }

    /// Sheet names of a database, in workbook order.
    pub fn list_tables(&self, database: &str) -> Result<Vec<String>, CatalogError> {
        let workbook = self.load_workbook(database)?;
        let tables = list_tables(&workbook);
        info!(database, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Column names and inferred types of a table.
    pub fn get_schema(&self, database: &str, table: &str) -> Result<Table, CatalogError> {
        let workbook = self.load_workbook(database)?;
        let schema = infer_schema(&workbook, table, self.config.analyze_rows)
            .inspect_err(|error| warn!(database, table, kind = error.kind(), "{error}"))?;
        info!(database, table, columns = schema.columns.len(), "Inferred schema");
        Ok(schema)
    }

    /// Splits of a table. Always the single whole-sheet split.
    pub fn get_splits(&self, database: &str, table: &str) -> Result<Vec<Split>, CatalogError> {
        let workbook = self.load_workbook(database)?;
        resolve_sheet(&workbook, table).inspect_err(|error| warn!(database, table, kind = error.kind(), "{error}"))?;
        Ok(vec![Split::whole_sheet()])
    }

    /// All rows of one split of a table, typed by the inferred schema.
    pub fn get_records(&self, database: &str, table: &str, split: &Split) -> Result<RecordBatch, CatalogError> {
        let workbook = self.load_workbook(database)?;
        let batch = materialize(&workbook, table, split, self.config.analyze_rows)
            .inspect_err(|error| warn!(database, table, split = %split, kind = error.kind(), "{error}"))?;
        info!(
            database,
            table,
            split = %split,
            rows = batch.row_count(),
            columns = batch.columns().len(),
            "Read records"
        );
        Ok(batch)
    }
}
