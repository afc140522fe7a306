//! # Spreadsheet Catalog
//!
//! Serves spreadsheet files kept in an object store as a relational catalog for a
//! federated query engine.
//!
//! ## Mapping
//!
//! - **Database**: one spreadsheet object under the configured prefix. The name is the
//!   object key without the prefix and without the spreadsheet extension.
//! - **Table**: one sheet of the workbook, named after the sheet.
//! - **Column**: one header cell of the sheet's first non-empty row. The column type is
//!   inferred from the cells below it (`integer`, `float`, `timestamp` or `string`).
//! - **Split**: the whole sheet. Records of a split come back as one column-major batch.
//!
//! Office Open XML workbooks (`.xlsx`, `.xlsm`) and OpenDocument spreadsheets (`.ods`)
//! are supported.
//!
//! ## Example
//!
//! ```no_run
//! use sheet_catalog::{BucketSource, SheetCatalog, SourceConfig, Split};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SourceConfig::from_env()?;
//! let catalog = SheetCatalog::new(BucketSource::from_config(&config)?, config);
//! for database in catalog.list_databases()? {
//!     for table in catalog.list_tables(&database)? {
//!         let batch = catalog.get_records(&database, &table, &Split::whole_sheet())?;
//!         println!("{database}.{table}: {} rows", batch.row_count());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod catalog;
pub mod config;
mod database;
mod error;
mod helpers;
mod spreadsheet;
mod store;

pub use crate::catalog::SheetCatalog;
pub use crate::config::ConfigError;
pub use crate::config::SourceConfig;
pub use crate::config::SourceScheme;
pub use crate::database::batch::RecordBatch;
pub use crate::database::column::Column;
pub use crate::database::column::ColumnType;
pub use crate::database::records::materialize;
pub use crate::database::schema::get_header;
pub use crate::database::schema::infer_schema;
pub use crate::database::schema::list_tables;
pub use crate::database::split::Split;
pub use crate::database::split::WHOLE_SHEET;
pub use crate::database::table::Table;
pub use crate::database::value::Value;
pub use crate::error::CatalogError;
pub use crate::spreadsheet::workbook::Workbook;
pub use crate::spreadsheet::SpreadsheetFormat;
pub use crate::store::BucketSource;
pub use crate::store::ObjectSource;
pub use crate::store::SourceError;
