//! Command-line front end of the spreadsheet catalog.
//!
//! ```bash
//! # Databases under s3://reports/sales
//! sheet-catalog --source s3://reports/sales databases
//!
//! # Records of sheet Q1 in sales/2024.xlsx
//! sheet-catalog --source s3://reports/sales records 2024 Q1
//! ```
//!
//! Without `--source` the location comes from `S3_BUCKET` and `S3_PREFIX`.

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use sheet_catalog::config::SourceConfig;
use sheet_catalog::config::SOURCE_URL_VARIABLE;
use sheet_catalog::BucketSource;
use sheet_catalog::SheetCatalog;
use sheet_catalog::Split;
use sheet_catalog::WHOLE_SHEET;
use tracing_subscriber::EnvFilter;

/// Browse spreadsheet objects as databases, tables and records
#[derive(Parser, Debug)]
#[command(name = "sheet-catalog", version, about = "Query spreadsheets stored in an object store")]
struct Args {
    /// Source location: s3://bucket/prefix, file:///directory or memory:///prefix
    #[arg(long, value_name = "URL", env = "SHEET_SOURCE_URL", global = true)]
    source: Option<String>,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List databases under the source prefix
    Databases,
    /// List the tables of a database
    Tables { database: String },
    /// Print the inferred schema of a table
    Schema { database: String, table: String },
    /// List the splits of a table
    Splits { database: String, table: String },
    /// Print the records of a table split
    Records {
        database: String,
        table: String,
        /// Split token, as returned by `splits`
        #[arg(long, default_value = WHOLE_SHEET)]
        split: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = SourceConfig::from_lookup(|name| match name {
        SOURCE_URL_VARIABLE => args.source.clone(),
        name => std::env::var(name).ok(),
    })
    .context("Invalid source configuration")?;
    let source = BucketSource::from_config(&config).context("Failed to open object store")?;
    let catalog = SheetCatalog::new(source, config);

    match &args.command {
        Command::Databases => print(&args, &catalog.list_databases()?),
        Command::Tables { database } => print(&args, &catalog.list_tables(database)?),
        Command::Schema { database, table } => print(&args, &catalog.get_schema(database, table)?),
        Command::Splits { database, table } => print(&args, &catalog.get_splits(database, table)?),
        Command::Records { database, table, split } => {
            print(&args, &catalog.get_records(database, table, &Split::new(split.as_str()))?)
        }
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print(args: &Args, value: &impl Serialize) -> Result<()> {
    let json = if args.compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
