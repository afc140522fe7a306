//! Source configuration, read from the environment.

use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::SpreadsheetFormat;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const SOURCE_URL_VARIABLE: &str = "SHEET_SOURCE_URL";
pub const BUCKET_VARIABLE: &str = "S3_BUCKET";
pub const PREFIX_VARIABLE: &str = "S3_PREFIX";
pub const SPILL_VARIABLE: &str = "TARGET_BUCKET";
pub const EXTENSION_VARIABLE: &str = "SHEET_EXTENSION";
pub const TIMEOUT_VARIABLE: &str = "SHEET_TIMEOUT_SECS";
pub const ANALYZE_ROWS_VARIABLE: &str = "SHEET_ANALYZE_ROWS";
pub const NULLS_VARIABLE: &str = "SHEET_NULLS";
pub const ERROR_AS_NULL_VARIABLE: &str = "SHEET_ERROR_AS_NULL";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable '{0}'")]
    MissingVariable(String),

    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidValue { name: String, value: String, reason: String },

    #[error("Unsupported source scheme '{0}', expected s3, file or memory")]
    UnsupportedScheme(String),

    #[error("Unsupported spreadsheet extension '{0}', expected xlsx, xlsm or ods")]
    UnsupportedExtension(String),
}

/// Kind of object store the spreadsheets live in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceScheme {
    /// Amazon S3 bucket, credentials resolved from the environment
    #[default]
    S3,
    /// Directory on the local filesystem
    File,
    /// Process-local store, empty unless populated by the caller
    Memory,
}

/// Where the spreadsheet objects are and how they are read.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    pub scheme: SourceScheme,
    /// Bucket name (`s3` only)
    pub bucket: Option<String>,
    /// Root directory (`file` only)
    pub root: Option<PathBuf>,
    /// Key prefix without leading or trailing `/`
    pub prefix: String,
    /// Format of the spreadsheet objects, which is also their key extension
    pub format: SpreadsheetFormat,
    /// Spill location handed to the transport, unused by the catalog itself
    pub spill_destination: Option<String>,
    /// Bound on each list and get request
    pub timeout: Duration,
    /// Number of leading data rows sampled by type inference, all rows when `None`
    pub analyze_rows: Option<usize>,
    /// Text values read as empty cells
    pub nulls: HashSet<String>,
    /// Read error cells such as `#N/A` as empty
    pub error_as_null: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            scheme: SourceScheme::default(),
            bucket: None,
            root: None,
            prefix: String::new(),
            format: SpreadsheetFormat::default(),
            spill_destination: None,
            timeout: DEFAULT_TIMEOUT,
            analyze_rows: None,
            nulls: HashSet::from([String::new()]),
            error_as_null: false,
        }
    }
}

impl SourceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through a variable lookup function. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let mut config = SourceConfig {
            bucket: lookup(BUCKET_VARIABLE),
            spill_destination: lookup(SPILL_VARIABLE),
            ..SourceConfig::default()
        };
        if let Some(prefix) = lookup(PREFIX_VARIABLE) {
            config.prefix = normalize_prefix(&prefix);
        }
        if let Some(extension) = lookup(EXTENSION_VARIABLE) {
            config.format = SpreadsheetFormat::from_extension(&extension)
                .ok_or_else(|| ConfigError::UnsupportedExtension(extension.to_owned()))?;
        }
        if let Some(timeout) = lookup(TIMEOUT_VARIABLE) {
            let seconds = parse_number::<u64>(TIMEOUT_VARIABLE, &timeout)?;
            if seconds == 0 {
                return Err(invalid(TIMEOUT_VARIABLE, &timeout, "must be positive"));
            }
            config.timeout = Duration::from_secs(seconds);
        }
        if let Some(rows) = lookup(ANALYZE_ROWS_VARIABLE) {
            config.analyze_rows = Some(parse_number::<usize>(ANALYZE_ROWS_VARIABLE, &rows)?);
        }
        if let Some(nulls) = lookup(NULLS_VARIABLE) {
            config.nulls.extend(nulls.split(',').map(str::to_owned));
        }
        if let Some(flag) = lookup(ERROR_AS_NULL_VARIABLE) {
            config.error_as_null = parse_flag(ERROR_AS_NULL_VARIABLE, &flag)?;
        }
        if let Some(url) = lookup(SOURCE_URL_VARIABLE) {
            config = config.with_source_url(&url)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Points the configuration at a source URL: `s3://bucket/prefix`,
    /// `file:///directory` or `memory:///prefix`.
    pub fn with_source_url(mut self, source: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(source).map_err(|error| invalid(SOURCE_URL_VARIABLE, source, &error.to_string()))?;
        match url.scheme() {
            "s3" => {
                let bucket = url
                    .host_str()
                    .filter(|host| !host.is_empty())
                    .ok_or_else(|| invalid(SOURCE_URL_VARIABLE, source, "missing bucket name"))?;
                self.scheme = SourceScheme::S3;
                self.bucket = Some(bucket.to_owned());
                self.root = None;
                self.prefix = normalize_prefix(url.path());
            }
            "file" => {
                let root = url
                    .to_file_path()
                    .map_err(|_| invalid(SOURCE_URL_VARIABLE, source, "not a local directory"))?;
                self.scheme = SourceScheme::File;
                self.bucket = None;
                self.root = Some(root);
                self.prefix = String::new();
            }
            "memory" => {
                self.scheme = SourceScheme::Memory;
                self.bucket = None;
                self.root = None;
                self.prefix = normalize_prefix(url.path());
            }
            scheme => return Err(ConfigError::UnsupportedScheme(scheme.to_owned())),
        }
        Ok(self)
    }

    /// Checks that the scheme has what it needs to open a store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.scheme {
            SourceScheme::S3 if self.bucket.is_none() => Err(ConfigError::MissingVariable(BUCKET_VARIABLE.to_owned())),
            SourceScheme::File if self.root.is_none() => {
                Err(ConfigError::MissingVariable(SOURCE_URL_VARIABLE.to_owned()))
            }
            _ => Ok(()),
        }
    }

    /// Spreadsheet key extension without the dot.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub(crate) fn criteria(&self) -> Criteria {
        Criteria {
            nulls: self.nulls.clone(),
            error_as_null: self.error_as_null,
        }
    }
}

/// Removes leading and trailing `/` so the prefix can be joined with a single separator.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_owned()
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|error| invalid(name, value, &error.to_string()))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected true or false")),
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
