use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// Token of the only split a table has: all of its rows.
pub const WHOLE_SHEET: &str = "whole_sheet";

/// An opaque token naming a subset of a table's rows.
///
/// Tables are never partitioned, so the whole sheet is the only split handed out.
/// Other tokens can still arrive from the transport and are rejected when records are
/// requested.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Split(String);

impl Split {
    pub fn new(token: impl Into<String>) -> Self {
        Split(token.into())
    }

    pub fn whole_sheet() -> Self {
        Split(WHOLE_SHEET.to_owned())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_whole_sheet(&self) -> bool {
        self.0 == WHOLE_SHEET
    }
}

impl Default for Split {
    fn default() -> Self {
        Split::whole_sheet()
    }
}

impl From<&str> for Split {
    fn from(token: &str) -> Self {
        Split::new(token)
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
