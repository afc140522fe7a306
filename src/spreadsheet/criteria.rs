use std::collections::HashSet;

/// Options applied while decoding sheets.
#[derive(Clone, Debug)]
pub(crate) struct Criteria {
    /// Text values read as empty cells (default: the empty string).
    pub(crate) nulls: HashSet<String>,

    /// Read error cells such as `#N/A` as empty instead of keeping their error text.
    pub(crate) error_as_null: bool,
}

impl Criteria {
    /// Checks whether a text value is one of the null literals.
    pub(crate) fn is_null(&self, value: &str) -> bool {
        self.nulls.contains(value)
    }
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            nulls: HashSet::from([String::new()]),
            error_as_null: false,
        }
    }
}
