use crate::error::CatalogError;
use crate::store::ObjectSource;
use tracing::debug;

/// Lists the database names under `prefix`, sorted.
///
/// A database name is an object key with `{prefix}/` and `.{extension}` removed. Keys
/// outside the prefix or without the extension are skipped.
pub(crate) fn list_databases(
    source: &dyn ObjectSource,
    prefix: &str,
    extension: &str,
) -> Result<Vec<String>, CatalogError> {
    let keys = source.list(prefix).map_err(|error| CatalogError::CatalogUnavailable {
        prefix: prefix.to_owned(),
        reason: error.to_string(),
    })?;

    let mut databases: Vec<String> = keys
        .iter()
        .filter_map(|key| {
            let name = database_name(key, prefix, extension);
            if name.is_none() {
                debug!(key = %key, "Skipped non-spreadsheet object");
            }
            name
        })
        .collect();
    databases.sort();
    Ok(databases)
}

/// Removes `{prefix}/` and `.{extension}` from a key, exactly once each.
pub(crate) fn database_name(key: &str, prefix: &str, extension: &str) -> Option<String> {
    let relative = if prefix.is_empty() {
        key
    } else {
        key.strip_prefix(prefix)?.strip_prefix('/')?
    };
    let name = relative.strip_suffix(extension)?.strip_suffix('.')?;
    (!name.is_empty() && !name.ends_with('/')).then(|| name.to_owned())
}

/// Key of the object holding a database.
pub(crate) fn object_key(prefix: &str, database: &str, extension: &str) -> String {
    if prefix.is_empty() {
        format!("{database}.{extension}")
    } else {
        format!("{prefix}/{database}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SourceError;
    use bytes::Bytes;

    struct Keys(Vec<&'static str>);

    impl ObjectSource for Keys {
        fn list(&self, _prefix: &str) -> Result<Vec<String>, SourceError> {
            Ok(self.0.iter().map(|key| key.to_string()).collect())
        }

        fn get(&self, key: &str) -> Result<Bytes, SourceError> {
            Err(SourceError::NotFound(key.to_owned()))
        }
    }

    #[test]
    fn lists_only_keys_with_exact_extension() {
        let source = Keys(vec![
            "sales/2024.xlsx",
            "sales/2023.XLSX",
            "sales/2022.xlsx.bak",
            "sales/2021xlsx",
            "sales/",
            "sales/q1/2020.xlsx",
        ]);
        assert_eq!(
            list_databases(&source, "sales", "xlsx").unwrap(),
            vec!["2024".to_owned(), "q1/2020".to_owned()]
        );
    }

    #[test]
    fn removes_prefix_and_extension_exactly() {
        assert_eq!(database_name("sales/2024.xlsx", "sales", "xlsx"), Some("2024".to_owned()));
        assert_eq!(database_name("sales/xlsx.xlsx", "sales", "xlsx"), Some("xlsx".to_owned()));
        assert_eq!(database_name("sales/sales.xlsx", "sales", "xlsx"), Some("sales".to_owned()));
        assert_eq!(database_name("sales/q1/2024.xlsx", "sales", "xlsx"), Some("q1/2024".to_owned()));
        assert_eq!(database_name("2024.xlsx", "", "xlsx"), Some("2024".to_owned()));
        assert_eq!(database_name("2024.xlsx.xlsx", "", "xlsx"), Some("2024.xlsx".to_owned()));
    }

    #[test]
    fn rejects_keys_outside_prefix_or_extension() {
        assert_eq!(database_name("salesman/2024.xlsx", "sales", "xlsx"), None);
        assert_eq!(database_name("sales/2024.csv", "sales", "xlsx"), None);
        assert_eq!(database_name("sales/2024xlsx", "sales", "xlsx"), None);
        assert_eq!(database_name("sales/.xlsx", "sales", "xlsx"), None);
        assert_eq!(database_name("sales/q1/.xlsx", "sales", "xlsx"), None);
    }

    #[test]
    fn builds_object_keys() {
        assert_eq!(object_key("sales", "2024", "xlsx"), "sales/2024.xlsx");
        assert_eq!(object_key("", "2024", "ods"), "2024.ods");
        let name = database_name(&object_key("a/b", "c", "xlsm"), "a/b", "xlsm");
        assert_eq!(name.as_deref(), Some("c"));
    }
}
