use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// One data record: column name to displayed cell text.
///
/// Rows are sparse. A column whose cell is empty in the sheet is absent
/// rather than mapped to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    columns: IndexMap<String, String>,
}

impl Row {
    /// Create an empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the named column, if the row has one
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    /// Set a column value, replacing any previous value
    pub fn set_column(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.columns.insert(name.into(), value.into());
    }

    /// A row without any populated cell
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of populated columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Alias of [`Row::is_blank`]
    pub fn is_empty(&self) -> bool {
        self.is_blank()
    }

    /// Iterate over `(column, value)` pairs in cell order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrow the underlying column map
    pub fn columns(&self) -> &IndexMap<String, String> {
        &self.columns
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set_column(name, value);
        }
        row
    }
}

/// Renders the row as a JSON object, e.g. `{"Id":"42","Name":"Ann"}`.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.columns).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
