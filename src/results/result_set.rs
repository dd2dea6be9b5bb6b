use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::row::{CustomDbRow, column_index};
use crate::types::RowValues;

/// Rows of one tabular result
///
/// Column names are stored once and shared with every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Set the column names used by rows added after this call
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Arc::new(column_index(&column_names));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    ///
    /// Rows arriving before any column names are known get positional names
    /// (`column0`, `column1`, ...).
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if self.column_names.is_none() {
            let names = (0..row_values.len()).map(|i| format!("column{i}")).collect();
            self.set_column_names(Arc::new(names));
        }
        let column_names = self.column_names.clone().unwrap_or_default();

        self.results.push(CustomDbRow {
            column_names,
            rows: row_values,
            column_index_cache: Arc::clone(&self.column_index),
        });
    }

    /// Drop all rows, keeping the current column names.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Render every row as a JSON object, in order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.results.iter().map(CustomDbRow::to_json_object).collect())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a CustomDbRow;
    type IntoIter = std::slice::Iter<'a, CustomDbRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
