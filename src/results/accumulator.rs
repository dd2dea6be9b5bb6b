use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use super::output::QueryOutput;
use super::result_set::ResultSet;
use crate::error::TdsHelperError;
use crate::events::ColumnMeta;
use crate::types::RowValues;

/// How rows of the current result set are collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccumulationMode {
    /// Rows are kept as row objects.
    #[default]
    Tabular,
    /// The single cell of each row is appended to a JSON document (`FOR JSON`).
    JsonText,
    /// The single cell of each row is appended to an XML document (`FOR XML`).
    XmlText,
}

impl AccumulationMode {
    /// A result set with exactly one column named `json_*` or `xml_*`
    /// (case-insensitive) is text, anything else is tabular.
    #[must_use]
    pub fn for_columns(columns: &[ColumnMeta]) -> Self {
        let [only] = columns else {
            return AccumulationMode::Tabular;
        };
        let name = only.name.to_ascii_lowercase();
        if name.starts_with("json_") {
            AccumulationMode::JsonText
        } else if name.starts_with("xml_") {
            AccumulationMode::XmlText
        } else {
            AccumulationMode::Tabular
        }
    }
}

/// Collects the rows of a request into a [`QueryOutput`].
///
/// A completion event with `more = true` arms a reset: the next row discards
/// everything collected so far, so only the last result set with rows survives.
/// Column metadata arriving while a reset is armed is held back until that row, so
/// an empty trailing result set never changes the output.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    mode: AccumulationMode,
    rows: ResultSet,
    text: String,
    clear_on_next_row: bool,
    pending_columns: Option<(AccumulationMode, Arc<Vec<String>>)>,
}

impl ResultAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> AccumulationMode {
        self.mode
    }

    pub fn on_columns(&mut self, columns: &[ColumnMeta]) {
        let mode = AccumulationMode::for_columns(columns);
        let names = Arc::new(columns.iter().map(|c| c.name.clone()).collect());
        if self.clear_on_next_row {
            self.pending_columns = Some((mode, names));
        } else {
            self.apply_columns(mode, names);
        }
    }

    fn apply_columns(&mut self, mode: AccumulationMode, names: Arc<Vec<String>>) {
        self.mode = mode;
        match mode {
            AccumulationMode::Tabular => self.rows.set_column_names(names),
            mode => {
                debug!(?mode, "text return type");
                self.text.clear();
            }
        }
    }

    pub fn on_row(&mut self, values: Vec<RowValues>) {
        if self.clear_on_next_row {
            trace!(discarded = self.rows.len(), "new result set");
            self.rows.clear();
            self.text.clear();
            self.clear_on_next_row = false;
            if let Some((mode, names)) = self.pending_columns.take() {
                self.apply_columns(mode, names);
            }
        }

        match self.mode {
            AccumulationMode::Tabular => self.rows.add_row_values(values),
            AccumulationMode::JsonText | AccumulationMode::XmlText => {
                match values.into_iter().next() {
                    Some(RowValues::Text(fragment)) => self.text.push_str(&fragment),
                    Some(RowValues::Null) | None => {}
                    Some(other) => self.text.push_str(&other.to_json().to_string()),
                }
            }
        }
    }

    pub fn on_done(&mut self, more: bool) {
        if more {
            self.clear_on_next_row = true;
        }
    }

    /// Produce the final output, decoding JSON text. Empty JSON text decodes to an
    /// empty array.
    ///
    /// # Errors
    /// Returns `TdsHelperError::ResultParseError` if the JSON text is malformed.
    pub fn finish(self) -> Result<QueryOutput, TdsHelperError> {
        match self.mode {
            AccumulationMode::Tabular => Ok(QueryOutput::Rows(self.rows)),
            AccumulationMode::JsonText if self.text.trim().is_empty() => {
                Ok(QueryOutput::Json(JsonValue::Array(Vec::new())))
            }
            AccumulationMode::JsonText => serde_json::from_str(&self.text)
                .map(QueryOutput::Json)
                .map_err(TdsHelperError::ResultParseError),
            AccumulationMode::XmlText => Ok(QueryOutput::Xml(self.text)),
        }
    }
}
