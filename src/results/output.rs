use serde_json::Value as JsonValue;

use super::result_set::ResultSet;

/// The collected result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Row objects of the last result set.
    Rows(ResultSet),
    /// Decoded `FOR JSON` output.
    Json(JsonValue),
    /// Concatenated `FOR XML` output.
    Xml(String),
}

impl QueryOutput {
    #[must_use]
    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn json(&self) -> Option<&JsonValue> {
        match self {
            QueryOutput::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn xml(&self) -> Option<&str> {
        match self {
            QueryOutput::Xml(text) => Some(text),
            _ => None,
        }
    }

    /// Collapse into one JSON value: rows become an array of objects, XML a string.
    #[must_use]
    pub fn into_json(self) -> JsonValue {
        match self {
            QueryOutput::Rows(rows) => rows.to_json(),
            QueryOutput::Json(value) => value,
            QueryOutput::Xml(text) => JsonValue::String(text),
        }
    }
}
