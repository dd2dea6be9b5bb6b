//! Typed notifications delivered by a driver connection while a request runs.

use crate::types::RowValues;

/// Name and driver type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Events in the order the driver produces them.
///
/// `more` on the completion events means another result set follows.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// A new result set starts with these columns.
    ColumnMetadata(Vec<ColumnMeta>),
    /// One row of the current result set, in column order.
    Row(Vec<RowValues>),
    /// A statement inside a stored procedure completed.
    DoneInProc { row_count: u64, more: bool },
    /// A stored procedure completed with its return code.
    DoneProc {
        row_count: u64,
        more: bool,
        return_value: i64,
    },
    /// A statement of a batch completed.
    Done { row_count: u64, more: bool },
    /// An output parameter's final value.
    ReturnValue { name: String, value: RowValues },
}

/// Receiver of [`DriverEvent`]s, driven synchronously by the connection.
pub trait EventSink: Send {
    fn on_event(&mut self, event: DriverEvent);
}
