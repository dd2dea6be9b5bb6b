//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::driver::{Connector, DriverConnection};
pub use crate::error::TdsHelperError;
pub use crate::events::{ColumnMeta, DriverEvent, EventSink};
pub use crate::executor::{Executor, exec_sp, exec_sql, exec_sql_batch};
pub use crate::mssql::{MssqlConnector, MssqlOptions, MssqlOptionsBuilder};
pub use crate::params::{
    AltNames, MergeOptions, ParamDef, ParamMap, RETURN_VALUE_KEY, ValueMap, ValueSlot, merge,
    merge_with,
};
pub use crate::pipeline::{Execution, PipelineState, execute};
pub use crate::request::{BoundParam, OperationKind, Request};
pub use crate::results::{AccumulationMode, CustomDbRow, QueryOutput, ResultSet};
pub use crate::types::{ParamOptions, RowValues, SqlType};
