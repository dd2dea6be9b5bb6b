//! Declarative parameters and single-shot execution helpers for SQL Server.
//!
//! Declare the parameters a statement or stored procedure takes, [`merge`] the
//! caller's values into them, and run the request on a fresh connection. Results come
//! back as row objects, or as one decoded document when the statement uses
//! `FOR JSON` / `FOR XML`.
//!
//! ```rust,no_run
//! use tds_helper::prelude::*;
//!
//! # async fn run() -> Result<(), TdsHelperError> {
//! let options = MssqlOptions::from_env()?;
//! let params = ParamMap::new()
//!     .with("AccountID", ParamDef::new(SqlType::Int).required())
//!     .with("UserName", ParamDef::new(SqlType::VarChar).required());
//! let values = ValueMap::new().with("accountid", 12).with("username", "ann");
//!
//! let result = exec_sql(
//!     &options,
//!     "delete from users where accountid = @AccountID and username = @UserName",
//!     &merge(&params, &values)?,
//! )
//! .await?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod events;
pub mod executor;
pub mod mssql;
pub mod params;
pub mod pipeline;
pub mod prelude;
pub mod request;
pub mod results;
pub mod types;

pub use error::TdsHelperError;
pub use executor::{Executor, exec_sp, exec_sql, exec_sql_batch};
pub use params::{MergeOptions, ParamDef, ParamMap, ValueMap, merge, merge_with};
pub use pipeline::{Execution, execute};
pub use results::QueryOutput;
pub use types::{RowValues, SqlType};
