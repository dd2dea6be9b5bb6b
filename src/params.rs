//! Declarative parameter definitions and the merge of caller values into them.
//!
//! A [`ParamMap`] describes every parameter a statement or stored procedure takes.
//! [`merge`] looks each parameter up in a [`ValueMap`] (by name, lowercase name, and
//! alternate names) and returns a copy of the map with values filled in:
//! ```rust
//! use tds_helper::prelude::*;
//!
//! let defs = ParamMap::new()
//!     .with("AccountID", ParamDef::new(SqlType::Int).required())
//!     .with("UserName", ParamDef::new(SqlType::VarChar).required().alt("login"));
//! let values = ValueMap::new().with("accountid", 7).with("login", "ann");
//!
//! let merged = merge(&defs, &values).unwrap();
//! assert_eq!(merged.value("UserName"), Some(&RowValues::from("ann")));
//! ```

mod definition;
mod merge;
mod values;

pub use definition::{AltNames, ParamDef, ParamMap, RETURN_VALUE_KEY};
pub use merge::{MergeOptions, merge, merge_with};
pub use values::{ValueMap, ValueSlot};
