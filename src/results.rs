mod accumulator;
mod output;
mod result_set;
mod row;

pub use accumulator::{AccumulationMode, ResultAccumulator};
pub use output::QueryOutput;
pub use result_set::ResultSet;
pub use row::CustomDbRow;
