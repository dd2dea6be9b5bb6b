// MSSQL module - runs requests against SQL Server through tiberius
//
// - config: connection options and their tiberius configuration
// - client: raw client creation (TCP, SQL Browser, routing)
// - batch: compiling a request into parameterised T-SQL
// - query: parameter binding and cell conversion
// - stream: turning tiberius' query stream into driver events
// - connector: the `Connector` / `DriverConnection` implementation

pub mod client;
pub mod config;
pub mod connector;
pub mod query;

mod batch;
mod stream;

pub use client::{MssqlClient, create_mssql_client};
pub use config::{MssqlOptions, MssqlOptionsBuilder};
pub use connector::{MssqlConnection, MssqlConnector};
