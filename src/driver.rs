//! The seam between the execution pipeline and a TDS driver.
//!
//! [`MssqlConnector`](crate::mssql::MssqlConnector) implements these traits over
//! tiberius; tests implement them with scripted events.

use async_trait::async_trait;

use crate::error::TdsHelperError;
use crate::events::EventSink;
use crate::request::Request;

/// Opens one new connection per call.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: DriverConnection;

    /// # Errors
    /// Returns `TdsHelperError::ConnectionError` (or a driver error) if the session
    /// cannot be established.
    async fn connect(&self) -> Result<Self::Connection, TdsHelperError>;
}

/// One open database session.
#[async_trait]
pub trait DriverConnection: Send {
    /// Run `request`, delivering its events to `sink` in order, and return the final
    /// completion status.
    ///
    /// # Errors
    /// Returns the error the driver reported, mid-stream or at completion.
    async fn submit(
        &mut self,
        request: &Request,
        sink: &mut dyn EventSink,
    ) -> Result<(), TdsHelperError>;

    /// Close the session. Consuming `self` makes a second close impossible.
    ///
    /// # Errors
    /// Returns the driver's error if the session did not shut down cleanly.
    async fn close(self) -> Result<(), TdsHelperError>;
}
