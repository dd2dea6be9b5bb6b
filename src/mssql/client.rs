use tiberius::{Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use super::config::MssqlOptions;
use crate::error::TdsHelperError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Open a new SQL Server session for `options`.
///
/// Named instances are resolved through the SQL Browser. A routing redirect from the
/// server (Azure SQL gateways) is followed once.
///
/// # Errors
/// Returns `TdsHelperError::ConnectionError` if the TCP connection or the TDS login
/// fails, or `TdsHelperError::ConfigError` for invalid options.
pub async fn create_mssql_client(options: &MssqlOptions) -> Result<MssqlClient, TdsHelperError> {
    let config = options.to_tiberius_config()?;
    debug!(addr = %config.get_addr(), named = options.uses_named_instance(), "connect");

    let tcp = open_stream(&config, true).await?;
    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "server requested routing");
            let mut routed = config;
            routed.host(&host);
            routed.port(port);
            let tcp = open_stream(&routed, false).await?;
            Client::connect(routed, tcp.compat_write())
                .await
                .map_err(connection_error)
        }
        Err(e) => Err(connection_error(e)),
    }
}

/// Connect to the configured address. With `via_browser`, a configured instance name
/// is first resolved to its port through the SQL Browser; without an instance name
/// this is a direct connect.
async fn open_stream(config: &TiberiusConfig, via_browser: bool) -> Result<TcpStream, TdsHelperError> {
    let tcp = if via_browser {
        TcpStream::connect_named(config).await
    } else {
        TcpStream::connect(config.get_addr()).await.map_err(tiberius::error::Error::from)
    }
    .map_err(|e| TdsHelperError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)?;
    Ok(tcp)
}

fn connection_error(e: tiberius::error::Error) -> TdsHelperError {
    TdsHelperError::ConnectionError(format!("SQL Server connection error: {e}"))
}
