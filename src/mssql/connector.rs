use async_trait::async_trait;
use futures_util::TryStreamExt;
use tiberius::QueryItem;
use tracing::{debug, trace};

use super::batch::compile;
use super::client::{MssqlClient, create_mssql_client};
use super::config::MssqlOptions;
use super::query::{bind_query_params, column_meta, convert_row};
use super::stream::EventTranslator;
use crate::driver::{Connector, DriverConnection};
use crate::error::TdsHelperError;
use crate::events::EventSink;
use crate::request::{OperationKind, Request};

/// Opens a fresh tiberius session per execution.
#[derive(Debug, Clone)]
pub struct MssqlConnector {
    options: MssqlOptions,
}

impl MssqlConnector {
    #[must_use]
    pub fn new(options: MssqlOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &MssqlOptions {
        &self.options
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    type Connection = MssqlConnection;

    async fn connect(&self) -> Result<MssqlConnection, TdsHelperError> {
        let client = create_mssql_client(&self.options).await?;
        debug!("connection established");
        Ok(MssqlConnection { client })
    }
}

/// One open SQL Server session.
pub struct MssqlConnection {
    client: MssqlClient,
}

#[async_trait]
impl DriverConnection for MssqlConnection {
    async fn submit(
        &mut self,
        request: &Request,
        sink: &mut dyn EventSink,
    ) -> Result<(), TdsHelperError> {
        let compiled = compile(request)?;
        trace!(sql = %compiled.sql, binds = compiled.binds.len(), "compiled request");

        let mut stream = if request.kind() == OperationKind::Batch {
            self.client.simple_query(compiled.sql.as_str()).await?
        } else {
            bind_query_params(&compiled.sql, &compiled.binds)
                .query(&mut self.client)
                .await?
        };

        let mut translator = EventTranslator::new(request.kind());
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) => {
                    translator.on_metadata(column_meta(meta.columns()), sink);
                }
                QueryItem::Row(row) => translator.on_row(convert_row(&row), sink),
            }
        }
        translator.finish(sink);
        Ok(())
    }

    async fn close(self) -> Result<(), TdsHelperError> {
        self.client.close().await?;
        Ok(())
    }
}
