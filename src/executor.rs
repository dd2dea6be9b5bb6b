//! Entry points: the [`Executor`] facade and one-shot helper functions.

use tracing::dispatcher::{self, Dispatch};
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, Span, info_span};

use crate::driver::Connector;
use crate::error::TdsHelperError;
use crate::mssql::{MssqlConnector, MssqlOptions};
use crate::params::{MergeOptions, ParamMap, ValueMap, merge_with};
use crate::pipeline::{Execution, execute};
use crate::request::OperationKind;

/// Runs statements, procedures and batches, each on its own connection.
///
/// Logging goes through `tracing`. With [`with_dispatch`](Executor::with_dispatch)
/// every call is recorded by the given dispatcher instead of the ambient one:
/// ```rust,no_run
/// use tds_helper::prelude::*;
///
/// # async fn run() -> Result<(), TdsHelperError> {
/// let executor = Executor::new(MssqlConnector::new(MssqlOptions::from_env()?))
///     .with_dispatch(tracing::Dispatch::none());
/// let params = ParamMap::new().with("Id", ParamDef::new(SqlType::Int).required());
/// let params = executor.merge(&params, &ValueMap::new().with("id", 7))?;
/// let result = executor.exec_sql("select * from users where id = @Id", &params).await?;
/// # let _ = result;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Executor<C = MssqlConnector> {
    connector: C,
    merge_options: MergeOptions,
    dispatch: Option<Dispatch>,
}

impl<C: Connector> Executor<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            merge_options: MergeOptions::default(),
            dispatch: None,
        }
    }

    #[must_use]
    pub fn with_merge_options(mut self, merge_options: MergeOptions) -> Self {
        self.merge_options = merge_options;
        self
    }

    /// Record this executor's logs with `dispatch`.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Merge caller values into `defs` using this executor's merge options.
    ///
    /// # Errors
    /// See [`merge_with`].
    pub fn merge(&self, defs: &ParamMap, values: &ValueMap) -> Result<ParamMap, TdsHelperError> {
        self.in_dispatch(|| merge_with(defs, values, self.merge_options))
    }

    /// Execute arbitrary SQL.
    ///
    /// # Errors
    /// See [`execute`].
    pub async fn exec_sql(&self, query: &str, params: &ParamMap) -> Result<Execution, TdsHelperError> {
        self.run(OperationKind::Statement, query, Some(params)).await
    }

    /// Execute a stored procedure. `procedure` is the (optionally schema-qualified) name.
    ///
    /// # Errors
    /// See [`execute`].
    pub async fn exec_sp(&self, procedure: &str, params: &ParamMap) -> Result<Execution, TdsHelperError> {
        self.run(OperationKind::Procedure, procedure, Some(params)).await
    }

    /// Execute a batch without parameters.
    ///
    /// # Errors
    /// See [`execute`].
    pub async fn exec_sql_batch(&self, query: &str) -> Result<Execution, TdsHelperError> {
        self.run(OperationKind::Batch, query, None).await
    }

    async fn run(
        &self,
        kind: OperationKind,
        query: &str,
        params: Option<&ParamMap>,
    ) -> Result<Execution, TdsHelperError> {
        let span = self.in_dispatch(|| exec_span(kind, query));
        let fut = execute(&self.connector, kind, query, params).instrument(span);
        match &self.dispatch {
            Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
            None => fut.await,
        }
    }

    fn in_dispatch<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

fn exec_span(kind: OperationKind, query: &str) -> Span {
    info_span!("tds_exec", op = %kind, query = %query)
}

/// Execute arbitrary SQL on a new connection.
///
/// # Errors
/// See [`execute`].
pub async fn exec_sql(options: &MssqlOptions, query: &str, params: &ParamMap) -> Result<Execution, TdsHelperError> {
    Executor::new(MssqlConnector::new(options.clone()))
        .exec_sql(query, params)
        .await
}

/// Execute a stored procedure on a new connection.
///
/// # Errors
/// See [`execute`].
pub async fn exec_sp(options: &MssqlOptions, procedure: &str, params: &ParamMap) -> Result<Execution, TdsHelperError> {
    Executor::new(MssqlConnector::new(options.clone()))
        .exec_sp(procedure, params)
        .await
}

/// Execute a batch on a new connection.
///
/// # Errors
/// See [`execute`].
pub async fn exec_sql_batch(options: &MssqlOptions, query: &str) -> Result<Execution, TdsHelperError> {
    Executor::new(MssqlConnector::new(options.clone()))
        .exec_sql_batch(query)
        .await
}
