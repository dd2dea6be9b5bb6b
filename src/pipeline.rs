//! One request/response cycle: connect, bind, attach, submit, collect, close.

use tracing::{debug, trace, warn};

use crate::driver::{Connector, DriverConnection};
use crate::error::TdsHelperError;
use crate::events::{DriverEvent, EventSink};
use crate::params::{ParamDef, ParamMap, RETURN_VALUE_KEY};
use crate::request::{OperationKind, Request};
use crate::results::{QueryOutput, ResultAccumulator};
use crate::types::{RowValues, SqlType};

/// Stages of one execution. Every stage after `Connected` may go straight to
/// `Rejected`; both `Resolved` and `Rejected` end in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unconnected,
    Connected,
    Bound,
    Parameterized,
    Submitted,
    Resolved,
    Rejected,
    Closed,
}

/// The result of a successful execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Rows, or the decoded JSON/XML document.
    pub output: QueryOutput,
    /// The parameters as sent, with output values written back and, for procedure
    /// calls, the return code under `returnValue`.
    pub params: ParamMap,
}

impl Execution {
    /// The procedure return code, if this was a procedure call.
    #[must_use]
    pub fn return_value(&self) -> Option<i64> {
        self.params.return_value()
    }
}

struct Tracker(PipelineState);

impl Tracker {
    fn advance(&mut self, next: PipelineState) {
        trace!(from = ?self.0, to = ?next, "pipeline");
        self.0 = next;
    }
}

/// Event consumer for one request: feeds the accumulator and writes output values
/// into its own copy of the parameters.
struct RequestSink {
    kind: OperationKind,
    accumulator: ResultAccumulator,
    params: ParamMap,
}

impl RequestSink {
    fn new(kind: OperationKind, params: ParamMap) -> Self {
        Self {
            kind,
            accumulator: ResultAccumulator::new(),
            params,
        }
    }

    fn finish(self) -> Result<Execution, TdsHelperError> {
        Ok(Execution {
            output: self.accumulator.finish()?,
            params: self.params,
        })
    }
}

impl EventSink for RequestSink {
    fn on_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::ColumnMetadata(columns) => {
                trace!(columns = columns.len(), "columnMetadata");
                self.accumulator.on_columns(&columns);
            }
            DriverEvent::Row(values) => self.accumulator.on_row(values),
            DriverEvent::DoneInProc { row_count, more } => {
                debug!(row_count, more, "doneInProc");
                self.accumulator.on_done(more);
            }
            DriverEvent::Done { row_count, more } => {
                debug!(row_count, more, "done");
                self.accumulator.on_done(more);
            }
            DriverEvent::DoneProc {
                row_count,
                more,
                return_value,
            } => {
                debug!(row_count, more, return_value, "doneProc");
                if self.kind != OperationKind::Batch {
                    self.params.insert(
                        RETURN_VALUE_KEY,
                        ParamDef::new(SqlType::Int).with_value(RowValues::Int(return_value)),
                    );
                }
                self.accumulator.on_done(more);
            }
            DriverEvent::ReturnValue { name, value } => {
                debug!(param = %name, ?value, "returnValue");
                let name = name.trim_start_matches('@');
                if let Some(def) = self.params.get_mut(name) {
                    def.value = Some(value);
                }
            }
        }
    }
}

/// Run one request on a fresh connection from `connector`.
///
/// The connection is closed exactly once whenever it was opened, whatever the
/// outcome. A failure to close is logged and does not replace the outcome.
///
/// # Errors
/// Returns the connect error (nothing is submitted), a
/// `TdsHelperError::MissingRequiredParameter` or `ParameterError` from attachment,
/// the driver's request error, or `ResultParseError` for malformed JSON output.
pub async fn execute<C: Connector>(
    connector: &C,
    kind: OperationKind,
    query: &str,
    params: Option<&ParamMap>,
) -> Result<Execution, TdsHelperError> {
    let mut state = Tracker(PipelineState::Unconnected);

    let mut conn = match connector.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            debug!(error = %e, "connection failed");
            return Err(e);
        }
    };
    state.advance(PipelineState::Connected);

    let outcome = run_request(&mut conn, kind, query, params, &mut state).await;
    match &outcome {
        Ok(_) => state.advance(PipelineState::Resolved),
        Err(e) => {
            debug!(error = %e, "request failed");
            state.advance(PipelineState::Rejected);
        }
    }

    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close connection");
    }
    state.advance(PipelineState::Closed);

    outcome
}

async fn run_request<D: DriverConnection>(
    conn: &mut D,
    kind: OperationKind,
    query: &str,
    params: Option<&ParamMap>,
    state: &mut Tracker,
) -> Result<Execution, TdsHelperError> {
    let mut request = Request::new(kind, query);
    let mut sink = RequestSink::new(kind, params.cloned().unwrap_or_default());
    state.advance(PipelineState::Bound);

    if let Some(params) = params {
        request.attach_params(params)?;
    }
    state.advance(PipelineState::Parameterized);

    debug!(query, params = request.params().len(), "request");
    state.advance(PipelineState::Submitted);
    conn.submit(&request, &mut sink).await?;

    sink.finish()
}
