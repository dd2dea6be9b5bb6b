#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tds_helper::prelude::*;

/// Counters shared by a scripted connector and every connection it opens.
#[derive(Debug, Default)]
pub struct Stats {
    pub connects: AtomicUsize,
    pub submits: AtomicUsize,
    pub closes: AtomicUsize,
    pub last_request: Mutex<Option<Request>>,
}

impl Stats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Request {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("a request was submitted")
    }
}

/// Plays back a fixed event sequence instead of talking to SQL Server.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    pub connect_error: Option<String>,
    pub events: Vec<DriverEvent>,
    pub failure: Option<String>,
    pub stats: Arc<Stats>,
}

impl ScriptedConnector {
    pub fn new(events: Vec<DriverEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn failing_connect(message: &str) -> Self {
        Self {
            connect_error: Some(message.to_owned()),
            ..Self::default()
        }
    }

    pub fn failing_after(events: Vec<DriverEvent>, message: &str) -> Self {
        Self {
            events,
            failure: Some(message.to_owned()),
            ..Self::default()
        }
    }
}

pub struct ScriptedConnection {
    events: Vec<DriverEvent>,
    failure: Option<String>,
    stats: Arc<Stats>,
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self) -> Result<ScriptedConnection, TdsHelperError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.connect_error {
            return Err(TdsHelperError::ConnectionError(message.clone()));
        }
        Ok(ScriptedConnection {
            events: self.events.clone(),
            failure: self.failure.clone(),
            stats: Arc::clone(&self.stats),
        })
    }
}

#[async_trait]
impl DriverConnection for ScriptedConnection {
    async fn submit(
        &mut self,
        request: &Request,
        sink: &mut dyn EventSink,
    ) -> Result<(), TdsHelperError> {
        self.stats.submits.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_request.lock().unwrap() = Some(request.clone());
        for event in self.events.drain(..) {
            sink.on_event(event);
        }
        match &self.failure {
            Some(message) => Err(TdsHelperError::RequestError(message.clone())),
            None => Ok(()),
        }
    }

    async fn close(self) -> Result<(), TdsHelperError> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn columns(names: &[&str]) -> DriverEvent {
    DriverEvent::ColumnMetadata(names.iter().map(|n| ColumnMeta::new(*n, "NVarchar")).collect())
}

pub fn row(values: Vec<RowValues>) -> DriverEvent {
    DriverEvent::Row(values)
}
