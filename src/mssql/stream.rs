use tracing::trace;

use super::batch::OUTPUT_MARKER;
use crate::events::{ColumnMeta, DriverEvent, EventSink};
use crate::request::OperationKind;
use crate::types::RowValues;

/// Turns tiberius' flat stream of metadata and rows into completion-delimited events.
///
/// tiberius does not surface DONE tokens, so a result set is closed when the next one
/// starts (`more = true`) or the stream ends (`more = false`). The trailer result set
/// becomes `ReturnValue` events and, for procedures, the `DoneProc` return code.
/// `DoneProc` carries the rows of every result set the procedure returned; the trailer
/// is not counted.
#[derive(Debug)]
pub(crate) struct EventTranslator {
    kind: OperationKind,
    open_rows: Option<u64>,
    total_rows: u64,
    trailer_columns: Option<Vec<String>>,
    return_value: i64,
    completed: bool,
}

impl EventTranslator {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            open_rows: None,
            total_rows: 0,
            trailer_columns: None,
            return_value: 0,
            completed: false,
        }
    }

    pub fn on_metadata(&mut self, columns: Vec<ColumnMeta>, sink: &mut dyn EventSink) {
        if self.kind != OperationKind::Batch
            && columns.first().is_some_and(|c| c.name == OUTPUT_MARKER)
        {
            trace!("output trailer");
            self.close_open(false, sink);
            self.trailer_columns = Some(columns.into_iter().skip(1).map(|c| c.name).collect());
            return;
        }
        self.close_open(true, sink);
        sink.on_event(DriverEvent::ColumnMetadata(columns));
        self.open_rows = Some(0);
    }

    pub fn on_row(&mut self, values: Vec<RowValues>, sink: &mut dyn EventSink) {
        if let Some(names) = &self.trailer_columns {
            let mut cells = values.into_iter();
            if let Some(RowValues::Int(code)) = cells.next() {
                self.return_value = code;
            }
            for (name, value) in names.iter().zip(cells) {
                sink.on_event(DriverEvent::ReturnValue {
                    name: name.clone(),
                    value,
                });
            }
            return;
        }
        if let Some(count) = self.open_rows.as_mut() {
            *count += 1;
        }
        sink.on_event(DriverEvent::Row(values));
    }

    pub fn finish(&mut self, sink: &mut dyn EventSink) {
        self.close_open(false, sink);
        match self.kind {
            OperationKind::Procedure => sink.on_event(DriverEvent::DoneProc {
                row_count: self.total_rows,
                more: false,
                return_value: self.return_value,
            }),
            _ if !self.completed => sink.on_event(DriverEvent::Done {
                row_count: 0,
                more: false,
            }),
            _ => {}
        }
    }

    fn close_open(&mut self, more: bool, sink: &mut dyn EventSink) {
        let Some(row_count) = self.open_rows.take() else {
            return;
        };
        self.completed = true;
        self.total_rows += row_count;
        let event = match self.kind {
            OperationKind::Procedure => DriverEvent::DoneInProc { row_count, more },
            _ => DriverEvent::Done { row_count, more },
        };
        sink.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<DriverEvent>);

    impl EventSink for Recorder {
        fn on_event(&mut self, event: DriverEvent) {
            self.0.push(event);
        }
    }

    fn cols(names: &[&str]) -> Vec<ColumnMeta> {
        names.iter().map(|n| ColumnMeta::new(*n, "Int4")).collect()
    }

    #[test]
    fn delimits_result_sets() {
        let mut sink = Recorder::default();
        let mut t = EventTranslator::new(OperationKind::Statement);
        t.on_metadata(cols(&["a"]), &mut sink);
        t.on_row(vec![RowValues::Int(1)], &mut sink);
        t.on_metadata(cols(&["b"]), &mut sink);
        t.on_row(vec![RowValues::Int(2)], &mut sink);
        t.on_row(vec![RowValues::Int(3)], &mut sink);
        t.finish(&mut sink);

        assert_eq!(
            sink.0,
            vec![
                DriverEvent::ColumnMetadata(cols(&["a"])),
                DriverEvent::Row(vec![RowValues::Int(1)]),
                DriverEvent::Done { row_count: 1, more: true },
                DriverEvent::ColumnMetadata(cols(&["b"])),
                DriverEvent::Row(vec![RowValues::Int(2)]),
                DriverEvent::Row(vec![RowValues::Int(3)]),
                DriverEvent::Done { row_count: 2, more: false },
            ]
        );
    }

    #[test]
    fn statement_without_result_sets_still_completes() {
        let mut sink = Recorder::default();
        let mut t = EventTranslator::new(OperationKind::Batch);
        t.finish(&mut sink);
        assert_eq!(sink.0, vec![DriverEvent::Done { row_count: 0, more: false }]);
    }

    #[test]
    fn procedure_completion_counts_rows_of_every_set() {
        let mut sink = Recorder::default();
        let mut t = EventTranslator::new(OperationKind::Procedure);
        t.on_metadata(cols(&["a"]), &mut sink);
        t.on_row(vec![RowValues::Int(1)], &mut sink);
        t.on_row(vec![RowValues::Int(2)], &mut sink);
        t.on_metadata(cols(&["b"]), &mut sink);
        t.on_row(vec![RowValues::Int(3)], &mut sink);
        t.on_metadata(cols(&[OUTPUT_MARKER]), &mut sink);
        t.on_row(vec![RowValues::Int(0)], &mut sink);
        t.finish(&mut sink);

        assert_eq!(
            sink.0.last(),
            Some(&DriverEvent::DoneProc {
                row_count: 3,
                more: false,
                return_value: 0
            })
        );
    }

    #[test]
    fn procedure_trailer_becomes_return_values() {
        let mut sink = Recorder::default();
        let mut t = EventTranslator::new(OperationKind::Procedure);
        t.on_metadata(cols(&["id"]), &mut sink);
        t.on_row(vec![RowValues::Int(10)], &mut sink);
        t.on_metadata(cols(&[OUTPUT_MARKER, "NewId"]), &mut sink);
        t.on_row(vec![RowValues::Int(3), RowValues::Int(42)], &mut sink);
        t.finish(&mut sink);

        assert_eq!(
            sink.0,
            vec![
                DriverEvent::ColumnMetadata(cols(&["id"])),
                DriverEvent::Row(vec![RowValues::Int(10)]),
                DriverEvent::DoneInProc { row_count: 1, more: false },
                DriverEvent::ReturnValue {
                    name: "NewId".into(),
                    value: RowValues::Int(42)
                },
                DriverEvent::DoneProc {
                    row_count: 1,
                    more: false,
                    return_value: 3
                },
            ]
        );
    }
}
