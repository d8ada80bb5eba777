//! Event sinks consume change notifications from the reconciler.
//!
//! Delivery is best-effort. The reconciler logs a failed `emit` and moves on;
//! it never retries and never rolls back the mirror.

use std::io::Write;

use tokio::sync::mpsc::UnboundedSender;

use crate::change::{ChangeEvent, ChangeKind};
use crate::error::{RoomSyncError, RoomSyncResult};

pub trait EventSink {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        (**self).emit(event)
    }
}

impl EventSink for Vec<ChangeEvent> {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        self.push(event);
        Ok(())
    }
}

/// Keeps every emitted event in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Vec<ChangeEvent>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.events.iter().map(ChangeEvent::kind).collect()
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for Recorder {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLines<W: Write> {
    writer: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(writer: W) -> Self {
        JsonLines { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLines<W> {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        let line = serde_json::to_string(&event)
            .map_err(|e| RoomSyncError::Serialization(e.to_string()))?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards events to an in-process consumer task.
pub struct Channel {
    sender: UnboundedSender<ChangeEvent>,
}

impl Channel {
    pub fn new(sender: UnboundedSender<ChangeEvent>) -> Self {
        Channel { sender }
    }
}

impl EventSink for Channel {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        self.sender
            .send(event)
            .map_err(|_| RoomSyncError::Sink("event receiver dropped".into()))
    }
}

/// Logs each event at info level.
#[derive(Debug, Default)]
pub struct Tracing;

impl EventSink for Tracing {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        let appointment = event.appointment();
        tracing::info!(
            kind = %event.kind(),
            stable_id = %appointment.stable_id,
            subject = %appointment.subject,
            "appointment change"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_test_appointment;
    use tokio::sync::mpsc;

    fn make_test_event() -> ChangeEvent {
        ChangeEvent::New {
            appointment: make_test_appointment("a", "1"),
        }
    }

    #[test]
    fn test_json_lines_writes_one_line_per_event() {
        let mut sink = JsonLines::new(Vec::new());
        sink.emit(make_test_event()).unwrap();
        sink.emit(make_test_event()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: ChangeEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, make_test_event());
    }

    #[test]
    fn test_channel_reports_closed_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = Channel::new(tx);

        sink.emit(make_test_event()).unwrap();
        assert_eq!(rx.try_recv().unwrap().kind(), ChangeKind::New);

        drop(rx);
        assert!(matches!(
            sink.emit(make_test_event()),
            Err(RoomSyncError::Sink(_))
        ));
    }

    #[test]
    fn test_recorder_take_drains() {
        let mut recorder = Recorder::new();
        recorder.emit(make_test_event()).unwrap();

        assert_eq!(recorder.kinds(), vec![ChangeKind::New]);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.events().is_empty());
    }
}
