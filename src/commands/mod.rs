pub mod cancel;
pub mod once;
pub mod resources;
pub mod watch;

use std::io::{self, Stdout};
use std::sync::Arc;

use clap::ValueEnum;
use roomsync_core::config::RoomSyncConfig;
use roomsync_core::engine::Reconciler;
use roomsync_core::poller::Poller;
use roomsync_core::sink::{EventSink, JsonLines};
use roomsync_core::{ChangeEvent, RoomSyncResult};

use crate::render::Render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Colored, human-readable lines
    Text,
    /// One JSON object per event, for downstream consumers
    Json,
}

/// Writes change events to stdout in the chosen format.
pub enum Output {
    Text,
    Json(JsonLines<Stdout>),
}

impl Output {
    pub fn new(format: Format) -> Self {
        match format {
            Format::Text => Output::Text,
            Format::Json => Output::Json(JsonLines::new(io::stdout())),
        }
    }
}

impl EventSink for Output {
    fn emit(&mut self, event: ChangeEvent) -> RoomSyncResult<()> {
        match self {
            Output::Text => {
                println!("{}", event.render());
                Ok(())
            }
            Output::Json(sink) => sink.emit(event),
        }
    }
}

pub fn build_poller(config: &RoomSyncConfig, format: Format) -> Poller<Output> {
    Poller::new(
        config.directory(),
        Arc::new(config.remote()),
        Reconciler::new(Output::new(format)),
        config.window_months,
    )
}

/// Human-readable progress goes to stderr in text mode, nowhere in JSON mode.
pub fn report(format: Format, text: impl FnOnce() -> String) {
    if format == Format::Text {
        eprintln!("{}", text());
    }
}
