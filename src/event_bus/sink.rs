use std::io::{self, Result as IoResult, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::event::Event;

/// Destination for delivered events. The sink owns the rendering decision;
/// the bus only guarantees in-order delivery per sink.
pub trait EventSink: Send + Sync {
    fn handle(&mut self, event: &Event) -> IoResult<()>;
}

/// Writes each event as one line on stdout, using the event's
/// [`Display`](std::fmt::Display) form.
#[derive(Default)]
pub struct StdOutSink;

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{event}")?;
        out.flush()
    }
}

/// Collects events in memory. Clones share the same buffer, so a test can
/// keep one handle and give the other to the bus.
#[derive(Clone, Default)]
pub struct MemorySink {
    captured: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything captured so far.
    pub fn snapshot(&self) -> Vec<Event> {
        self.captured.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.captured.lock().unwrap().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        self.captured.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Forwards events into a tokio mpsc channel for async consumers, e.g. a
/// live progress view over a running workflow.
///
/// ```no_run
/// use tokio::sync::mpsc;
/// use svarflyt::event_bus::{ChannelSink, EventBus};
///
/// let (tx, mut rx) = mpsc::unbounded_channel();
/// let bus = EventBus::default();
/// bus.add_sink(ChannelSink::new(tx));
///
/// tokio::spawn(async move {
///     while let Some(event) = rx.recv().await {
///         println!("{event}");
///     }
/// });
/// ```
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
