//! Decoupled progress streaming for workflow runs.
//!
//! Nodes emit [`Event`]s through their context; the runner-owned [`EventBus`]
//! forwards them to pluggable [`EventSink`]s (stdout, memory, channel).

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
