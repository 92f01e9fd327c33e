//! Runtime configuration for workflow execution.

use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};

/// Execution settings carried by a compiled workflow.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Hard limit on supersteps; exceeding it aborts the run. Backstops
    /// cyclic graphs whose own termination condition misbehaves.
    pub max_supersteps: u64,
    /// Sinks the runner's event bus is built with.
    pub event_bus: EventBusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_supersteps: Self::DEFAULT_MAX_SUPERSTEPS,
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_SUPERSTEPS: u64 = 64;

    /// Resolve settings from the environment (`SVARFLYT_MAX_SUPERSTEPS`),
    /// falling back to defaults. Reads a `.env` file when present.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let max_supersteps = std::env::var("SVARFLYT_MAX_SUPERSTEPS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Self::DEFAULT_MAX_SUPERSTEPS);
        Self {
            max_supersteps,
            event_bus: EventBusConfig::default(),
        }
    }

    #[must_use]
    pub fn with_max_supersteps(mut self, max_supersteps: u64) -> Self {
        self.max_supersteps = max_supersteps;
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }
}

/// Which sinks the runner wires into its event bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self {
            sinks: vec![SinkConfig::StdOut],
        }
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    /// Build an [`EventBus`] with the configured sinks.
    #[must_use]
    pub fn build_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self
            .sinks
            .iter()
            .map(|sink| match sink {
                SinkConfig::StdOut => Box::new(StdOutSink::default()) as Box<dyn EventSink>,
                SinkConfig::Memory => Box::new(MemorySink::new()) as Box<dyn EventSink>,
            })
            .collect();
        EventBus::with_sinks(sinks)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}
