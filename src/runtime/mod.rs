//! High-level execution runtime: superstep runner and configuration.

pub mod config;
pub mod runner;

pub use config::{EventBusConfig, RuntimeConfig, SinkConfig};
pub use runner::{RunnerError, StepReport, WorkflowRunner};
