//! Workflow graph definition and compilation.
//!
//! A graph is built fluently with [`GraphBuilder`], validated and frozen by
//! [`GraphBuilder::compile`], and executed by the
//! [`runtime`](crate::runtime). Static edges define topology; conditional
//! edges route dynamically on the merged state after each superstep.

pub mod builder;
pub mod compilation;
pub mod edges;

pub use builder::GraphBuilder;
pub use compilation::{GraphCompileError, Workflow};
pub use edges::{ConditionalEdge, EdgePredicate};
