//! Concurrent execution of one superstep's frontier.
//!
//! Every node in the frontier is spawned as its own tokio task against the
//! same pre-barrier snapshot. Results are collected in frontier order so the
//! barrier merge stays deterministic regardless of task completion order.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::event_bus::Event;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate};
use crate::types::NodeKind;

/// Errors surfaced while running a superstep.
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    /// The frontier referenced a node that is not registered in the graph.
    #[error("frontier references unregistered node: {kind}")]
    #[diagnostic(code(svarflyt::scheduler::missing_node))]
    MissingNode { kind: String },

    /// A node returned a fatal error.
    #[error("node {kind} failed at step {step}: {source}")]
    #[diagnostic(code(svarflyt::scheduler::node_run))]
    NodeRun {
        kind: String,
        step: u64,
        #[source]
        source: NodeError,
    },

    /// A node task panicked or was cancelled.
    #[error("node {kind} panicked at step {step}")]
    #[diagnostic(code(svarflyt::scheduler::panicked))]
    Panicked { kind: String, step: u64 },
}

/// Runs all frontier nodes of one superstep concurrently.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Execute `frontier` against `snapshot`, returning `(kind, update)`
    /// pairs in frontier order. Virtual `Start`/`End` entries are skipped.
    #[instrument(skip(self, nodes, snapshot, event_sender), fields(step, frontier_len = frontier.len()))]
    pub async fn run_step(
        &self,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: &[NodeKind],
        snapshot: StateSnapshot,
        step: u64,
        event_sender: flume::Sender<Event>,
    ) -> Result<Vec<(NodeKind, StateUpdate)>, SchedulerError> {
        let mut handles = Vec::with_capacity(frontier.len());
        for kind in frontier {
            if kind.is_start() || kind.is_end() {
                continue;
            }
            let node = nodes
                .get(kind)
                .cloned()
                .ok_or_else(|| SchedulerError::MissingNode {
                    kind: kind.to_string(),
                })?;
            let ctx = NodeContext {
                node_id: kind.to_string(),
                step,
                event_bus_sender: event_sender.clone(),
            };
            let snapshot = snapshot.clone();
            let kind = kind.clone();
            handles.push((
                kind.clone(),
                tokio::spawn(async move { node.run(snapshot, ctx).await }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let outcome: Result<StateUpdate, NodeError> =
                handle.await.map_err(|_| SchedulerError::Panicked {
                    kind: kind.to_string(),
                    step,
                })?;
            let update = outcome.map_err(|source| SchedulerError::NodeRun {
                kind: kind.to_string(),
                step,
                source,
            })?;
            results.push((kind, update));
        }
        Ok(results)
    }
}
