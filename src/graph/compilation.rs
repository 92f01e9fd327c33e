//! Graph validation and compilation into an executable [`Workflow`].

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use thiserror::Error;

use super::builder::GraphBuilder;
use super::edges::ConditionalEdge;
use crate::node::Node;
use crate::runtime::RuntimeConfig;
use crate::types::NodeKind;

/// Structural problems detected while compiling a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("no edges leave the Start node")]
    #[diagnostic(
        code(svarflyt::graph::no_start_edge),
        help("Add at least one edge from NodeKind::Start to an executable node.")
    )]
    NoStartEdge,

    #[error("edge references unregistered node: {target}")]
    #[diagnostic(
        code(svarflyt::graph::unknown_edge_target),
        help("Register the node with add_node before connecting edges to it.")
    )]
    UnknownEdgeTarget { target: String },

    #[error("conditional edge leaves unregistered node: {from}")]
    #[diagnostic(code(svarflyt::graph::unknown_conditional_source))]
    UnknownConditionalSource { from: String },
}

/// An immutable, validated workflow graph ready for execution.
///
/// Produced by [`GraphBuilder::compile`]. Execution happens through
/// [`WorkflowRunner`](crate::runtime::WorkflowRunner) or the
/// [`invoke`](Self::invoke) convenience.
pub struct Workflow {
    pub(crate) nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    pub(crate) edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    /// Nodes with more than one unconditional in-edge. Activations of these
    /// are deferred until no other work remains runnable.
    pub(crate) join_nodes: FxHashSet<NodeKind>,
    pub(crate) runtime_config: RuntimeConfig,
}

impl Workflow {
    /// Nodes registered in this workflow.
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    /// Static topology of this workflow.
    pub fn edges(&self) -> &FxHashMap<NodeKind, Vec<NodeKind>> {
        &self.edges
    }

    /// Conditional edges of this workflow.
    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    /// Join nodes detected at compile time.
    pub fn join_nodes(&self) -> &FxHashSet<NodeKind> {
        &self.join_nodes
    }

    /// Runtime configuration this workflow was compiled with.
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Run the workflow to completion over `initial`, with a default runner.
    ///
    /// See [`WorkflowRunner`](crate::runtime::WorkflowRunner) for custom
    /// event bus wiring.
    pub async fn invoke(
        self: Arc<Self>,
        initial: crate::state::WorkflowState,
    ) -> Result<crate::state::WorkflowState, crate::runtime::RunnerError> {
        crate::runtime::WorkflowRunner::new(self).invoke(initial).await
    }
}

impl GraphBuilder {
    /// Compiles the graph into an executable [`Workflow`].
    ///
    /// Validates the topology:
    /// - at least one edge must leave `Start`;
    /// - every unconditional edge endpoint must be registered (or virtual);
    /// - every conditional edge must leave a registered node or `Start`.
    ///
    /// Join nodes (unconditional in-degree above one) are detected here so
    /// the runner can defer them until their predecessors finish.
    pub fn compile(self) -> Result<Workflow, GraphCompileError> {
        if self.edges.get(&NodeKind::Start).is_none_or(|v| v.is_empty()) {
            return Err(GraphCompileError::NoStartEdge);
        }

        for (from, targets) in &self.edges {
            if !from.is_start() && !self.nodes.contains_key(from) {
                return Err(GraphCompileError::UnknownEdgeTarget {
                    target: from.to_string(),
                });
            }
            for to in targets {
                if !to.is_end() && !self.nodes.contains_key(to) {
                    return Err(GraphCompileError::UnknownEdgeTarget {
                        target: to.to_string(),
                    });
                }
            }
        }

        for edge in &self.conditional_edges {
            let from = edge.from();
            if !from.is_start() && !self.nodes.contains_key(from) {
                return Err(GraphCompileError::UnknownConditionalSource {
                    from: from.to_string(),
                });
            }
        }

        let mut indegree: FxHashMap<&NodeKind, usize> = FxHashMap::default();
        for targets in self.edges.values() {
            for to in targets {
                if !to.is_end() {
                    *indegree.entry(to).or_default() += 1;
                }
            }
        }
        let join_nodes: FxHashSet<NodeKind> = indegree
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(kind, _)| kind.clone())
            .collect();

        Ok(Workflow {
            nodes: self.nodes,
            edges: self.edges,
            conditional_edges: self.conditional_edges,
            join_nodes,
            runtime_config: self.runtime_config,
        })
    }
}
