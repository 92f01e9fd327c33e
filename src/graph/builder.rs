//! Fluent construction of workflow graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, EdgePredicate};
use crate::node::Node;
use crate::runtime::RuntimeConfig;
use crate::types::NodeKind;

/// Builder for workflow graphs.
///
/// Register executable nodes, connect them with unconditional and conditional
/// edges, then [`compile`](Self::compile) into an executable
/// [`Workflow`](super::Workflow). `NodeKind::Start` and `NodeKind::End` are
/// virtual endpoints: they appear in edges but must never be registered.
///
/// # Examples
///
/// ```no_run
/// use svarflyt::graph::GraphBuilder;
/// use svarflyt::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl svarflyt::node::Node for MyNode {
/// #     async fn run(&self, _: svarflyt::state::StateSnapshot, _: svarflyt::node::NodeContext) -> Result<svarflyt::state::StateUpdate, svarflyt::node::NodeError> {
/// #         Ok(svarflyt::state::StateUpdate::default())
/// #     }
/// # }
/// let workflow = GraphBuilder::new()
///     .add_node(NodeKind::Custom("worker".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
///     .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    /// Registry of all nodes in the graph, keyed by their identifier.
    pub nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    /// Unconditional edges defining static graph topology.
    pub edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    /// Conditional edges for dynamic routing based on state.
    pub conditional_edges: Vec<ConditionalEdge>,
    /// Runtime configuration for the compiled workflow.
    pub runtime_config: RuntimeConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Adds a node to the graph.
    ///
    /// Registration of the virtual `Start`/`End` kinds is ignored with a
    /// warning; they exist only for topology.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(
                    ?id,
                    "ignoring registration of virtual node kind (Start/End are virtual)"
                );
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds an unconditional edge between two nodes.
    ///
    /// Multiple edges from one node fan out; multiple unconditional edges
    /// into one node make it a join node that runs once after all of its
    /// reachable predecessors complete.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Adds a conditional edge to the graph.
    ///
    /// When the `from` node has run, the `predicate` is evaluated against the
    /// post-barrier snapshot and its returned node names are activated.
    #[must_use]
    pub fn add_conditional_edge(mut self, from: NodeKind, predicate: EdgePredicate) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, predicate));
        self
    }

    /// Configures runtime settings for the compiled workflow.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
