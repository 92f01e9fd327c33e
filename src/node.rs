//! Node execution primitives: the [`Node`] trait, execution context, and the
//! fatal error taxonomy.
//!
//! A node receives an immutable [`StateSnapshot`] and returns a
//! [`StateUpdate`] with only the fields it owns. Fatal problems are returned
//! as [`NodeError`] and abort the run; recoverable ones go into the update's
//! warning list instead.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::event_bus::Event;
use crate::state::{StateSnapshot, StateUpdate};

/// One unit of work in the workflow graph.
///
/// Implementations should be stateless with respect to the run: everything
/// they need arrives in the snapshot or was injected at construction (for
/// example an `Arc<dyn TextCompleter>`).
///
/// # Examples
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use svarflyt::node::{Node, NodeContext, NodeError};
/// use svarflyt::state::{StateSnapshot, StateUpdate};
///
/// struct Shout;
///
/// #[async_trait]
/// impl Node for Shout {
///     async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<StateUpdate, NodeError> {
///         ctx.emit("shout", "uppercasing the answer")?;
///         Ok(StateUpdate::new().with_answer(snapshot.answer.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against the given snapshot.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError>;
}

/// Execution context passed to a node for one invocation.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier of the node being executed.
    pub node_id: String,
    /// Current superstep number.
    pub step: u64,
    /// Sender side of the run's event bus.
    pub event_bus_sender: flume::Sender<Event>,
}

impl NodeContext {
    /// Emit a node-scoped event enriched with this context's metadata.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_bus_sender
            .send(Event::node_message_with_meta(
                self.node_id.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }
}

/// Errors that can occur when using [`NodeContext`] methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(svarflyt::node::event_bus_unavailable),
        help("The event bus may be disconnected. Check that the runner is still alive.")
    )]
    EventBusUnavailable,
}

/// Fatal node errors that halt workflow execution.
///
/// For diagnostics that should be recorded without stopping the run, append
/// to [`StateUpdate::warnings`](crate::state::StateUpdate) instead.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(svarflyt::node::missing_input),
        help("Check that the upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// A collaborator (retriever or completer) failed.
    #[error("provider error ({provider}): {source}")]
    #[diagnostic(code(svarflyt::node::provider))]
    Provider {
        provider: &'static str,
        #[source]
        source: CollaboratorError,
    },

    /// JSON serialization error.
    #[error(transparent)]
    #[diagnostic(code(svarflyt::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(code(svarflyt::node::validation))]
    ValidationFailed(String),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(svarflyt::node::event_bus))]
    EventBus(#[from] NodeContextError),
}
