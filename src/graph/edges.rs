//! Edge types and routing predicates for conditional graph flow.

use crate::types::NodeKind;
use std::sync::Arc;

/// Predicate function for conditional edge routing.
///
/// Takes a [`StateSnapshot`](crate::state::StateSnapshot) and returns the
/// names of the nodes to activate next. Returning
/// [`NodeKind::end_target()`](crate::types::NodeKind::end_target) completes
/// the branch.
///
/// # Examples
///
/// ```
/// use svarflyt::graph::EdgePredicate;
/// use svarflyt::state::Verdict;
/// use svarflyt::types::NodeKind;
/// use std::sync::Arc;
///
/// let route_verdict: EdgePredicate = Arc::new(|snapshot| {
///     match snapshot.validation {
///         Some(Verdict::Rejected) => vec!["aggregate".to_string()],
///         _ => vec!["title".to_string(), "summary".to_string()],
///     }
/// });
/// ```
pub type EdgePredicate =
    Arc<dyn Fn(crate::state::StateSnapshot) -> Vec<String> + Send + Sync + 'static>;

/// A conditional edge that routes based on a predicate function.
///
/// Evaluated against the post-barrier snapshot whenever its source node ran
/// in the previous superstep.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    predicate: EdgePredicate,
}

impl ConditionalEdge {
    /// Creates a new conditional edge.
    pub fn new(from: impl Into<NodeKind>, predicate: EdgePredicate) -> Self {
        Self {
            from: from.into(),
            predicate,
        }
    }

    /// Returns the source node of this conditional edge.
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// Returns the predicate function of this conditional edge.
    pub fn predicate(&self) -> &EdgePredicate {
        &self.predicate
    }
}
