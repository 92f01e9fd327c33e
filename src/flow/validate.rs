//! Validation of the retrieval result against the similarity cutoff.

use async_trait::async_trait;
use tracing::instrument;

use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate, Verdict};

/// Build the Norwegian rejection reply for an out-of-scope question.
///
/// The index description tells the user which topics the assistant can
/// actually help with.
#[must_use]
pub fn rejection_reply(index_description: &str) -> String {
    format!(
        "Jeg beklager! {index_description}. Hvis du har spørsmål om disse emnene, \
         kan jeg prøve å hjelpe deg med det. Bare gi meg beskjed om hva du lurer på!"
    )
}

/// Accepts the retrieval iff any passage carries a non-null score at or
/// above the cutoff; the first qualifying passage decides. Rejection writes
/// the apology into `feedback`.
pub struct ValidateNode;

#[async_trait]
impl Node for ValidateNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let retrieval = snapshot
            .retrieval
            .as_ref()
            .ok_or(NodeError::MissingInput { what: "retrieval" })?;

        let accepted = retrieval
            .passages
            .iter()
            .filter_map(|passage| passage.score)
            .any(|score| score >= snapshot.similarity_cutoff);

        if accepted {
            ctx.emit("verdict", "Accepted")?;
            Ok(StateUpdate::new().with_validation(Verdict::Accepted))
        } else {
            ctx.emit("verdict", "Rejected")?;
            Ok(StateUpdate::new()
                .with_validation(Verdict::Rejected)
                .with_feedback(rejection_reply(&snapshot.index_description)))
        }
    }
}
