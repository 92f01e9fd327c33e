//! First step of the flow: retrieve passages and draft an answer.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::collaborators::Retriever;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate};

/// Queries the retriever with the user's question and stores both the
/// drafted answer and the supporting passages.
pub struct AnswerNode {
    retriever: Arc<dyn Retriever>,
}

impl AnswerNode {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node for AnswerNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        ctx.emit("retrieval", format!("querying index: {}", snapshot.query))?;
        let outcome = self
            .retriever
            .query(&snapshot.query)
            .await
            .map_err(|source| NodeError::Provider {
                provider: "retriever",
                source,
            })?;
        ctx.emit(
            "retrieval",
            format!("retrieved {} passages", outcome.passages.len()),
        )?;
        let answer = outcome.answer.clone();
        Ok(StateUpdate::new()
            .with_retrieval(outcome)
            .with_answer(answer))
    }
}
