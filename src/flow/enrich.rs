//! Parallel enrichment of an accepted answer: title, summary, references.
//!
//! All three run in the same superstep as the readability evaluator and
//! write disjoint state fields, so merge order between them is irrelevant.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use crate::collaborators::TextCompleter;
use crate::errors::{ErrorDetail, ErrorEvent};
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{Reference, StateSnapshot, StateUpdate};

/// Default reference name when a passage has no title.
pub const UNTITLED_REFERENCE: &str = "Ingen tittel";
/// Default reference URL when a passage has no URL.
pub const MISSING_URL: &str = "Ingen URL";

/// One-sentence Norwegian title for the query.
pub struct TitleNode {
    completer: Arc<dyn TextCompleter>,
}

impl TitleNode {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Self {
        Self { completer }
    }
}

#[async_trait]
impl Node for TitleNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let prompt = format!(
            "Give a title in norwegian to the query, ensuring that the 'I' form is preserved: {}, use only one short sentence",
            snapshot.query
        );
        ctx.emit("enrich", "generating title")?;
        let title = self
            .completer
            .complete(&prompt)
            .await
            .map_err(|source| NodeError::Provider {
                provider: "completer",
                source,
            })?;
        Ok(StateUpdate::new().with_title(title))
    }
}

/// One-sentence Norwegian summary of the query.
pub struct SummaryNode {
    completer: Arc<dyn TextCompleter>,
}

impl SummaryNode {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Self {
        Self { completer }
    }
}

#[async_trait]
impl Node for SummaryNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let prompt = format!(
            "Please provide a summary of the user's question in norwegian, ensuring that the 'I' form is preserved : {}, use only one sentence",
            snapshot.query
        );
        ctx.emit("enrich", "generating summary")?;
        let summary = self
            .completer
            .complete(&prompt)
            .await
            .map_err(|source| NodeError::Provider {
                provider: "completer",
                source,
            })?;
        Ok(StateUpdate::new().with_summary(summary))
    }
}

/// Derives the reference list from the qualifying passages.
///
/// A passage qualifies when its score is present and at or above the cutoff.
/// Retrieval order is preserved. Missing metadata gets Norwegian defaults
/// and a warning is recorded for each affected passage.
pub struct ReferencesNode;

#[async_trait]
impl Node for ReferencesNode {
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

        let mut references = Vec::new();
        let mut warnings = Vec::new();
        for (index, passage) in retrieval.passages.iter().enumerate() {
            let Some(score) = passage.score else { continue };
            if score < snapshot.similarity_cutoff {
                continue;
            }
            if passage.metadata.title.is_none() || passage.metadata.url.is_none() {
                warnings.push(
                    ErrorEvent::node(
                        ctx.node_id.clone(),
                        ctx.step,
                        ErrorDetail::msg("passage metadata incomplete, using defaults")
                            .with_details(json!({"passage_index": index})),
                    )
                    .with_tag("metadata"),
                );
            }
            references.push(Reference {
                name: passage
                    .metadata
                    .title
                    .clone()
                    .unwrap_or_else(|| UNTITLED_REFERENCE.to_string())
                    .trim_start()
                    .to_string(),
                url: passage
                    .metadata
                    .url
                    .clone()
                    .unwrap_or_else(|| MISSING_URL.to_string()),
                relevance: score,
            });
        }

        ctx.emit("enrich", format!("built {} references", references.len()))?;
        Ok(StateUpdate::new()
            .with_references(references)
            .with_warnings(warnings))
    }
}
