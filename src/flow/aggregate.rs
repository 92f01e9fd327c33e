//! Final join: assemble the structured Markdown answer.

use async_trait::async_trait;
use tracing::instrument;

use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateSnapshot, StateUpdate, Verdict};

/// Render the structured answer for a snapshot.
///
/// A rejected run produces just the feedback (the apology). An accepted run
/// produces the fixed Markdown document; the reference section is present
/// only when at least one reference qualified.
#[must_use]
pub fn render(snapshot: &StateSnapshot) -> String {
    if snapshot.validation == Some(Verdict::Rejected) {
        return snapshot.feedback.clone();
    }
    let mut combined = String::from("# Oppsummering av spørsmålet\n\n");
    combined.push_str(&format!(
        "## Spørsmålet fra brukeren\n{}\n\n",
        snapshot.query
    ));
    combined.push_str(&format!("## Tittel\n{}\n\n", snapshot.title));
    combined.push_str(&format!(
        "## Kort sammendrag av spørsmålet\n{}\n\n",
        snapshot.summary
    ));
    combined.push_str(&format!("## Lettlest svar\n{}\n\n", snapshot.answer));
    if !snapshot.references.is_empty() {
        combined.push_str("## Referanser\n");
        for reference in &snapshot.references {
            combined.push_str(&format!(
                "- [{}]({}) (Relevans: {:.2})\n",
                reference.name, reference.url, reference.relevance
            ));
        }
    }
    combined
}

/// Sole writer of `structured_answer`. Runs once, after every predecessor
/// that the taken branch reaches has completed.
pub struct AggregateNode;

#[async_trait]
impl Node for AggregateNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        if snapshot.validation.is_none() {
            return Err(NodeError::MissingInput { what: "validation" });
        }
        ctx.emit("aggregate", "assembling structured answer")?;
        Ok(StateUpdate::new().with_structured_answer(render(&snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Reference, WorkflowState};

    fn accepted_snapshot() -> StateSnapshot {
        let mut state = WorkflowState::builder().with_query("Hva er GDPR?").build();
        state.validation = Some(Verdict::Accepted);
        state.title = "GDPR".to_string();
        state.summary = "Spørsmål om GDPR.".to_string();
        state.answer = "GDPR er personvernforordningen.".to_string();
        state.snapshot()
    }

    #[test]
    fn rejected_renders_feedback_only() {
        let mut state = WorkflowState::builder().with_query("q").build();
        state.validation = Some(Verdict::Rejected);
        state.feedback = "Jeg beklager!".to_string();
        assert_eq!(render(&state.snapshot()), "Jeg beklager!");
    }

    #[test]
    fn accepted_without_references_omits_section() {
        let rendered = render(&accepted_snapshot());
        assert!(rendered.starts_with("# Oppsummering av spørsmålet\n\n"));
        assert!(rendered.contains("## Spørsmålet fra brukeren\nHva er GDPR?\n\n"));
        assert!(rendered.contains("## Tittel\nGDPR\n\n"));
        assert!(rendered.contains("## Kort sammendrag av spørsmålet\nSpørsmål om GDPR.\n\n"));
        assert!(rendered.contains("## Lettlest svar\nGDPR er personvernforordningen.\n\n"));
        assert!(!rendered.contains("## Referanser"));
    }

    #[test]
    fn references_render_with_two_decimals() {
        let mut state = WorkflowState::builder().with_query("Hva er GDPR?").build();
        state.validation = Some(Verdict::Accepted);
        state.references = vec![Reference {
            name: "Datatilsynet".to_string(),
            url: "https://example.org".to_string(),
            relevance: 0.875,
        }];
        let rendered = render(&state.snapshot());
        assert!(
            rendered.contains("## Referanser\n- [Datatilsynet](https://example.org) (Relevans: 0.88)\n")
        );
    }

    #[test]
    fn render_is_idempotent() {
        let snapshot = accepted_snapshot();
        assert_eq!(render(&snapshot), render(&snapshot));
    }
}
