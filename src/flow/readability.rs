//! LIX readability scoring and the evaluator/rewrite loop.
//!
//! The scorer is a deterministic heuristic, not a linguistic model:
//! whitespace tokens are words, `.`/`!`/`?` delimit sentences, and a word is
//! long when it keeps more than six ASCII-alphabetic characters. The
//! evaluator recomputes the score on every pass; the rewriter asks the
//! completer for a simpler phrasing and counts its passes so the loop can be
//! capped.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::collaborators::TextCompleter;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{Readability, ReadabilityBand, ReadabilityReport, StateSnapshot, StateUpdate};

/// Scores above this are sent through the rewrite loop.
pub const READABLE_THRESHOLD: f64 = 50.0;

/// Instruction handed to the rewriter when the answer scores too hard.
pub const IMPROVE_FEEDBACK: &str =
    "Make this text more readable by using shorter sentences, fewer words, and simpler language.";

/// Feedback recorded when the answer already reads well.
pub const NO_IMPROVEMENT_FEEDBACK: &str = "No need for improvements";

/// Compute the LIX score of a text.
///
/// `score = words/sentences + (long_words/words) * 100`, with both counts
/// floored at 1 so the formula is total. The sentence count is the number of
/// `.`/`!`/`?` delimited segments minus one; an empty text scores exactly 1.
#[must_use]
pub fn lix_score(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len().max(1) as f64;
    let sentence_count = text.split(['.', '!', '?']).count().saturating_sub(1).max(1) as f64;
    let long_words = words
        .iter()
        .filter(|word| word.chars().filter(char::is_ascii_alphabetic).count() > 6)
        .count() as f64;
    word_count / sentence_count + (long_words / word_count) * 100.0
}

/// Score a text and classify it into a difficulty band.
#[must_use]
pub fn readability_report(text: &str) -> ReadabilityReport {
    let score = lix_score(text);
    ReadabilityReport {
        score,
        band: ReadabilityBand::for_score(score),
    }
}

/// Recomputes the readability of the current answer and records the verdict
/// that drives the loop.
pub struct EvaluatorNode;

#[async_trait]
impl Node for EvaluatorNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let report = readability_report(&snapshot.answer);
        let (verdict, feedback) = if report.score > READABLE_THRESHOLD {
            (Readability::NotReadable, IMPROVE_FEEDBACK)
        } else {
            (Readability::Readable, NO_IMPROVEMENT_FEEDBACK)
        };
        ctx.emit(
            "readability",
            format!("lix {:.2} ({}): {:?}", report.score, report.band, verdict),
        )?;
        Ok(StateUpdate::new()
            .with_readability(report, verdict)
            .with_feedback(feedback))
    }
}

/// Asks the completer for a more readable phrasing of the answer and counts
/// the pass.
pub struct RewriteNode {
    completer: Arc<dyn TextCompleter>,
}

impl RewriteNode {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Self {
        Self { completer }
    }
}

#[async_trait]
impl Node for RewriteNode {
    #[instrument(skip(self, snapshot, ctx), fields(node = %ctx.node_id, step = ctx.step))]
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        let prompt = format!(
            "Improve readability: {}. Feedback: {}",
            snapshot.answer, snapshot.feedback
        );
        ctx.emit(
            "rewrite",
            format!("pass {} over the answer", snapshot.rewrite_passes + 1),
        )?;
        let rewritten = self
            .completer
            .complete(&prompt)
            .await
            .map_err(|source| NodeError::Provider {
                provider: "completer",
                source,
            })?;
        Ok(StateUpdate::new()
            .with_answer(rewritten)
            .with_rewrite_passes(snapshot.rewrite_passes + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_one() {
        assert_eq!(lix_score(""), 1.0);
        let report = readability_report("");
        assert_eq!(report.band, ReadabilityBand::VeryEasy);
    }

    #[test]
    fn short_simple_text_scores_low() {
        // 4 words, 2 sentences, no long words: 4/2 + 0 = 2.0
        assert_eq!(lix_score("Kort tekst. Enkel sak."), 2.0);
    }

    #[test]
    fn long_words_dominate_the_score() {
        // 3 words, 1 sentence, all long: 3/1 + 100 = 103.0
        let score = lix_score("kompliserte akademiske formuleringer.");
        assert_eq!(score, 103.0);
        assert_eq!(
            ReadabilityBand::for_score(score),
            ReadabilityBand::VeryDifficult
        );
    }

    #[test]
    fn non_alphabetic_characters_are_filtered_from_word_length() {
        // "123456789" keeps zero alphabetic characters, so it is not long.
        assert_eq!(lix_score("123456789."), 1.0);
        // "ab-cd-ef-gh" keeps 8 alphabetic characters: long.
        assert_eq!(lix_score("ab-cd-ef-gh."), 101.0);
    }

    #[test]
    fn text_without_terminator_counts_one_sentence() {
        // 5 words, no terminator: segments 1 - 1 = 0, floored to 1.
        assert_eq!(lix_score("fem ord uten noe tegn"), 5.0);
    }
}
