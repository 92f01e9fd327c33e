//! Workflow state: the single mutable record threaded through one run.
//!
//! A [`WorkflowState`] is created per request, mutated only through barrier
//! merges of [`StateUpdate`]s returned by nodes, and discarded once the
//! structured answer has been extracted. Nodes never see the live state;
//! they receive an immutable [`StateSnapshot`].
//!
//! # Merge semantics
//!
//! Updates from one superstep are applied in frontier order. Scalar fields
//! are last-write-wins; `warnings` is append-only. The runner bumps
//! `version` once per barrier that changed anything.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collaborators::RetrievalOutcome;
use crate::errors::ErrorEvent;

/// Outcome of the retrieval validation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Verdict of the readability evaluator for the current answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readability {
    Readable,
    NotReadable,
}

/// LIX difficulty band for a readability score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadabilityBand {
    VeryEasy,
    Easy,
    Medium,
    Difficult,
    VeryDifficult,
}

impl ReadabilityBand {
    /// Band for a LIX score. Thresholds are exclusive upper bounds.
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score < 25.0 {
            Self::VeryEasy
        } else if score < 35.0 {
            Self::Easy
        } else if score < 45.0 {
            Self::Medium
        } else if score < 55.0 {
            Self::Difficult
        } else {
            Self::VeryDifficult
        }
    }

    /// Norwegian label, matching what the aggregated answer reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryEasy => "Svært lettlest (for barn)",
            Self::Easy => "Lettlest (enkel litteratur, aviser)",
            Self::Medium => "Middels vanskelig (standard aviser, generell sakprosa)",
            Self::Difficult => "Vanskelig (akademiske tekster, offisielle dokumenter)",
            Self::VeryDifficult => "Svært vanskelig (vitenskapelig litteratur)",
        }
    }
}

impl fmt::Display for ReadabilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score plus band, recomputed by the evaluator on every pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityReport {
    pub score: f64,
    pub band: ReadabilityBand,
}

/// One source reference in the final answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub url: String,
    pub relevance: f64,
}

/// The shared mutable record of one workflow run.
///
/// `query`, `similarity_cutoff`, and `index_description` are fixed at
/// construction; everything else is written by nodes through barrier merges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The user's question, immutable once set.
    pub query: String,
    /// Relevance threshold in `[0, 1]` for validation and references.
    pub similarity_cutoff: f64,
    /// Human description of the index, interpolated into the rejection reply.
    pub index_description: String,
    /// Retrieval result, set once by the answer step.
    pub retrieval: Option<RetrievalOutcome>,
    /// Validation verdict, set once.
    pub validation: Option<Verdict>,
    /// Current answer text; the rewrite loop may replace it.
    pub answer: String,
    /// Latest readability report.
    pub readability: Option<ReadabilityReport>,
    /// Latest readability verdict; terminates the rewrite loop.
    pub readable: Option<Readability>,
    /// Apology or improvement instruction; last writer wins.
    pub feedback: String,
    /// Qualifying references in retrieval order.
    pub references: Vec<Reference>,
    /// Short title for the query.
    pub title: String,
    /// One-sentence summary of the query.
    pub summary: String,
    /// Final Markdown document, written exactly once by the aggregator.
    pub structured_answer: Option<String>,
    /// Number of rewrite passes performed so far.
    pub rewrite_passes: u32,
    /// Recoverable diagnostics, append-only.
    pub warnings: Vec<ErrorEvent>,
    /// Bumped by the runner whenever a barrier changed state.
    pub version: u32,
}

impl WorkflowState {
    /// Start building a state for one run.
    #[must_use]
    pub fn builder() -> WorkflowStateBuilder {
        WorkflowStateBuilder::default()
    }

    /// Immutable view handed to nodes and edge predicates.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            query: self.query.clone(),
            similarity_cutoff: self.similarity_cutoff,
            index_description: self.index_description.clone(),
            retrieval: self.retrieval.clone(),
            validation: self.validation,
            answer: self.answer.clone(),
            readability: self.readability,
            readable: self.readable,
            feedback: self.feedback.clone(),
            references: self.references.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            structured_answer: self.structured_answer.clone(),
            rewrite_passes: self.rewrite_passes,
            warnings: self.warnings.clone(),
            version: self.version,
        }
    }

    /// Merge one partial update into the state. Returns `true` if anything
    /// changed. Scalars are last-write-wins; warnings append.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        let mut changed = false;
        macro_rules! assign {
            ($field:ident) => {
                if let Some(value) = update.$field {
                    self.$field = value;
                    changed = true;
                }
            };
        }
        if let Some(retrieval) = update.retrieval {
            self.retrieval = Some(retrieval);
            changed = true;
        }
        if let Some(validation) = update.validation {
            self.validation = Some(validation);
            changed = true;
        }
        if let Some(report) = update.readability {
            self.readability = Some(report);
            changed = true;
        }
        if let Some(readable) = update.readable {
            self.readable = Some(readable);
            changed = true;
        }
        if let Some(structured) = update.structured_answer {
            self.structured_answer = Some(structured);
            changed = true;
        }
        assign!(answer);
        assign!(feedback);
        assign!(references);
        assign!(title);
        assign!(summary);
        assign!(rewrite_passes);
        if let Some(mut warnings) = update.warnings {
            if !warnings.is_empty() {
                self.warnings.append(&mut warnings);
                changed = true;
            }
        }
        changed
    }
}

/// Builder for the immutable portion of a [`WorkflowState`].
#[derive(Debug, Default)]
pub struct WorkflowStateBuilder {
    query: String,
    similarity_cutoff: Option<f64>,
    index_description: String,
}

impl WorkflowStateBuilder {
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_similarity_cutoff(mut self, cutoff: f64) -> Self {
        self.similarity_cutoff = Some(cutoff);
        self
    }

    #[must_use]
    pub fn with_index_description(mut self, description: impl Into<String>) -> Self {
        self.index_description = description.into();
        self
    }

    #[must_use]
    pub fn build(self) -> WorkflowState {
        WorkflowState {
            query: self.query,
            similarity_cutoff: self.similarity_cutoff.unwrap_or(0.7),
            index_description: self.index_description,
            retrieval: None,
            validation: None,
            answer: String::new(),
            readability: None,
            readable: None,
            feedback: String::new(),
            references: Vec::new(),
            title: String::new(),
            summary: String::new(),
            structured_answer: None,
            rewrite_passes: 0,
            warnings: Vec::new(),
            version: 1,
        }
    }
}

/// Read-only view of the state at a barrier boundary.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    pub query: String,
    pub similarity_cutoff: f64,
    pub index_description: String,
    pub retrieval: Option<RetrievalOutcome>,
    pub validation: Option<Verdict>,
    pub answer: String,
    pub readability: Option<ReadabilityReport>,
    pub readable: Option<Readability>,
    pub feedback: String,
    pub references: Vec<Reference>,
    pub title: String,
    pub summary: String,
    pub structured_answer: Option<String>,
    pub rewrite_passes: u32,
    pub warnings: Vec<ErrorEvent>,
    pub version: u32,
}

/// Partial update returned by node execution.
///
/// Every field is optional; nodes set only what they own. The runtime merges
/// updates at the barrier in frontier order.
#[derive(Clone, Debug, Default)]
pub struct StateUpdate {
    pub retrieval: Option<RetrievalOutcome>,
    pub validation: Option<Verdict>,
    pub answer: Option<String>,
    pub readability: Option<ReadabilityReport>,
    pub readable: Option<Readability>,
    pub feedback: Option<String>,
    pub references: Option<Vec<Reference>>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub structured_answer: Option<String>,
    pub rewrite_passes: Option<u32>,
    pub warnings: Option<Vec<ErrorEvent>>,
}

impl StateUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalOutcome) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    #[must_use]
    pub fn with_validation(mut self, verdict: Verdict) -> Self {
        self.validation = Some(verdict);
        self
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_readability(mut self, report: ReadabilityReport, verdict: Readability) -> Self {
        self.readability = Some(report);
        self.readable = Some(verdict);
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = Some(references);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_structured_answer(mut self, answer: impl Into<String>) -> Self {
        self.structured_answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_rewrite_passes(mut self, passes: u32) -> Self {
        self.rewrite_passes = Some(passes);
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<ErrorEvent>) -> Self {
        self.warnings = Some(warnings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorDetail;

    #[test]
    fn builder_defaults() {
        let state = WorkflowState::builder()
            .with_query("Hva er GDPR?")
            .with_index_description("Indeksen dekker personvern")
            .build();
        assert_eq!(state.similarity_cutoff, 0.7);
        assert_eq!(state.version, 1);
        assert!(state.retrieval.is_none());
        assert!(state.structured_answer.is_none());
        assert_eq!(state.rewrite_passes, 0);
    }

    #[test]
    fn apply_is_last_write_wins_for_scalars() {
        let mut state = WorkflowState::builder().with_query("q").build();
        assert!(state.apply(StateUpdate::new().with_answer("first")));
        assert!(state.apply(StateUpdate::new().with_answer("second")));
        assert_eq!(state.answer, "second");
    }

    #[test]
    fn apply_appends_warnings() {
        let mut state = WorkflowState::builder().with_query("q").build();
        let warn = |m: &str| ErrorEvent::workflow(ErrorDetail::msg(m));
        state.apply(StateUpdate::new().with_warnings(vec![warn("a")]));
        state.apply(StateUpdate::new().with_warnings(vec![warn("b"), warn("c")]));
        assert_eq!(state.warnings.len(), 3);
        assert_eq!(state.warnings[0].error.message, "a");
        assert_eq!(state.warnings[2].error.message, "c");
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut state = WorkflowState::builder().with_query("q").build();
        assert!(!state.apply(StateUpdate::new()));
        assert!(!state.apply(StateUpdate::new().with_warnings(vec![])));
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ReadabilityBand::for_score(0.0), ReadabilityBand::VeryEasy);
        assert_eq!(ReadabilityBand::for_score(24.99), ReadabilityBand::VeryEasy);
        assert_eq!(ReadabilityBand::for_score(25.0), ReadabilityBand::Easy);
        assert_eq!(ReadabilityBand::for_score(35.0), ReadabilityBand::Medium);
        assert_eq!(ReadabilityBand::for_score(45.0), ReadabilityBand::Difficult);
        assert_eq!(
            ReadabilityBand::for_score(55.0),
            ReadabilityBand::VeryDifficult
        );
        assert_eq!(
            ReadabilityBand::for_score(25.0).label(),
            "Lettlest (enkel litteratur, aviser)"
        );
    }
}
