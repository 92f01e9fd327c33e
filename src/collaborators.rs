//! Capability traits for the external collaborators the workflow talks to.
//!
//! The workflow itself never owns a vector index or a model client. It is
//! handed two seams: a [`Retriever`] that answers a query from an index and
//! returns the supporting passages, and a [`TextCompleter`] that produces a
//! completion for a prompt. Production backends and test doubles implement
//! the same traits.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Retrieval-augmented query engine seam.
///
/// A single call produces both a drafted answer and the scored passages the
/// answer was grounded on.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn query(&self, query: &str) -> Result<RetrievalOutcome, CollaboratorError>;
}

/// Plain text-completion seam for the enrichment and rewrite prompts.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// What a retriever returns: the drafted answer and its supporting passages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// The answer drafted over the retrieved passages.
    pub answer: String,
    /// Supporting passages in retrieval order.
    pub passages: Vec<Passage>,
}

/// One retrieved passage with its relevance score and source metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Relevance score from the index; `None` when the backend produced none.
    pub score: Option<f64>,
    /// Passage text (unused by the workflow itself, carried for consumers).
    pub text: String,
    /// Source metadata used to build reference entries.
    pub metadata: PassageMetadata,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Passage {
    pub fn new(score: Option<f64>, text: impl Into<String>) -> Self {
        Self {
            score,
            text: text.into(),
            metadata: PassageMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.url = Some(url.into());
        self
    }
}

/// Failures surfaced by collaborator implementations.
///
/// These are fatal for the run: the workflow wraps them into a node-level
/// provider error and aborts, which is distinct from a well-formed rejected
/// answer.
#[derive(Debug, Error, Diagnostic)]
pub enum CollaboratorError {
    #[error("retrieval failed: {message}")]
    #[diagnostic(code(svarflyt::collaborators::retrieval))]
    Retrieval { message: String },

    #[error("completion failed: {message}")]
    #[diagnostic(code(svarflyt::collaborators::completion))]
    Completion { message: String },

    #[error("collaborator unavailable: {what}")]
    #[diagnostic(
        code(svarflyt::collaborators::unavailable),
        help("Check that the backing service is reachable and configured.")
    )]
    Unavailable { what: &'static str },
}

impl CollaboratorError {
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
        }
    }
}
