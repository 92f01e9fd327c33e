//! Recoverable diagnostics that ride along with workflow state.
//!
//! Fatal problems abort a run through the error enums in [`crate::node`] and
//! [`crate::runtime`]. Everything a node wants to report without stopping the
//! workflow is recorded as an [`ErrorEvent`] on the state's warning channel,
//! with a scope, timestamp, optional tags, and a cause chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recoverable diagnostic with scope, detail, tags, and context.
///
/// # JSON format
///
/// ```json
/// {
///   "when": "2026-08-24T10:30:00Z",
///   "scope": { "scope": "node", "kind": "references", "step": 3 },
///   "error": {
///     "message": "passage metadata missing title",
///     "cause": null,
///     "details": {"passage_index": 2}
///   },
///   "tags": ["metadata"],
///   "context": null
/// }
/// ```
///
/// The `scope` field is a tagged union discriminated by `"scope"`:
/// `"node"` (kind + step), `"scheduler"` (step), `"runner"` (run + step),
/// or `"workflow"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: ErrorDetail,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// Create a node-scoped diagnostic.
    pub fn node<S: Into<String>>(kind: S, step: u64, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                kind: kind.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a scheduler-scoped diagnostic.
    pub fn scheduler(step: u64, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Scheduler { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a runner-scoped diagnostic tied to a run id.
    pub fn runner<S: Into<String>>(run: S, step: u64, error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner {
                run: run.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a workflow-scoped diagnostic.
    pub fn workflow(error: ErrorDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Workflow,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Add a single tag.
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach context metadata.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        kind: String,
        step: u64,
    },
    Scheduler {
        step: u64,
    },
    Runner {
        run: String,
        step: u64,
    },
    #[default]
    Workflow,
}

/// Message plus optional cause chain and structured details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorDetail>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for ErrorDetail {
    fn default() -> Self {
        ErrorDetail {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorDetail {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl ErrorDetail {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        ErrorDetail {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: ErrorDetail) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}
