//! Core identity types for the workflow graph.
//!
//! [`NodeKind`] names the participants of a workflow graph. `Start` and `End`
//! are virtual endpoints that are never executed; every real unit of work is
//! a `Custom` node identified by a descriptive string.
//!
//! # Examples
//!
//! ```rust
//! use svarflyt::types::NodeKind;
//!
//! let start = NodeKind::Start;
//! let validate = NodeKind::Custom("validate".to_string());
//! assert!(start.is_start());
//! assert_eq!(validate.to_string(), "validate");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `Start` and `End` are virtual: they carry edges but no implementation and
/// are skipped by the scheduler. Conditional edge predicates return node
/// names as strings; [`NodeKind::from`] and [`as_target`](Self::as_target)
/// bridge between the two representations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry point. The first edge of every graph leaves from here.
    Start,

    /// Virtual terminal. Routing a node here completes its branch.
    End,

    /// Executable node identified by a user-defined string.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the virtual [`Start`](Self::Start) node.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the virtual [`End`](Self::End) node.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is an executable custom node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// String form of this kind as returned by conditional edge predicates.
    ///
    /// ```rust
    /// # use svarflyt::types::NodeKind;
    /// assert_eq!(NodeKind::Custom("aggregate".into()).as_target(), "aggregate");
    /// assert_eq!(NodeKind::End.as_target(), "End");
    /// ```
    #[must_use]
    pub fn as_target(&self) -> String {
        self.to_string()
    }

    /// The predicate target string that routes a branch to [`End`](Self::End).
    #[must_use]
    pub fn end_target() -> String {
        NodeKind::End.as_target()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Developer experience: allow using string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}
