//! The answer-refinement workflow itself.
//!
//! Fixed topology over the engine in [`crate::graph`] and [`crate::runtime`]:
//!
//! ```text
//! Start → answer → validate ──Rejected──────────────────────→ aggregate → End
//!                     │ Accepted
//!                     ├→ title ──────────┐
//!                     ├→ summary ────────┤
//!                     ├→ references ─────┼→ aggregate (join)
//!                     └→ readability ──ok┘
//!                          ↑    │ revise
//!                          └─ rewrite
//! ```
//!
//! [`AnswerFlow`] wires the graph once and runs it per query.

pub mod aggregate;
pub mod answer;
pub mod enrich;
pub mod readability;
pub mod settings;
pub mod validate;
pub mod workflow;

pub use settings::FlowSettings;
pub use workflow::AnswerFlow;

/// Node names used in the fixed graph and by its routing predicates.
pub mod names {
    pub const ANSWER: &str = "answer";
    pub const VALIDATE: &str = "validate";
    pub const TITLE: &str = "title";
    pub const SUMMARY: &str = "summary";
    pub const REFERENCES: &str = "references";
    pub const READABILITY: &str = "readability";
    pub const REWRITE: &str = "rewrite";
    pub const AGGREGATE: &str = "aggregate";
}
