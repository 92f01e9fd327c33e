//! # Svarflyt: Graph-driven RAG Answer Refinement
//!
//! Svarflyt turns one user question into one structured Markdown answer by
//! running a fixed workflow graph: retrieve and draft, validate the
//! retrieval, fan out into parallel enrichment plus a readability rewrite
//! loop, and join everything in an aggregator.
//!
//! The engine underneath is general: typed state with deterministic barrier
//! merges, conditional routing, join barriers, and an event bus for
//! progress streaming. The domain workflow in [`flow`] is one graph built
//! on it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use svarflyt::collaborators::{
//!     CollaboratorError, Passage, RetrievalOutcome, Retriever, TextCompleter,
//! };
//! use svarflyt::flow::{AnswerFlow, FlowSettings};
//!
//! struct MyIndex;
//!
//! #[async_trait]
//! impl Retriever for MyIndex {
//!     async fn query(&self, query: &str) -> Result<RetrievalOutcome, CollaboratorError> {
//!         Ok(RetrievalOutcome {
//!             answer: format!("Utkast til svar på: {query}"),
//!             passages: vec![Passage::new(Some(0.9), "...")
//!                 .with_title("Kilde")
//!                 .with_url("https://example.org")],
//!         })
//!     }
//! }
//!
//! struct MyModel;
//!
//! #[async_trait]
//! impl TextCompleter for MyModel {
//!     async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
//!         Ok(format!("Svar: {prompt}"))
//!     }
//! }
//!
//! # async fn example() -> miette::Result<()> {
//! let flow = AnswerFlow::new(
//!     Arc::new(MyIndex),
//!     Arc::new(MyModel),
//!     FlowSettings::default().with_index_description("Indeksen dekker personvern og GDPR"),
//! )?;
//! let markdown = flow.answer("Hva er GDPR?").await.map_err(miette::Report::from)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Building Custom Graphs
//!
//! The domain flow is ordinary use of the public engine; custom graphs work
//! the same way:
//!
//! ```rust,no_run
//! use svarflyt::graph::GraphBuilder;
//! use svarflyt::state::{StateUpdate, WorkflowState};
//! use svarflyt::types::NodeKind;
//! # struct MyNode;
//! # #[async_trait::async_trait]
//! # impl svarflyt::node::Node for MyNode {
//! #     async fn run(&self, _: svarflyt::state::StateSnapshot, _: svarflyt::node::NodeContext) -> Result<StateUpdate, svarflyt::node::NodeError> {
//! #         Ok(StateUpdate::default())
//! #     }
//! # }
//! # async fn example() -> miette::Result<()> {
//! use std::sync::Arc;
//! let workflow = Arc::new(
//!     GraphBuilder::new()
//!         .add_node(NodeKind::Custom("worker".into()), MyNode)
//!         .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
//!         .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
//!         .compile()?,
//! );
//! let final_state = workflow
//!     .invoke(WorkflowState::builder().with_query("hei").build())
//!     .await
//!     .map_err(miette::Report::from)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`flow`] - The answer-refinement workflow and its entry point
//! - [`collaborators`] - Retriever and text-completion capability traits
//! - [`state`] - Typed workflow state, snapshots, and partial updates
//! - [`node`] - Node trait and execution primitives
//! - [`graph`] - Workflow graph definition and compilation
//! - [`scheduler`] - Concurrent superstep execution
//! - [`runtime`] - Superstep runner, join barriers, configuration
//! - [`event_bus`] - Progress event streaming with pluggable sinks
//! - [`errors`] - Recoverable diagnostics carried on state

pub mod collaborators;
pub mod errors;
pub mod event_bus;
pub mod flow;
pub mod graph;
pub mod node;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod types;
