//! Graph wiring and the [`AnswerFlow`] entry point.

use std::sync::Arc;
use tracing::instrument;

use super::aggregate::AggregateNode;
use super::answer::AnswerNode;
use super::enrich::{ReferencesNode, SummaryNode, TitleNode};
use super::names;
use super::readability::{EvaluatorNode, RewriteNode};
use super::settings::FlowSettings;
use super::validate::ValidateNode;
use crate::collaborators::{Retriever, TextCompleter};
use crate::graph::{EdgePredicate, GraphBuilder, GraphCompileError, Workflow};
use crate::runtime::{RunnerError, WorkflowRunner};
use crate::state::{Readability, Verdict, WorkflowState};
use crate::types::NodeKind;

/// The compiled answer-refinement workflow, bound to its collaborators.
///
/// Compile once, run per query:
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use svarflyt::collaborators::{Retriever, TextCompleter};
/// # use svarflyt::flow::{AnswerFlow, FlowSettings};
/// # async fn example(retriever: Arc<dyn Retriever>, completer: Arc<dyn TextCompleter>) -> miette::Result<()> {
/// let flow = AnswerFlow::new(
///     retriever,
///     completer,
///     FlowSettings::default().with_index_description("Indeksen dekker personvern og GDPR"),
/// )?;
/// let markdown = flow.answer("Hva er GDPR?").await.map_err(miette::Report::from)?;
/// println!("{markdown}");
/// # Ok(())
/// # }
/// ```
pub struct AnswerFlow {
    workflow: Arc<Workflow>,
    settings: FlowSettings,
}

impl AnswerFlow {
    /// Build and compile the fixed graph against the given collaborators.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        completer: Arc<dyn TextCompleter>,
        settings: FlowSettings,
    ) -> Result<Self, GraphCompileError> {
        let workflow = Arc::new(build_graph(retriever, completer, &settings)?);
        Ok(Self { workflow, settings })
    }

    /// The compiled workflow, for callers that want a custom runner or
    /// event bus.
    pub fn workflow(&self) -> Arc<Workflow> {
        self.workflow.clone()
    }

    /// Settings this flow was compiled with.
    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Fresh initial state for one query.
    #[must_use]
    pub fn initial_state(&self, query: &str) -> WorkflowState {
        WorkflowState::builder()
            .with_query(query)
            .with_similarity_cutoff(self.settings.similarity_cutoff)
            .with_index_description(self.settings.index_description.clone())
            .build()
    }

    /// Run one query to completion and return the full final state.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn run(&self, query: &str) -> Result<WorkflowState, RunnerError> {
        WorkflowRunner::new(self.workflow.clone())
            .invoke(self.initial_state(query))
            .await
    }

    /// Run one query and return just the structured Markdown answer.
    pub async fn answer(&self, query: &str) -> Result<String, RunnerError> {
        let state = self.run(query).await?;
        Ok(state.structured_answer.unwrap_or_default())
    }
}

/// Wire the fixed topology. Exposed for engine-level tests.
pub(crate) fn build_graph(
    retriever: Arc<dyn Retriever>,
    completer: Arc<dyn TextCompleter>,
    settings: &FlowSettings,
) -> Result<Workflow, GraphCompileError> {
    let route_verdict: EdgePredicate = Arc::new(|snapshot| match snapshot.validation {
        Some(Verdict::Rejected) => vec![names::AGGREGATE.to_string()],
        _ => vec![
            names::TITLE.to_string(),
            names::SUMMARY.to_string(),
            names::REFERENCES.to_string(),
            names::READABILITY.to_string(),
        ],
    });

    let rewrite_cap = settings.max_rewrite_passes;
    let route_readability: EdgePredicate = Arc::new(move |snapshot| {
        let wants_rewrite = snapshot.readable == Some(Readability::NotReadable)
            && rewrite_cap.is_none_or(|cap| snapshot.rewrite_passes < cap);
        if wants_rewrite {
            vec![names::REWRITE.to_string()]
        } else {
            vec![names::AGGREGATE.to_string()]
        }
    });

    GraphBuilder::new()
        .add_node(NodeKind::from(names::ANSWER), AnswerNode::new(retriever))
        .add_node(NodeKind::from(names::VALIDATE), ValidateNode)
        .add_node(
            NodeKind::from(names::TITLE),
            TitleNode::new(completer.clone()),
        )
        .add_node(
            NodeKind::from(names::SUMMARY),
            SummaryNode::new(completer.clone()),
        )
        .add_node(NodeKind::from(names::REFERENCES), ReferencesNode)
        .add_node(NodeKind::from(names::READABILITY), EvaluatorNode)
        .add_node(NodeKind::from(names::REWRITE), RewriteNode::new(completer))
        .add_node(NodeKind::from(names::AGGREGATE), AggregateNode)
        .add_edge(NodeKind::Start, NodeKind::from(names::ANSWER))
        .add_edge(NodeKind::from(names::ANSWER), NodeKind::from(names::VALIDATE))
        .add_conditional_edge(NodeKind::from(names::VALIDATE), route_verdict)
        .add_edge(NodeKind::from(names::TITLE), NodeKind::from(names::AGGREGATE))
        .add_edge(
            NodeKind::from(names::SUMMARY),
            NodeKind::from(names::AGGREGATE),
        )
        .add_edge(
            NodeKind::from(names::REFERENCES),
            NodeKind::from(names::AGGREGATE),
        )
        .add_conditional_edge(NodeKind::from(names::READABILITY), route_readability)
        .add_edge(
            NodeKind::from(names::REWRITE),
            NodeKind::from(names::READABILITY),
        )
        .add_edge(NodeKind::from(names::AGGREGATE), NodeKind::End)
        .with_runtime_config(settings.runtime.clone())
        .compile()
}
