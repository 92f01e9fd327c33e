//! Superstep execution engine for compiled workflows.
//!
//! Each superstep runs the whole frontier concurrently, merges the returned
//! updates at a barrier in frontier order, then routes on the merged
//! snapshot. Join nodes (unconditional in-degree above one) are activated
//! through signals and only enter the frontier once no other work remains,
//! so a join observes every predecessor that the current execution path can
//! still reach — including multi-step loops upstream of it.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{ErrorDetail, ErrorEvent};
use crate::event_bus::{Event, EventBus};
use crate::graph::Workflow;
use crate::scheduler::{Scheduler, SchedulerError};
use crate::state::{StateUpdate, WorkflowState};
use crate::types::NodeKind;

/// Fatal problems during workflow execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("no nodes to run from Start (empty frontier)")]
    #[diagnostic(
        code(svarflyt::runner::no_start_nodes),
        help("Add edges from NodeKind::Start when building the graph.")
    )]
    NoStartNodes,

    #[error("superstep limit exceeded ({limit})")]
    #[diagnostic(
        code(svarflyt::runner::step_limit),
        help("A cycle is not terminating. Check loop conditions or raise max_supersteps.")
    )]
    StepLimit { limit: u64 },

    #[error(transparent)]
    #[diagnostic(code(svarflyt::runner::scheduler))]
    Scheduler(#[from] SchedulerError),
}

/// What one superstep did, for observability.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: u64,
    pub ran_nodes: Vec<NodeKind>,
    pub next_frontier: Vec<NodeKind>,
    pub state_version: u32,
    pub completed: bool,
}

/// Drives a compiled [`Workflow`] to completion over one state.
///
/// The runner owns the run's [`EventBus`]; nodes emit through the context
/// they are handed. One workflow can be shared across many runners.
pub struct WorkflowRunner {
    workflow: Arc<Workflow>,
    scheduler: Scheduler,
    event_bus: EventBus,
    run_id: String,
}

impl WorkflowRunner {
    /// Create a runner with an event bus built from the workflow's
    /// runtime configuration.
    #[must_use]
    pub fn new(workflow: Arc<Workflow>) -> Self {
        let event_bus = workflow.runtime_config().event_bus.build_bus();
        Self::with_event_bus(workflow, event_bus)
    }

    /// Create a runner with a caller-supplied event bus (custom sinks,
    /// per-request streaming).
    #[must_use]
    pub fn with_event_bus(workflow: Arc<Workflow>, event_bus: EventBus) -> Self {
        Self {
            workflow,
            scheduler: Scheduler,
            event_bus,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Identifier of this run, stamped on runner-scoped diagnostics.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run the workflow to completion and return the final state.
    #[instrument(skip(self, initial), fields(run_id = %self.run_id))]
    pub async fn invoke(&self, initial: WorkflowState) -> Result<WorkflowState, RunnerError> {
        self.event_bus.listen_for_events();
        let result = self.run_to_completion(initial).await;
        self.event_bus.stop_listener().await;
        result
    }

    async fn run_to_completion(
        &self,
        mut state: WorkflowState,
    ) -> Result<WorkflowState, RunnerError> {
        let mut frontier = self
            .workflow
            .edges()
            .get(&NodeKind::Start)
            .cloned()
            .filter(|targets| !targets.is_empty())
            .ok_or(RunnerError::NoStartNodes)?;
        frontier.retain(|kind| !kind.is_end());
        if frontier.is_empty() {
            return Err(RunnerError::NoStartNodes);
        }

        // Join bookkeeping: which origins have signalled each join, and
        // which joins already ran.
        let mut join_signals: FxHashMap<NodeKind, FxHashSet<NodeKind>> = FxHashMap::default();
        let mut ran_joins: FxHashSet<NodeKind> = FxHashSet::default();

        let limit = self.workflow.runtime_config().max_supersteps;
        let mut step: u64 = 0;

        loop {
            step += 1;
            if step > limit {
                return Err(RunnerError::StepLimit { limit });
            }

            let snapshot = state.snapshot();
            let updates = self
                .scheduler
                .run_step(
                    self.workflow.nodes(),
                    &frontier,
                    snapshot,
                    step,
                    self.event_bus.get_sender(),
                )
                .await?;

            let ran_nodes: Vec<NodeKind> = updates.iter().map(|(kind, _)| kind.clone()).collect();
            self.apply_barrier(&mut state, updates.into_iter().map(|(_, u)| u));

            let next = self.route(&mut state, &ran_nodes, &mut join_signals, &mut ran_joins, step);
            let next = match next {
                next if next.is_empty() => {
                    self.flush_pending_joins(&mut join_signals, &mut ran_joins)
                }
                next => next,
            };

            let report = StepReport {
                step,
                ran_nodes,
                next_frontier: next.clone(),
                state_version: state.version,
                completed: next.is_empty(),
            };
            tracing::debug!(?report, "superstep complete");

            if next.is_empty() {
                let _ = self.event_bus.get_sender().send(Event::diagnostic(
                    "runner",
                    format!("run {} completed at step {step}", self.run_id),
                ));
                return Ok(state);
            }
            frontier = next;
        }
    }

    /// Merge updates in frontier order; one version bump per changed barrier.
    fn apply_barrier(&self, state: &mut WorkflowState, updates: impl Iterator<Item = StateUpdate>) {
        let mut changed = false;
        for update in updates {
            changed |= state.apply(update);
        }
        if changed {
            state.version += 1;
        }
    }

    /// Compute the next frontier from static edges plus conditional
    /// predicates of the nodes that just ran. Activations of join nodes are
    /// recorded as signals instead of entering the frontier.
    fn route(
        &self,
        state: &mut WorkflowState,
        ran_nodes: &[NodeKind],
        join_signals: &mut FxHashMap<NodeKind, FxHashSet<NodeKind>>,
        ran_joins: &mut FxHashSet<NodeKind>,
        step: u64,
    ) -> Vec<NodeKind> {
        let snapshot = state.snapshot();
        let mut next: Vec<NodeKind> = Vec::new();

        for origin in ran_nodes {
            let mut targets: Vec<NodeKind> = self
                .workflow
                .edges()
                .get(origin)
                .cloned()
                .unwrap_or_default();
            for edge in self.workflow.conditional_edges() {
                if edge.from() == origin {
                    targets.extend(
                        (edge.predicate())(snapshot.clone())
                            .iter()
                            .map(|name| NodeKind::from(name.as_str())),
                    );
                }
            }

            for target in targets {
                if target.is_end() || target.is_start() {
                    continue;
                }
                if !self.workflow.nodes().contains_key(&target) {
                    tracing::warn!(%origin, %target, "skipping route to unregistered node");
                    state.warnings.push(ErrorEvent::runner(
                        self.run_id.clone(),
                        step,
                        ErrorDetail::msg(format!(
                            "conditional edge from {origin} targets unregistered node {target}"
                        )),
                    ));
                    continue;
                }
                if self.workflow.join_nodes().contains(&target) && !ran_joins.contains(&target) {
                    join_signals
                        .entry(target)
                        .or_default()
                        .insert(origin.clone());
                } else if !next.contains(&target) {
                    next.push(target);
                }
            }
        }
        next
    }

    /// When nothing else is runnable, release signalled joins into the
    /// frontier (sorted by name for determinism). Each join runs once.
    fn flush_pending_joins(
        &self,
        join_signals: &mut FxHashMap<NodeKind, FxHashSet<NodeKind>>,
        ran_joins: &mut FxHashSet<NodeKind>,
    ) -> Vec<NodeKind> {
        let mut pending: Vec<NodeKind> = join_signals
            .iter()
            .filter(|(_, origins)| !origins.is_empty())
            .map(|(kind, _)| kind.clone())
            .collect();
        pending.sort_by_key(|kind| kind.to_string());
        for join in &pending {
            join_signals.remove(join);
            ran_joins.insert(join.clone());
        }
        pending
    }
}
