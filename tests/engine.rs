//! Engine semantics: supersteps, barrier merges, routing, join deferral,
//! and the step limit.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use svarflyt::graph::{EdgePredicate, GraphBuilder, GraphCompileError, Workflow};
use svarflyt::node::{Node, NodeContext, NodeError};
use svarflyt::runtime::{EventBusConfig, RunnerError, RuntimeConfig, SinkConfig, WorkflowRunner};
use svarflyt::scheduler::SchedulerError;
use svarflyt::state::{StateSnapshot, StateUpdate, WorkflowState};
use svarflyt::types::NodeKind;

type RunLog = Arc<Mutex<Vec<(String, u64)>>>;

/// Records (name, step) on every run; optionally bumps the rewrite-pass
/// counter so loop predicates have something to route on.
struct Recorder {
    name: &'static str,
    log: RunLog,
    count_passes: bool,
}

impl Recorder {
    fn new(name: &'static str, log: &RunLog) -> Self {
        Self {
            name,
            log: log.clone(),
            count_passes: false,
        }
    }

    fn counting(name: &'static str, log: &RunLog) -> Self {
        Self {
            name,
            log: log.clone(),
            count_passes: true,
        }
    }
}

#[async_trait]
impl Node for Recorder {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StateUpdate, NodeError> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.to_string(), ctx.step));
        let update = StateUpdate::new().with_answer(self.name);
        Ok(if self.count_passes {
            update.with_rewrite_passes(snapshot.rewrite_passes + 1)
        } else {
            update
        })
    }
}

fn quiet_runtime() -> RuntimeConfig {
    RuntimeConfig::default().with_event_bus(EventBusConfig {
        sinks: vec![SinkConfig::Memory],
    })
}

fn initial_state() -> WorkflowState {
    WorkflowState::builder().with_query("q").build()
}

async fn run(workflow: Workflow) -> WorkflowState {
    WorkflowRunner::new(Arc::new(workflow))
        .invoke(initial_state())
        .await
        .unwrap()
}

#[tokio::test]
async fn linear_workflow_runs_in_order() {
    let log: RunLog = Arc::default();
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("a"), Recorder::new("a", &log))
        .add_node(NodeKind::from("b"), Recorder::new("b", &log))
        .add_edge(NodeKind::Start, NodeKind::from("a"))
        .add_edge(NodeKind::from("a"), NodeKind::from("b"))
        .add_edge(NodeKind::from("b"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    let state = run(workflow).await;
    let entries = log.lock().unwrap().clone();
    assert_eq!(entries, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    // Barrier changed state twice, once per step.
    assert_eq!(state.version, 3);
    assert_eq!(state.answer, "b");
}

#[tokio::test]
async fn fan_out_siblings_share_a_superstep() {
    let log: RunLog = Arc::default();
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("fan"), Recorder::new("fan", &log))
        .add_node(NodeKind::from("left"), Recorder::new("left", &log))
        .add_node(NodeKind::from("right"), Recorder::new("right", &log))
        .add_edge(NodeKind::Start, NodeKind::from("fan"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("left"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("right"))
        .add_edge(NodeKind::from("left"), NodeKind::End)
        .add_edge(NodeKind::from("right"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    run(workflow).await;
    let entries = log.lock().unwrap().clone();
    let step_of = |name: &str| entries.iter().find(|(n, _)| n == name).unwrap().1;
    assert_eq!(step_of("left"), 2);
    assert_eq!(step_of("right"), 2);
}

#[tokio::test]
async fn diamond_join_runs_once_after_both_branches() {
    let log: RunLog = Arc::default();
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("fan"), Recorder::new("fan", &log))
        .add_node(NodeKind::from("left"), Recorder::new("left", &log))
        .add_node(NodeKind::from("right"), Recorder::new("right", &log))
        .add_node(NodeKind::from("merge"), Recorder::new("merge", &log))
        .add_edge(NodeKind::Start, NodeKind::from("fan"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("left"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("right"))
        .add_edge(NodeKind::from("left"), NodeKind::from("merge"))
        .add_edge(NodeKind::from("right"), NodeKind::from("merge"))
        .add_edge(NodeKind::from("merge"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    assert!(workflow.join_nodes().contains(&NodeKind::from("merge")));

    run(workflow).await;
    let entries = log.lock().unwrap().clone();
    let merges: Vec<_> = entries.iter().filter(|(n, _)| n == "merge").collect();
    assert_eq!(merges.len(), 1);
    let merge_step = merges[0].1;
    for (name, step) in &entries {
        if name != "merge" {
            assert!(*step < merge_step, "{name} ran at {step}, merge at {merge_step}");
        }
    }
}

#[tokio::test]
async fn join_waits_for_a_multi_step_loop() {
    let log: RunLog = Arc::default();
    // looper re-enters itself three times before releasing the join;
    // the join must not fire on the short branch's early signal.
    let loop_or_release: EdgePredicate = Arc::new(|snapshot| {
        if snapshot.rewrite_passes < 3 {
            vec!["looper".to_string()]
        } else {
            vec!["merge".to_string()]
        }
    });
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("fan"), Recorder::new("fan", &log))
        .add_node(NodeKind::from("short"), Recorder::new("short", &log))
        .add_node(NodeKind::from("other"), Recorder::new("other", &log))
        .add_node(NodeKind::from("looper"), Recorder::counting("looper", &log))
        .add_node(NodeKind::from("merge"), Recorder::new("merge", &log))
        .add_edge(NodeKind::Start, NodeKind::from("fan"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("short"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("other"))
        .add_edge(NodeKind::from("fan"), NodeKind::from("looper"))
        .add_edge(NodeKind::from("short"), NodeKind::from("merge"))
        .add_edge(NodeKind::from("other"), NodeKind::from("merge"))
        .add_conditional_edge(NodeKind::from("looper"), loop_or_release)
        .add_edge(NodeKind::from("merge"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    let state = run(workflow).await;
    assert_eq!(state.rewrite_passes, 3);

    let entries = log.lock().unwrap().clone();
    let looper_runs: Vec<_> = entries.iter().filter(|(n, _)| n == "looper").collect();
    assert_eq!(looper_runs.len(), 3);
    let merges: Vec<_> = entries.iter().filter(|(n, _)| n == "merge").collect();
    assert_eq!(merges.len(), 1);
    let last_looper_step = looper_runs.last().unwrap().1;
    assert!(merges[0].1 > last_looper_step);
}

#[tokio::test]
async fn conditional_routing_picks_a_branch() {
    let log: RunLog = Arc::default();
    let route: EdgePredicate = Arc::new(|snapshot| {
        if snapshot.answer == "decider" {
            vec!["picked".to_string()]
        } else {
            vec!["ignored".to_string()]
        }
    });
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("decider"), Recorder::new("decider", &log))
        .add_node(NodeKind::from("picked"), Recorder::new("picked", &log))
        .add_node(NodeKind::from("ignored"), Recorder::new("ignored", &log))
        .add_edge(NodeKind::Start, NodeKind::from("decider"))
        .add_conditional_edge(NodeKind::from("decider"), route)
        .add_edge(NodeKind::from("picked"), NodeKind::End)
        .add_edge(NodeKind::from("ignored"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    run(workflow).await;
    let entries = log.lock().unwrap().clone();
    let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["decider", "picked"]);
}

#[tokio::test]
async fn unknown_conditional_target_is_skipped_with_warning() {
    let log: RunLog = Arc::default();
    let route: EdgePredicate = Arc::new(|_| vec!["ghost".to_string(), "End".to_string()]);
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("only"), Recorder::new("only", &log))
        .add_edge(NodeKind::Start, NodeKind::from("only"))
        .add_conditional_edge(NodeKind::from("only"), route)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    let state = run(workflow).await;
    assert_eq!(state.warnings.len(), 1);
    assert!(state.warnings[0].error.message.contains("ghost"));
}

#[tokio::test]
async fn runaway_cycle_hits_the_step_limit() {
    let log: RunLog = Arc::default();
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("spinner"), Recorder::new("spinner", &log))
        .add_edge(NodeKind::Start, NodeKind::from("spinner"))
        .add_edge(NodeKind::from("spinner"), NodeKind::from("spinner"))
        .with_runtime_config(quiet_runtime().with_max_supersteps(5))
        .compile()
        .unwrap();

    let err = WorkflowRunner::new(Arc::new(workflow))
        .invoke(initial_state())
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::StepLimit { limit: 5 }));
}

#[tokio::test]
async fn node_failure_aborts_the_run() {
    struct Fails;
    #[async_trait]
    impl Node for Fails {
        async fn run(
            &self,
            _snapshot: StateSnapshot,
            _ctx: NodeContext,
        ) -> Result<StateUpdate, NodeError> {
            Err(NodeError::ValidationFailed("boom".to_string()))
        }
    }

    let workflow = GraphBuilder::new()
        .add_node(NodeKind::from("bad"), Fails)
        .add_edge(NodeKind::Start, NodeKind::from("bad"))
        .add_edge(NodeKind::from("bad"), NodeKind::End)
        .with_runtime_config(quiet_runtime())
        .compile()
        .unwrap();

    let err = WorkflowRunner::new(Arc::new(workflow))
        .invoke(initial_state())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Scheduler(SchedulerError::NodeRun { .. })
    ));
}

#[test]
fn compile_rejects_missing_start_edge() {
    let log: RunLog = Arc::default();
    let err = GraphBuilder::new()
        .add_node(NodeKind::from("a"), Recorder::new("a", &log))
        .add_edge(NodeKind::from("a"), NodeKind::End)
        .compile()
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, GraphCompileError::NoStartEdge));
}

#[test]
fn compile_rejects_edges_to_unregistered_nodes() {
    let log: RunLog = Arc::default();
    let err = GraphBuilder::new()
        .add_node(NodeKind::from("a"), Recorder::new("a", &log))
        .add_edge(NodeKind::Start, NodeKind::from("a"))
        .add_edge(NodeKind::from("a"), NodeKind::from("missing"))
        .compile()
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, GraphCompileError::UnknownEdgeTarget { .. }));
}
