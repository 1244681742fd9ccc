use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use gamewright_core::error::{GamewrightError, Result};
use gamewright_core::types::{RunId, StepStatus};

use crate::context::StepContext;
use crate::step::Step;

/// Progress notification emitted while a flow runs.
///
/// The flow itself only logs; callers that want user-facing banners hook
/// these events.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    StepStarted { name: &'a str },
    StepFinished { name: &'a str, status: StepStatus },
}

/// Outcome of one step within a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub run_id: RunId,
    /// Per-step outcomes in execution order.
    pub steps: Vec<StepReport>,
    /// Step name → committed output text (plus any extra committed keys).
    pub outputs: BTreeMap<String, String>,
    /// Logical artifact name → stored path.
    pub artifacts: BTreeMap<String, String>,
}

impl FlowReport {
    pub fn status(&self, name: &str) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.status)
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    /// True when every step that actually ran succeeded.
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.status, StepStatus::Succeeded | StepStatus::Skipped))
    }
}

/// A DAG of steps executed exactly once per run.
///
/// Steps run in topological order with ties broken by registration order,
/// so a given flow definition always executes deterministically. A failed
/// step skips only the steps that depend on it (directly or transitively);
/// independent branches run to completion.
#[derive(Default)]
pub struct Flow {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Register a step.
    ///
    /// Fails with `DuplicateStep` when the name is taken and `CycleInFlow`
    /// when the step's upstream edges would close a dependency cycle
    /// (self-reference included). A failed registration leaves the flow
    /// unchanged. Upstream names may refer to steps registered later;
    /// `run` validates that every reference eventually resolved.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if self.index.contains_key(step.name()) {
            return Err(GamewrightError::DuplicateStep(step.name().to_string()));
        }
        if self.would_cycle(&step) {
            return Err(GamewrightError::CycleInFlow(step.name().to_string()));
        }

        debug!(step = step.name(), upstream = ?step.upstream(), "Registered step");
        self.index.insert(step.name().to_string(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Walk upstream chains starting from the candidate's dependencies; a
    /// path leading back to the candidate means the new edges close a cycle.
    fn would_cycle(&self, candidate: &Step) -> bool {
        let mut stack: Vec<&str> = candidate.upstream().iter().map(String::as_str).collect();
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(name) = stack.pop() {
            if name == candidate.name() {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(&i) = self.index.get(name) {
                stack.extend(self.steps[i].upstream().iter().map(String::as_str));
            }
        }
        false
    }

    /// Topological execution order, ties broken by registration order.
    fn execution_order(&self) -> Result<Vec<usize>> {
        // Validate that every upstream reference resolved.
        for step in &self.steps {
            for up in step.upstream() {
                if !self.index.contains_key(up) {
                    return Err(GamewrightError::UnknownStep {
                        step: step.name().to_string(),
                        upstream: up.clone(),
                    });
                }
            }
        }

        let mut order = Vec::with_capacity(self.steps.len());
        let mut placed = vec![false; self.steps.len()];

        while order.len() < self.steps.len() {
            let mut advanced = false;
            for (i, step) in self.steps.iter().enumerate() {
                if placed[i] {
                    continue;
                }
                let ready = step
                    .upstream()
                    .iter()
                    .all(|up| placed[self.index[up]]);
                if ready {
                    placed[i] = true;
                    order.push(i);
                    advanced = true;
                }
            }
            // Registration-time cycle checks make this unreachable, but a
            // stuck scan must not spin forever.
            if !advanced {
                let stuck = self
                    .steps
                    .iter()
                    .enumerate()
                    .find(|(i, _)| !placed[*i])
                    .map(|(_, s)| s.name().to_string())
                    .unwrap_or_default();
                return Err(GamewrightError::CycleInFlow(stuck));
            }
        }
        Ok(order)
    }

    /// Execute every registered step exactly once.
    pub async fn run(&self, inputs: BTreeMap<String, String>) -> Result<FlowReport> {
        self.run_with_progress(inputs, |_| {}).await
    }

    /// Execute the flow, reporting step transitions through `on_event`.
    pub async fn run_with_progress(
        &self,
        inputs: BTreeMap<String, String>,
        mut on_event: impl FnMut(ProgressEvent<'_>),
    ) -> Result<FlowReport> {
        let order = self.execution_order()?;
        let run_id = RunId::new();
        info!(run_id = %run_id, steps = self.steps.len(), "Flow run starting");

        let mut statuses: HashMap<&str, StepStatus> = self
            .steps
            .iter()
            .map(|s| (s.name(), StepStatus::Pending))
            .collect();
        let mut outputs: BTreeMap<String, String> = BTreeMap::new();
        let mut artifacts: BTreeMap<String, String> = BTreeMap::new();
        let mut reports: Vec<StepReport> = Vec::with_capacity(self.steps.len());

        for i in order {
            let step = &self.steps[i];
            let name = step.name();

            // Branch isolation: a step runs only when every upstream
            // committed an output.
            let blocked = step
                .upstream()
                .iter()
                .find(|up| statuses[up.as_str()] != StepStatus::Succeeded);
            if let Some(up) = blocked {
                warn!(step = name, upstream = %up, "Skipping step, upstream did not succeed");
                statuses.insert(name, StepStatus::Skipped);
                on_event(ProgressEvent::StepFinished {
                    name,
                    status: StepStatus::Skipped,
                });
                reports.push(StepReport {
                    name: name.to_string(),
                    status: StepStatus::Skipped,
                    elapsed_ms: 0,
                    error: None,
                });
                continue;
            }

            let upstream_outputs: Vec<(String, String)> = step
                .upstream()
                .iter()
                .map(|up| (up.clone(), outputs[up].clone()))
                .collect();
            let ctx = StepContext::new(run_id.clone(), inputs.clone(), upstream_outputs);

            info!(step = name, "Executing step");
            statuses.insert(name, StepStatus::Running);
            on_event(ProgressEvent::StepStarted { name });

            let started = Instant::now();
            let result = step.executor().execute(ctx).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(out) => {
                    // Commit before any dependent is scheduled, so observers
                    // only ever see completed state.
                    outputs.insert(name.to_string(), out.text);
                    outputs.extend(out.extra_outputs);
                    artifacts.extend(out.artifacts);
                    statuses.insert(name, StepStatus::Succeeded);
                    debug!(step = name, elapsed_ms, "Step succeeded");
                    on_event(ProgressEvent::StepFinished {
                        name,
                        status: StepStatus::Succeeded,
                    });
                    reports.push(StepReport {
                        name: name.to_string(),
                        status: StepStatus::Succeeded,
                        elapsed_ms,
                        error: None,
                    });
                }
                Err(e) => {
                    error!(step = name, error = %e, "Step failed");
                    statuses.insert(name, StepStatus::Failed);
                    on_event(ProgressEvent::StepFinished {
                        name,
                        status: StepStatus::Failed,
                    });
                    reports.push(StepReport {
                        name: name.to_string(),
                        status: StepStatus::Failed,
                        elapsed_ms,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let report = FlowReport {
            run_id,
            steps: reports,
            outputs,
            artifacts,
        };
        info!(
            run_id = %report.run_id,
            succeeded = report.succeeded(),
            "Flow run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures::future::BoxFuture;

    use gamewright_core::error::GamewrightError;

    use super::*;
    use crate::step::{FnStep, StepExecutor, StepOutput};

    /// Records execution order and can be told to fail.
    struct Probe {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl StepExecutor for Probe {
        fn execute(&self, _ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name.to_string());
                if self.fail {
                    Err(GamewrightError::StepFailed {
                        step: self.name.to_string(),
                        message: "boom".into(),
                    })
                } else {
                    Ok(StepOutput::text(format!("{} output", self.name)))
                }
            })
        }
    }

    fn probe(
        name: &'static str,
        log: &Arc<Mutex<Vec<String>>>,
        fail: bool,
    ) -> Arc<dyn StepExecutor> {
        Arc::new(Probe {
            name,
            log: log.clone(),
            fail,
        })
    }

    fn echo_context() -> Arc<dyn StepExecutor> {
        Arc::new(FnStep(|ctx: StepContext| {
            Box::pin(async move { Ok(StepOutput::text(ctx.context_texts().join("|"))) })
                as BoxFuture<'static, Result<StepOutput>>
        }))
    }

    #[tokio::test]
    async fn test_runs_in_dependency_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        // Registered out of dependency order on purpose.
        flow.register(Step::new("c", probe("c", &log, false)).after("b"))
            .unwrap();
        flow.register(Step::new("a", probe("a", &log, false))).unwrap();
        flow.register(Step::new("b", probe("b", &log, false)).after("a"))
            .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c"]);
        assert!(report.succeeded());
    }

    #[tokio::test]
    async fn test_ties_broken_by_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("root", probe("root", &log, false))).unwrap();
        flow.register(Step::new("right", probe("right", &log, false)).after("root"))
            .unwrap();
        flow.register(Step::new("left", probe("left", &log, false)).after("root"))
            .unwrap();

        flow.run(BTreeMap::new()).await.unwrap();
        // "right" registered first, so it runs first.
        assert_eq!(*log.lock().unwrap(), ["root", "right", "left"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("a", probe("a", &log, false))).unwrap();
        let err = flow
            .register(Step::new("a", probe("a", &log, false)))
            .unwrap_err();
        assert!(matches!(err, GamewrightError::DuplicateStep(_)));
        assert_eq!(flow.len(), 1);
    }

    #[tokio::test]
    async fn test_self_reference_rejected_and_not_registered() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        let err = flow
            .register(Step::new("a", probe("a", &log, false)).after("a"))
            .unwrap_err();
        assert!(matches!(err, GamewrightError::CycleInFlow(_)));
        assert!(flow.is_empty());
    }

    #[tokio::test]
    async fn test_transitive_cycle_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        // Forward references are allowed at registration time...
        flow.register(Step::new("a", probe("a", &log, false)).after("c"))
            .unwrap();
        flow.register(Step::new("b", probe("b", &log, false)).after("a"))
            .unwrap();
        // ...but the edge that closes a -> b -> c -> a is rejected.
        let err = flow
            .register(Step::new("c", probe("c", &log, false)).after("b"))
            .unwrap_err();
        assert!(matches!(err, GamewrightError::CycleInFlow(_)));
        assert_eq!(flow.len(), 2);
    }

    #[tokio::test]
    async fn test_unresolved_upstream_fails_before_running() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("a", probe("a", &log, false)).after("ghost"))
            .unwrap();

        let err = flow.run(BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, GamewrightError::UnknownStep { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_contains_declared_upstreams_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("a", probe("a", &log, false))).unwrap();
        flow.register(Step::new("b", probe("b", &log, false))).unwrap();
        flow.register(Step::new("c", echo_context()).after("b")).unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        // "c" sees b's output and nothing from the unrelated "a".
        assert_eq!(report.output("c"), Some("b output"));
    }

    #[tokio::test]
    async fn test_failure_skips_dependents_but_not_siblings() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("root", probe("root", &log, false))).unwrap();
        flow.register(Step::new("broken", probe("broken", &log, true)).after("root"))
            .unwrap();
        flow.register(Step::new("dependent", probe("dependent", &log, false)).after("broken"))
            .unwrap();
        flow.register(Step::new("sibling", probe("sibling", &log, false)).after("root"))
            .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(report.status("broken"), Some(StepStatus::Failed));
        assert_eq!(report.status("dependent"), Some(StepStatus::Skipped));
        assert_eq!(report.status("sibling"), Some(StepStatus::Succeeded));
        // The dependent never executed.
        assert!(!log.lock().unwrap().contains(&"dependent".to_string()));
    }

    #[tokio::test]
    async fn test_skip_propagates_through_chains() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("broken", probe("broken", &log, true))).unwrap();
        flow.register(Step::new("mid", probe("mid", &log, false)).after("broken"))
            .unwrap();
        flow.register(Step::new("leaf", probe("leaf", &log, false)).after("mid"))
            .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(report.status("mid"), Some(StepStatus::Skipped));
        assert_eq!(report.status("leaf"), Some(StepStatus::Skipped));
    }

    #[tokio::test]
    async fn test_inputs_reach_every_step() {
        let mut flow = Flow::new();
        flow.register(Step::new(
            "reader",
            Arc::new(FnStep(|ctx: StepContext| {
                Box::pin(async move {
                    Ok(StepOutput::text(ctx.input("Storyline").unwrap_or("").to_string()))
                }) as BoxFuture<'static, Result<StepOutput>>
            })),
        ))
        .unwrap();

        let inputs = BTreeMap::from([("Storyline".to_string(), "A hero's journey".to_string())]);
        let report = flow.run(inputs).await.unwrap();
        assert_eq!(report.output("reader"), Some("A hero's journey"));
    }

    #[tokio::test]
    async fn test_extra_outputs_and_artifacts_committed() {
        let mut flow = Flow::new();
        flow.register(Step::new(
            "writer",
            Arc::new(FnStep(|_ctx| {
                Box::pin(async move {
                    Ok(StepOutput::text("done")
                        .with_extra("file:/etc/passwd", "sanitized content")
                        .with_artifact("qa_report", "Game/qa_report.txt"))
                }) as BoxFuture<'static, Result<StepOutput>>
            })),
        ))
        .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(report.output("file:/etc/passwd"), Some("sanitized content"));
        assert_eq!(
            report.artifacts.get("qa_report").map(String::as_str),
            Some("Game/qa_report.txt")
        );
    }

    #[tokio::test]
    async fn test_progress_events_fire_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut flow = Flow::new();
        flow.register(Step::new("a", probe("a", &log, false))).unwrap();
        flow.register(Step::new("b", probe("b", &log, true)).after("a"))
            .unwrap();

        let mut events = Vec::new();
        flow.run_with_progress(BTreeMap::new(), |e| {
            events.push(match e {
                ProgressEvent::StepStarted { name } => format!("start:{}", name),
                ProgressEvent::StepFinished { name, status } => format!("end:{}:{}", name, status),
            });
        })
        .await
        .unwrap();

        assert_eq!(
            events,
            ["start:a", "end:a:succeeded", "start:b", "end:b:failed"]
        );
    }
}
