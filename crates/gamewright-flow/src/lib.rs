//! Step and Flow DAG execution engine.
//!
//! A [`Flow`] is a directed acyclic graph of named [`Step`]s. Each step
//! declares which prior steps' outputs it needs; the flow resolves a
//! deterministic execution order, runs every step exactly once, commits
//! each output atomically before scheduling dependents, and isolates
//! failures to the dependent subgraph.

mod context;
mod flow;
mod step;

pub use context::StepContext;
pub use flow::{Flow, FlowReport, ProgressEvent, StepReport};
pub use step::{FnStep, Step, StepExecutor, StepOutput};
