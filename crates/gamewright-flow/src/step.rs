use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use gamewright_core::error::Result;

use crate::context::StepContext;

/// What a completed step hands back to the flow.
///
/// `text` is committed to the run's output mapping under the step's own
/// name. `extra_outputs` are committed under their own keys (used by the
/// fan-out stage to retain sanitized file content that never hit disk),
/// and `artifacts` map logical names to stored paths.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub text: String,
    pub extra_outputs: BTreeMap<String, String>,
    pub artifacts: BTreeMap<String, String>,
}

impl StepOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_outputs.insert(key.into(), value.into());
        self
    }

    pub fn with_artifact(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.artifacts.insert(name.into(), path.into());
        self
    }
}

impl From<String> for StepOutput {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// Executes one step's unit of work.
pub trait StepExecutor: Send + Sync + 'static {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>>;
}

/// A step executor built from a plain async closure.
///
/// Handy for side-effect-only steps (save-to-disk) and for tests.
pub struct FnStep<F>(pub F);

impl<F> StepExecutor for FnStep<F>
where
    F: Fn(StepContext) -> BoxFuture<'static, Result<StepOutput>> + Send + Sync + 'static,
{
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        (self.0)(ctx)
    }
}

/// Immutable definition of one named unit of pipeline work.
///
/// A step declares the upstream steps whose committed outputs it needs;
/// the flow hands it exactly those outputs, in declaration order, and
/// nothing else.
#[derive(Clone)]
pub struct Step {
    name: String,
    upstream: Vec<String>,
    executor: Arc<dyn StepExecutor>,
}

impl Step {
    pub fn new(name: impl Into<String>, executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            name: name.into(),
            upstream: Vec::new(),
            executor,
        }
    }

    /// Declare one upstream dependency. Order of calls is the order the
    /// outputs appear in the step's context.
    pub fn after(mut self, upstream: impl Into<String>) -> Self {
        self.upstream.push(upstream.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upstream(&self) -> &[String] {
        &self.upstream
    }

    pub(crate) fn executor(&self) -> Arc<dyn StepExecutor> {
        self.executor.clone()
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("upstream", &self.upstream)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn StepExecutor> {
        Arc::new(FnStep(|_ctx| {
            Box::pin(async { Ok(StepOutput::text("ok")) }) as BoxFuture<'static, Result<StepOutput>>
        }))
    }

    #[test]
    fn test_step_builder_preserves_upstream_order() {
        let step = Step::new("qa_review", noop())
            .after("write_code_files")
            .after("asset_generation");

        assert_eq!(step.name(), "qa_review");
        assert_eq!(step.upstream(), ["write_code_files", "asset_generation"]);
    }

    #[test]
    fn test_step_output_builders() {
        let out = StepOutput::text("body")
            .with_extra("file:/etc/passwd", "content")
            .with_artifact("qa_report", "Game/qa_report.txt");

        assert_eq!(out.text, "body");
        assert_eq!(out.extra_outputs.len(), 1);
        assert_eq!(out.artifacts.get("qa_report").unwrap(), "Game/qa_report.txt");
    }
}
