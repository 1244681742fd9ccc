use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use gamewright_artifacts::ArtifactStore;
use gamewright_core::error::Result;
use gamewright_core::traits::{AgentExecutor, AgentRequest};
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

use crate::roles::{QA_LEAD_GOAL, QA_LEAD_ROLE};

pub const QA_REPORT_PATH: &str = "qa_report.txt";

pub(crate) fn placeholder_report(reason: &str) -> String {
    format!(
        "QA REPORT (placeholder)\n\nAutomated review was unavailable: {}\n\n\
         Manual checklist:\n- Open index.html in a browser\n- Verify the game loop starts\n\
         - Verify assets load from assets/images and assets/audio\n",
        reason
    )
}

/// Reviews the generated tree and writes the QA report.
///
/// A failed review degrades to a placeholder report; the step itself still
/// succeeds so the finalize branch always runs.
pub struct QaReviewStage {
    executor: Arc<dyn AgentExecutor>,
    store: ArtifactStore,
}

impl QaReviewStage {
    pub fn new(executor: Arc<dyn AgentExecutor>, store: ArtifactStore) -> Self {
        Self { executor, store }
    }
}

impl StepExecutor for QaReviewStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let request = AgentRequest::new(QA_LEAD_ROLE, QA_LEAD_GOAL)
                .with_context(ctx.context_texts());

            let report = match self.executor.execute(request).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "QA review failed, writing placeholder report");
                    placeholder_report(&e.to_string())
                }
            };

            let mut output = StepOutput::text(report.clone());
            match self.store.write_text(QA_REPORT_PATH, &report).await {
                Ok(path) => {
                    output = output.with_artifact(QA_REPORT_PATH, path.display().to_string());
                }
                Err(e) => {
                    warn!(error = %e, "QA report write failed, kept in memory");
                }
            }
            Ok(output)
        })
    }
}
