use std::sync::Arc;

use futures::future::BoxFuture;

use gamewright_core::error::Result;
use gamewright_core::traits::{AgentExecutor, AgentRequest};
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

use crate::roles::{CONCEPT_DESIGNER_GOAL, CONCEPT_DESIGNER_ROLE};

/// Expands the run's constant inputs into a full game concept document.
///
/// The raw text is committed as-is; downstream stages parse it against
/// the concept schema and own any validation failure.
pub struct ConceptExpansionStage {
    executor: Arc<dyn AgentExecutor>,
}

impl ConceptExpansionStage {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self { executor }
    }
}

impl StepExecutor for ConceptExpansionStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let request = AgentRequest::new(CONCEPT_DESIGNER_ROLE, CONCEPT_DESIGNER_GOAL)
                .with_inputs(ctx.inputs().clone());
            let raw = self.executor.execute(request).await?;
            Ok(StepOutput::text(raw))
        })
    }
}
