use futures::future::BoxFuture;

use gamewright_artifacts::ArtifactStore;
use gamewright_core::error::Result;
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

/// Persists its single upstream's committed output to a fixed file.
pub struct SaveTextStage {
    store: ArtifactStore,
    filename: String,
}

impl SaveTextStage {
    pub fn new(store: ArtifactStore, filename: impl Into<String>) -> Self {
        Self {
            store,
            filename: filename.into(),
        }
    }
}

impl StepExecutor for SaveTextStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let text = ctx
                .upstream()
                .first()
                .map(|(_, out)| out.as_str())
                .unwrap_or_default();
            let path = self.store.write_text(&self.filename, text).await?;
            Ok(StepOutput::text(format!("saved {}", path.display()))
                .with_artifact(self.filename.clone(), path.display().to_string()))
        })
    }
}
