use std::sync::Arc;

use futures::future::BoxFuture;

use gamewright_artifacts::ArtifactStore;
use gamewright_core::error::Result;
use gamewright_core::traits::AgentExecutor;
use gamewright_core::types::{FileDisposition, FilePlan};
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

use crate::fanout::FanOutWriter;
use crate::parse::parse_schema;

pub const STEP_NAME: &str = "write_code_files";

/// Fans out one generation task per planned file and writes the results.
pub struct CodeGenerationStage {
    writer: FanOutWriter,
}

impl CodeGenerationStage {
    pub fn new(executor: Arc<dyn AgentExecutor>, store: ArtifactStore) -> Self {
        Self {
            writer: FanOutWriter::new(executor, store),
        }
    }
}

impl StepExecutor for CodeGenerationStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let plan_json = ctx
                .upstream()
                .first()
                .map(|(_, out)| out.as_str())
                .unwrap_or_default();
            let plan: FilePlan = parse_schema(STEP_NAME, plan_json)?;

            let report = self.writer.run(&plan.files).await;

            let mut output = StepOutput::text(report.summary());
            for file in &report.files {
                match &file.disposition {
                    FileDisposition::Written { path } => {
                        output = output.with_artifact(file.filename.clone(), path.clone());
                    }
                    FileDisposition::MemoryOnly { .. } => {
                        // Retained under the original key, never on disk.
                        output = output.with_extra(file.filename.clone(), file.content.clone());
                    }
                    _ => {}
                }
            }
            Ok(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gamewright_flow::{Flow, FnStep, Step};
    use gamewright_test_utils::{sample_file_plan_json, ScriptedExecutor};

    use super::*;

    #[tokio::test]
    async fn test_generates_and_records_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Game");
        let store = ArtifactStore::new(&root);
        let executor = Arc::new(ScriptedExecutor::new().with_default("file body"));

        let mut flow = Flow::new();
        flow.register(Step::new(
            "file_structure_planning",
            Arc::new(FnStep(|_ctx| {
                Box::pin(async { Ok(StepOutput::text(sample_file_plan_json())) })
                    as BoxFuture<'static, Result<StepOutput>>
            })),
        ))
        .unwrap();
        flow.register(
            Step::new(STEP_NAME, Arc::new(CodeGenerationStage::new(executor, store)))
                .after("file_structure_planning"),
        )
        .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert!(report.succeeded());
        assert!(root.join("index.html").is_file());
        assert!(root.join("js/game.js").is_file());
        assert!(root.join("assets").is_dir());
        assert!(report.artifacts.contains_key("js/game.js"));
        assert!(report.output(STEP_NAME).unwrap().contains("Generated"));
    }
}
