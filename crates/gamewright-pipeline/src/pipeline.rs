use std::sync::Arc;

use tracing::{info, warn};

use gamewright_artifacts::ArtifactStore;
use gamewright_core::concept::ConceptInput;
use gamewright_core::config::AppConfig;
use gamewright_core::error::Result;
use gamewright_core::traits::AgentExecutor;
use gamewright_flow::{Flow, FlowReport, ProgressEvent, Step};
use gamewright_tools::{AudioSearchTool, GenerationTool, ImageGenerationTool};

use crate::recovery::{AssetRecoveryPolicy, WithFallback};
use crate::stages::{
    placeholder_report, render_launcher, render_readme, AssetGenerationStage, CodeGenerationStage,
    ConceptExpansionStage, FilePlanningStage, FinalizeStage, QaReviewStage, SaveTextStage,
    QA_REPORT_PATH,
};

/// Assembles and runs the full game-generation flow.
///
/// The configuration is taken once at construction; nothing re-reads it
/// mid-run.
pub struct GamePipeline {
    config: AppConfig,
    executor: Arc<dyn AgentExecutor>,
    store: ArtifactStore,
}

impl GamePipeline {
    pub fn new(config: AppConfig, executor: Arc<dyn AgentExecutor>) -> Self {
        let store = ArtifactStore::new(config.pipeline.output_root());
        Self {
            config,
            executor,
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Register every stage into a fresh flow.
    pub fn flow(&self) -> Result<Flow> {
        let image_tool = Arc::new(GenerationTool::Image(ImageGenerationTool::new(
            self.config.images.clone(),
        )));
        let audio_tool = Arc::new(GenerationTool::Audio(AudioSearchTool::new(
            self.config.audio.clone(),
        )));

        let mut flow = Flow::new();
        flow.register(Step::new(
            "concept_expansion",
            Arc::new(ConceptExpansionStage::new(self.executor.clone())),
        ))?;
        flow.register(
            Step::new(
                "save_concept",
                Arc::new(SaveTextStage::new(self.store.clone(), "game_concept.txt")),
            )
            .after("concept_expansion"),
        )?;
        flow.register(
            Step::new(
                "file_structure_planning",
                Arc::new(FilePlanningStage::new(self.executor.clone())),
            )
            .after("concept_expansion"),
        )?;
        flow.register(
            Step::new(
                "save_file_structure",
                Arc::new(SaveTextStage::new(self.store.clone(), "file_structure.txt")),
            )
            .after("file_structure_planning"),
        )?;
        flow.register(
            Step::new(
                "write_code_files",
                Arc::new(CodeGenerationStage::new(
                    self.executor.clone(),
                    self.store.clone(),
                )),
            )
            .after("file_structure_planning"),
        )?;

        let primary = AssetGenerationStage::new(
            self.store.clone(),
            image_tool.clone(),
            audio_tool.clone(),
        );
        let policy = AssetRecoveryPolicy::new(
            self.store.clone(),
            self.config.pipeline.recovery_threshold,
            image_tool,
            audio_tool,
        );
        flow.register(
            Step::new(
                "asset_generation",
                Arc::new(WithFallback::new(primary, policy, self.store.clone())),
            )
            .after("concept_expansion"),
        )?;

        flow.register(
            Step::new(
                "qa_review",
                Arc::new(QaReviewStage::new(self.executor.clone(), self.store.clone())),
            )
            .after("write_code_files")
            .after("asset_generation"),
        )?;
        flow.register(
            Step::new("finalize", Arc::new(FinalizeStage::new(self.store.clone())))
                .after("qa_review")
                .after("concept_expansion"),
        )?;
        Ok(flow)
    }

    /// Run the whole pipeline for one concept.
    pub async fn run(&self, concept: &ConceptInput) -> Result<FlowReport> {
        self.run_with_progress(concept, |_| {}).await
    }

    /// Run the pipeline, reporting step transitions through `on_event`.
    pub async fn run_with_progress(
        &self,
        concept: &ConceptInput,
        on_event: impl FnMut(ProgressEvent<'_>),
    ) -> Result<FlowReport> {
        let flow = self.flow()?;
        let report = flow.run_with_progress(concept.as_pairs(), on_event).await?;
        self.ensure_baseline_artifacts(concept).await;
        info!(run_id = %report.run_id, "Pipeline run complete");
        Ok(report)
    }

    /// Best-effort backstop: whatever the run managed, leave a readable
    /// directory behind — a QA report, a README naming the storyline, and
    /// a launcher page.
    pub async fn ensure_baseline_artifacts(&self, concept: &ConceptInput) {
        if !self.store.exists(QA_REPORT_PATH) {
            let report = placeholder_report("the pipeline did not reach the QA stage");
            if let Err(e) = self.store.write_text(QA_REPORT_PATH, &report).await {
                warn!(error = %e, "Placeholder QA report write failed");
            }
        }
        if !self.store.exists("README.md") {
            let readme = render_readme("Untitled Game", None, &concept.storyline, "");
            if let Err(e) = self.store.write_text("README.md", &readme).await {
                warn!(error = %e, "Placeholder README write failed");
            }
        }
        if !self.store.exists("index.html") {
            if let Err(e) = self
                .store
                .write_text("index.html", &render_launcher("Untitled Game"))
                .await
            {
                warn!(error = %e, "Placeholder launcher write failed");
            }
        }
    }
}
