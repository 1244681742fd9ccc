use futures::future::BoxFuture;
use tracing::warn;

use gamewright_artifacts::ArtifactStore;
use gamewright_core::concept::GameConcept;
use gamewright_core::error::Result;
use gamewright_core::types::AssetKind;
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

use crate::parse::extract_json;

/// Build the README from the title, storyline, and QA summary.
pub(crate) fn render_readme(title: &str, tagline: Option<&str>, storyline: &str, qa_summary: &str) -> String {
    let mut readme = format!("# {}\n\n", title);
    if let Some(tagline) = tagline {
        readme.push_str(&format!("*{}*\n\n", tagline));
    }
    readme.push_str(&format!("## Storyline\n\n{}\n\n", storyline));
    readme.push_str(
        "## How to play\n\nOpen `index.html` in a browser. Generated assets live under \
         `assets/images` and `assets/audio`; their manifests sit next to them.\n\n",
    );
    if !qa_summary.is_empty() {
        readme.push_str(&format!("## QA summary\n\n{}\n", qa_summary));
    }
    readme
}

/// Minimal launcher page used when code generation produced no entry point.
pub(crate) fn render_launcher(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>{title}</title>\n\
         </head>\n<body>\n  <h1>{title}</h1>\n  <p>The generated build did not include an entry \
         page. Assets are available under <code>assets/</code>.</p>\n</body>\n</html>\n"
    )
}

/// Final stage: sweeps stray assets into the canonical subtree, writes the
/// README, and guarantees a launcher page exists.
pub struct FinalizeStage {
    store: ArtifactStore,
}

impl FinalizeStage {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl StepExecutor for FinalizeStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            // Sweep anything generation left outside assets/ into place.
            let roots = vec![self.store.root().to_path_buf()];
            let mut swept = 0;
            for kind in [AssetKind::Image, AssetKind::Audio] {
                match self.store.copy_assets(&roots, kind) {
                    Ok(copied) => swept += copied.len(),
                    Err(e) => warn!(kind = ?kind, error = %e, "Asset sweep failed"),
                }
            }

            let concept = ctx
                .upstream_output("concept_expansion")
                .and_then(|raw| serde_json::from_str::<GameConcept>(extract_json(raw)).ok());
            let title = concept
                .as_ref()
                .map(|c| c.title.as_str())
                .unwrap_or("Untitled Game");
            let tagline = concept.as_ref().map(|c| c.tagline.as_str());

            let storyline = ctx.input("Storyline").unwrap_or_default();
            let qa_summary = ctx
                .upstream_output("qa_review")
                .map(|qa| qa.lines().take(20).collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();

            let readme = render_readme(title, tagline, storyline, &qa_summary);
            let readme_path = self.store.write_text("README.md", &readme).await?;
            let mut output = StepOutput::default()
                .with_artifact("README.md", readme_path.display().to_string());

            if !self.store.exists("index.html") {
                let launcher = render_launcher(title);
                match self.store.write_text("index.html", &launcher).await {
                    Ok(path) => {
                        output = output.with_artifact("index.html", path.display().to_string());
                    }
                    Err(e) => warn!(error = %e, "Fallback launcher write failed"),
                }
            }

            output.text = format!(
                "Finalized '{}': README written, {} stray assets swept into place.",
                title, swept
            );
            Ok(output)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use gamewright_flow::{Flow, FnStep, Step};
    use gamewright_test_utils::sample_game_concept_json;

    use super::*;

    fn fixed_step(name: &str, output: &str) -> Step {
        let output = output.to_string();
        Step::new(
            name,
            Arc::new(FnStep(move |_ctx| {
                let output = output.clone();
                Box::pin(async move { Ok(StepOutput::text(output)) })
                    as BoxFuture<'static, Result<StepOutput>>
            })),
        )
    }

    async fn run_finalize(store: &ArtifactStore) {
        let mut flow = Flow::new();
        flow.register(fixed_step("concept_expansion", &sample_game_concept_json()))
            .unwrap();
        flow.register(fixed_step("qa_review", "All clear.")).unwrap();
        flow.register(
            Step::new("finalize", Arc::new(FinalizeStage::new(store.clone())))
                .after("qa_review")
                .after("concept_expansion"),
        )
        .unwrap();

        let inputs = BTreeMap::from([("Storyline".to_string(), "A hero's journey".to_string())]);
        let report = flow.run(inputs).await.unwrap();
        assert!(report.succeeded());
    }

    #[tokio::test]
    async fn test_readme_contains_storyline_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));
        run_finalize(&store).await;

        let readme = store.read_to_string("README.md").await.unwrap();
        assert!(readme.contains("A hero's journey"));
        assert!(readme.contains("Echoes of the Vale"));
        assert!(readme.contains("All clear."));
    }

    #[tokio::test]
    async fn test_fallback_launcher_written_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));
        run_finalize(&store).await;

        let launcher = store.read_to_string("index.html").await.unwrap();
        assert!(launcher.contains("<h1>Echoes of the Vale</h1>"));
    }

    #[tokio::test]
    async fn test_existing_launcher_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));
        store
            .write_text("index.html", "<html>real game</html>")
            .await
            .unwrap();
        run_finalize(&store).await;

        assert_eq!(
            store.read_to_string("index.html").await.unwrap(),
            "<html>real game</html>"
        );
    }

    #[tokio::test]
    async fn test_sweeps_stray_assets() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));
        // A generation step dropped an image outside the canonical subtree.
        store.write_text("sprites/stray.png", "png bytes").await.unwrap();
        run_finalize(&store).await;

        assert!(store.exists("assets/images/stray.png"));
    }
}
