use std::sync::Arc;

use chrono::Utc;
use futures::future::{join_all, BoxFuture};
use tracing::{info, warn};

use gamewright_artifacts::{ArtifactStore, AssetManifest, AssetRecord};
use gamewright_core::concept::GameConcept;
use gamewright_core::error::Result;
use gamewright_core::types::AssetKind;
use gamewright_flow::{StepContext, StepExecutor, StepOutput};
use gamewright_tools::{GenerationRequest, GenerationTool};

use crate::parse::extract_json;
use crate::recovery::ASSET_LOG_PATH;

/// One planned asset: logical name, prompt or query, destination relative
/// to the output root.
#[derive(Debug, Clone)]
struct PlannedAsset {
    name: String,
    spec: String,
    relative: String,
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive image prompts from the expanded concept: the main character, up
/// to two supporting characters, and the first level's backdrop.
fn plan_images(concept: &GameConcept) -> Vec<PlannedAsset> {
    let mut planned = vec![PlannedAsset {
        name: slug(&concept.main_character.name),
        spec: format!(
            "{}, {}, {}",
            concept.main_character.description, concept.main_character.role, concept.visual_style
        ),
        relative: format!("assets/images/{}.png", slug(&concept.main_character.name)),
    }];
    for character in concept.supporting_characters.iter().take(2) {
        planned.push(PlannedAsset {
            name: slug(&character.name),
            spec: format!("{}, {}", character.description, concept.visual_style),
            relative: format!("assets/images/{}.png", slug(&character.name)),
        });
    }
    if let Some(level) = concept.levels.first() {
        planned.push(PlannedAsset {
            name: format!("{}_backdrop", slug(&level.name)),
            spec: format!("{}, game background, {}", level.description, concept.visual_style),
            relative: format!("assets/images/{}_backdrop.png", slug(&level.name)),
        });
    }
    planned
}

/// Derive audio queries from the concept's audio style.
fn plan_audio(concept: &GameConcept) -> Vec<PlannedAsset> {
    vec![
        PlannedAsset {
            name: "background_music".into(),
            spec: format!("{} game background music loop", concept.audio_style),
            relative: "assets/audio/background_music.mp3".into(),
        },
        PlannedAsset {
            name: "jump".into(),
            spec: "jump sound effect".into(),
            relative: "assets/audio/jump.mp3".into(),
        },
        PlannedAsset {
            name: "coin".into(),
            spec: "coin pickup chime".into(),
            relative: "assets/audio/coin.mp3".into(),
        },
    ]
}

/// Primary asset stage: concurrent generation of concept-derived images
/// and audio, manifests written at the end.
///
/// Per-asset failures are logged and dropped; the recovery policy wrapped
/// around this stage decides whether the surviving output is enough.
pub struct AssetGenerationStage {
    store: ArtifactStore,
    image_tool: Arc<GenerationTool>,
    audio_tool: Arc<GenerationTool>,
}

impl AssetGenerationStage {
    pub fn new(
        store: ArtifactStore,
        image_tool: Arc<GenerationTool>,
        audio_tool: Arc<GenerationTool>,
    ) -> Self {
        Self {
            store,
            image_tool,
            audio_tool,
        }
    }

    async fn generate_kind(
        &self,
        kind: AssetKind,
        planned: Vec<PlannedAsset>,
    ) -> (usize, Vec<String>) {
        let tool = match kind {
            AssetKind::Image => &self.image_tool,
            AssetKind::Audio => &self.audio_tool,
        };

        // All requests in flight at once; the barrier below collects them
        // and only then touches the manifest.
        let tasks = planned.iter().map(|asset| async move {
            let destination = self.store.sanitize(&asset.relative).ok()?;
            let request =
                GenerationRequest::new(asset.name.clone(), asset.spec.clone(), destination);
            match tool.invoke(&request).await {
                Ok(outcome) => Some((asset.clone(), outcome)),
                Err(e) => {
                    warn!(asset = %asset.name, error = %e, "Asset generation failed");
                    None
                }
            }
        });
        let results = join_all(tasks).await;

        let mut manifest = AssetManifest::load_or_empty(&self.store, kind).await;
        let mut lines = Vec::new();
        let mut produced = 0;
        for (asset, outcome) in results.into_iter().flatten() {
            let mut record = AssetRecord::new(asset.relative.clone(), asset.spec.clone());
            if let Some(dimensions) = outcome.dimensions {
                record = record.with_dimensions(dimensions);
            }
            if let Some(url) = outcome.source_url {
                record = record.with_source_url(url);
            }
            if let Some(url) = outcome.preview_url {
                record = record.with_preview_url(url);
            }
            manifest.insert(asset.name.clone(), record);
            lines.push(format!(
                "[{}] generated {} -> {}",
                Utc::now().to_rfc3339(),
                asset.name,
                asset.relative
            ));
            produced += 1;
        }

        if let Err(e) = manifest.save(&self.store).await {
            warn!(kind = ?kind, error = %e, "Manifest save failed");
        }
        (produced, lines)
    }
}

impl StepExecutor for AssetGenerationStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let concept_raw = ctx
                .upstream()
                .first()
                .map(|(_, out)| out.as_str())
                .unwrap_or_default();

            // A malformed concept degrades to an empty plan; the recovery
            // policy then supplies the generic catalog.
            let (images, audio) = match serde_json::from_str::<GameConcept>(extract_json(concept_raw))
            {
                Ok(concept) => (plan_images(&concept), plan_audio(&concept)),
                Err(e) => {
                    warn!(error = %e, "Concept unparseable, skipping concept-derived assets");
                    (Vec::new(), Vec::new())
                }
            };

            info!(images = images.len(), audio = audio.len(), "Generating assets");
            let (image_count, mut lines) = self.generate_kind(AssetKind::Image, images).await;
            let (audio_count, audio_lines) = self.generate_kind(AssetKind::Audio, audio).await;
            lines.extend(audio_lines);

            if !lines.is_empty() {
                let existing = self
                    .store
                    .read_to_string(ASSET_LOG_PATH)
                    .await
                    .unwrap_or_default();
                let log = format!("{}{}\n", existing, lines.join("\n"));
                if let Err(e) = self.store.write_text(ASSET_LOG_PATH, &log).await {
                    warn!(error = %e, "Asset log write failed");
                }
            }

            Ok(StepOutput::text(format!(
                "Asset stage produced {} images and {} audio files.",
                image_count, audio_count
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use gamewright_test_utils::sample_game_concept_json;

    use super::*;

    #[test]
    fn test_plan_images_from_concept() {
        let concept: GameConcept =
            serde_json::from_str(&sample_game_concept_json()).unwrap();
        let planned = plan_images(&concept);

        // Main character, one supporting character, first level backdrop.
        assert_eq!(planned.len(), 3);
        assert_eq!(planned[0].name, "ash");
        assert_eq!(planned[0].relative, "assets/images/ash.png");
        assert!(planned[0].spec.contains("pixel art"));
        assert_eq!(planned[2].name, "the_meadow_backdrop");
    }

    #[test]
    fn test_plan_audio_uses_audio_style() {
        let concept: GameConcept =
            serde_json::from_str(&sample_game_concept_json()).unwrap();
        let planned = plan_audio(&concept);
        assert_eq!(planned.len(), 3);
        assert!(planned[0].spec.contains("chiptune"));
    }

    #[test]
    fn test_slug_sanitizes() {
        assert_eq!(slug("The Meadow"), "the_meadow");
        assert_eq!(slug("Grub!"), "grub_");
    }
}
