use std::sync::Arc;

use futures::future::BoxFuture;

use gamewright_core::concept::{Character, GameConcept, LevelSpec};
use gamewright_core::error::Result;
use gamewright_core::traits::{AgentExecutor, AgentRequest};
use gamewright_core::types::FilePlan;
use gamewright_flow::{StepContext, StepExecutor, StepOutput};

use crate::parse::parse_schema;
use crate::roles::{ARCHITECT_GOAL, ARCHITECT_ROLE};

pub const STEP_NAME: &str = "file_structure_planning";

fn character_line(character: &Character) -> String {
    let abilities = character
        .abilities
        .as_deref()
        .map(|a| a.join(", "))
        .unwrap_or_default();
    format!(
        "{} ({}): {} [abilities: {}]",
        character.name, character.role, character.description, abilities
    )
}

fn level_line(level: &LevelSpec) -> String {
    format!(
        "{} ({:?}): {} objectives: {}; hazards: {}",
        level.name,
        level.difficulty,
        level.description,
        level.key_objectives.join(", "),
        level.enemies_obstacles.join(", ")
    )
}

/// Materializes the expanded concept into a validated file plan.
///
/// The committed output is the canonical plan JSON; both the incoming
/// concept and the architect's reply must parse, otherwise the step fails
/// with a schema error and the code-generation subgraph is skipped.
pub struct FilePlanningStage {
    executor: Arc<dyn AgentExecutor>,
}

impl FilePlanningStage {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self { executor }
    }
}

impl StepExecutor for FilePlanningStage {
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, Result<StepOutput>> {
        Box::pin(async move {
            let concept_raw = ctx
                .upstream()
                .first()
                .map(|(_, out)| out.as_str())
                .unwrap_or_default();
            let concept: GameConcept = parse_schema(STEP_NAME, concept_raw)?;

            // The typed records travel straight into named inputs; the
            // ordering of characters and levels is theirs, not a key scheme's.
            let supporting = concept
                .supporting_characters
                .iter()
                .map(character_line)
                .collect::<Vec<_>>()
                .join("\n");
            let levels = concept
                .levels
                .iter()
                .map(level_line)
                .collect::<Vec<_>>()
                .join("\n");

            let request = AgentRequest::new(ARCHITECT_ROLE, ARCHITECT_GOAL)
                .with_context(vec![concept_raw.to_string()])
                .with_input("title", concept.title.clone())
                .with_input("overview", concept.overview.clone())
                .with_input("main_character", character_line(&concept.main_character))
                .with_input("supporting_characters", supporting)
                .with_input("levels", levels)
                .with_input("gameplay_mechanics", concept.gameplay_mechanics.join(", "))
                .with_input("visual_style", concept.visual_style.clone())
                .with_input("audio_style", concept.audio_style.clone());

            let raw = self.executor.execute(request).await?;
            let plan: FilePlan = parse_schema(STEP_NAME, &raw)?;

            Ok(StepOutput::text(serde_json::to_string_pretty(&plan)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gamewright_core::error::GamewrightError;
    use gamewright_flow::{Flow, FnStep, Step};
    use gamewright_core::types::StepStatus;
    use gamewright_test_utils::{sample_file_plan_json, sample_game_concept_json, ScriptedExecutor};

    use super::*;

    fn concept_step(output: String) -> Step {
        Step::new(
            "concept_expansion",
            Arc::new(FnStep(move |_ctx| {
                let output = output.clone();
                Box::pin(async move { Ok(StepOutput::text(output)) })
                    as BoxFuture<'static, Result<StepOutput>>
            })),
        )
    }

    #[tokio::test]
    async fn test_commits_canonical_plan_json() {
        let executor = Arc::new(
            ScriptedExecutor::new().with_response("System Architect", sample_file_plan_json()),
        );
        let mut flow = Flow::new();
        flow.register(concept_step(sample_game_concept_json())).unwrap();
        flow.register(
            Step::new(STEP_NAME, Arc::new(FilePlanningStage::new(executor.clone())))
                .after("concept_expansion"),
        )
        .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        let plan: FilePlan = serde_json::from_str(report.output(STEP_NAME).unwrap()).unwrap();
        assert_eq!(plan.files.len(), 5);
        assert_eq!(plan.files[0].filename, "index.html");

        // Typed records reached the architect as named inputs.
        let seen = executor.seen();
        let arch_request = seen.iter().find(|r| r.role.contains("Architect")).unwrap();
        assert!(arch_request.inputs.get("levels").unwrap().contains("The Meadow"));
        assert!(arch_request
            .inputs
            .get("main_character")
            .unwrap()
            .contains("Ash"));
    }

    #[tokio::test]
    async fn test_malformed_concept_fails_schema_validation() {
        let executor =
            Arc::new(ScriptedExecutor::new().with_default(sample_file_plan_json()));
        let mut flow = Flow::new();
        flow.register(concept_step("this is not json".into())).unwrap();
        flow.register(
            Step::new(STEP_NAME, Arc::new(FilePlanningStage::new(executor)))
                .after("concept_expansion"),
        )
        .unwrap();

        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(report.status(STEP_NAME), Some(StepStatus::Failed));
        let step = report.steps.iter().find(|s| s.name == STEP_NAME).unwrap();
        assert!(step.error.as_deref().unwrap().contains("schema validation"));
    }

    #[tokio::test]
    async fn test_malformed_plan_reply_fails() {
        let executor = Arc::new(
            ScriptedExecutor::new().with_response("System Architect", "no plan here"),
        );
        let stage = FilePlanningStage::new(executor);

        let mut flow = Flow::new();
        flow.register(concept_step(sample_game_concept_json())).unwrap();
        flow.register(Step::new(STEP_NAME, Arc::new(stage)).after("concept_expansion"))
            .unwrap();
        let report = flow.run(BTreeMap::new()).await.unwrap();
        assert_eq!(report.status(STEP_NAME), Some(StepStatus::Failed));
    }

    #[test]
    fn test_schema_error_variant() {
        let err = parse_schema::<FilePlan>(STEP_NAME, "nope").unwrap_err();
        assert!(matches!(err, GamewrightError::SchemaValidation { .. }));
    }
}
