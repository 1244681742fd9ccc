//! Scripted executors and fixtures for pipeline tests.

use std::sync::Mutex;

use futures::future::BoxFuture;

use gamewright_core::error::{GamewrightError, Result};
use gamewright_core::traits::{AgentExecutor, AgentRequest};

/// An agent executor that answers from a fixed script.
///
/// Responses are matched by substring against the request's role, first
/// match wins. Served requests are recorded for assertions.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    seen: Mutex<Vec<AgentRequest>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `output` to any request whose role contains `role_part`.
    pub fn with_response(mut self, role_part: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses.push((role_part.into(), output.into()));
        self
    }

    /// Respond with `output` to requests no scripted entry matches.
    pub fn with_default(mut self, output: impl Into<String>) -> Self {
        self.default_response = Some(output.into());
        self
    }

    /// Requests served so far, in order.
    pub fn seen(&self) -> Vec<AgentRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl AgentExecutor for ScriptedExecutor {
    fn execute(&self, request: AgentRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(request.clone());
            let hit = self
                .responses
                .iter()
                .find(|(role_part, _)| request.role.contains(role_part.as_str()))
                .map(|(_, output)| output.clone())
                .or_else(|| self.default_response.clone());
            hit.ok_or_else(|| GamewrightError::StepFailed {
                step: request.role.clone(),
                message: "no scripted response".into(),
            })
        })
    }
}

/// An executor that always fails, for degradation tests.
pub struct FailingExecutor;

impl AgentExecutor for FailingExecutor {
    fn execute(&self, request: AgentRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            Err(GamewrightError::Upstream {
                service: "chat".into(),
                message: format!("scripted failure for role {}", request.role),
            })
        })
    }
}

/// A small but schema-complete expanded game concept.
pub fn sample_game_concept_json() -> String {
    serde_json::json!({
        "title": "Echoes of the Vale",
        "tagline": "Every jump remembers.",
        "overview": "A platformer about a hero crossing a fading valley.",
        "main_character": {
            "name": "Ash",
            "role": "Protagonist",
            "description": "A quiet wanderer with a wooden sword.",
            "abilities": ["double jump", "wall slide"],
            "emotional_arc": "doubt to resolve"
        },
        "supporting_characters": [
            {
                "name": "Grub",
                "role": "Antagonist",
                "description": "A scheming goblin.",
                "abilities": ["ambush"],
                "emotional_arc": null
            }
        ],
        "world_building": "A valley where memories settle as mist.",
        "levels": [
            {
                "name": "The Meadow",
                "description": "Gentle tutorial slopes.",
                "difficulty": "Easy",
                "key_objectives": ["reach the gate"],
                "enemies_obstacles": ["goblin scout"],
                "boss_battle": null
            },
            {
                "name": "The Hollow",
                "description": "Caverns with crumbling platforms.",
                "difficulty": "Medium",
                "key_objectives": ["light the braziers"],
                "enemies_obstacles": ["bats", "spikes"],
                "boss_battle": null
            },
            {
                "name": "The Summit",
                "difficulty": "Boss",
                "description": "The final climb.",
                "key_objectives": ["defeat Grub"],
                "enemies_obstacles": ["wind gusts"],
                "boss_battle": "Grub atop the old watchtower"
            }
        ],
        "gameplay_mechanics": ["jumping", "collecting echoes"],
        "visual_style": "pixel art",
        "audio_style": "chiptune",
        "emotional_arc": "loss to hope",
        "conclusion": "The vale remembers its hero."
    })
    .to_string()
}

/// A small file plan covering every classification branch.
pub fn sample_file_plan_json() -> String {
    serde_json::json!({
        "files": [
            {
                "filename": "index.html",
                "purpose": "Entry page that boots the game",
                "content_guidelines": "Single canvas, loads game.js",
                "dependencies": ["js/game.js", "css/style.css"]
            },
            {
                "filename": "css/style.css",
                "purpose": "Layout and canvas styling",
                "content_guidelines": "Dark background, centered canvas",
                "dependencies": []
            },
            {
                "filename": "js/game.js",
                "purpose": "Core game loop",
                "content_guidelines": "requestAnimationFrame loop, level loading",
                "dependencies": ["data/levels.json"]
            },
            {
                "filename": "data/levels.json",
                "purpose": "Level definitions",
                "content_guidelines": "One entry per level",
                "dependencies": []
            },
            {
                "filename": "assets/",
                "purpose": "Asset tree root",
                "content_guidelines": "Directory only",
                "dependencies": []
            }
        ]
    })
    .to_string()
}
