use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// The run's constant inputs: a short game concept in five fields.
///
/// Loaded from a knowledge JSON file whose keys match the concept
/// document format ("Storyline", "Game mechanics", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptInput {
    #[serde(rename = "Storyline")]
    pub storyline: String,
    #[serde(rename = "Game mechanics")]
    pub game_mechanics: String,
    #[serde(rename = "Characters and Interactive entities")]
    pub entities: String,
    #[serde(rename = "Levels and difficulty")]
    pub levels: String,
    #[serde(rename = "Visual and audio style")]
    pub visual_audio_style: String,
}

impl ConceptInput {
    /// Load from a concept JSON file, falling back to the built-in sample
    /// concept when the file is missing or malformed.
    pub fn load_or_sample(path: &Path) -> Self {
        match Self::load(path) {
            Ok(concept) => concept,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Concept file unavailable, using sample concept");
                Self::sample()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// A small built-in concept so a bare checkout still produces a game.
    pub fn sample() -> Self {
        Self {
            storyline: "A hero's journey".to_string(),
            game_mechanics: "platformer".to_string(),
            entities: "hero, goblin".to_string(),
            levels: "3 levels".to_string(),
            visual_audio_style: "pixel art".to_string(),
        }
    }

    /// Named input pairs in a stable order, for prompt construction.
    pub fn as_pairs(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Storyline".to_string(), self.storyline.clone()),
            ("Game_Mechanics".to_string(), self.game_mechanics.clone()),
            ("Entities".to_string(), self.entities.clone()),
            ("Levels".to_string(), self.levels.clone()),
            ("visualAudioStyle".to_string(), self.visual_audio_style.clone()),
        ])
    }
}

/// Level difficulty rating used by the expanded concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Boss,
}

/// A character in the expanded concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub role: String,
    pub description: String,
    #[serde(default)]
    pub abilities: Option<Vec<String>>,
    #[serde(default)]
    pub emotional_arc: Option<String>,
}

/// A level in the expanded concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub key_objectives: Vec<String>,
    #[serde(default)]
    pub enemies_obstacles: Vec<String>,
    #[serde(default)]
    pub boss_battle: Option<String>,
}

/// The concept-expansion stage's structured output.
///
/// Characters and levels are typed records handed to downstream prompt
/// construction directly, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConcept {
    pub title: String,
    pub tagline: String,
    pub overview: String,
    pub main_character: Character,
    #[serde(default)]
    pub supporting_characters: Vec<Character>,
    pub world_building: String,
    #[serde(default)]
    pub levels: Vec<LevelSpec>,
    #[serde(default)]
    pub gameplay_mechanics: Vec<String>,
    pub visual_style: String,
    pub audio_style: String,
    pub emotional_arc: String,
    pub conclusion: String,
}
