//! Agent roles and goals for each pipeline stage.

use gamewright_core::types::FileKind;

pub const CONCEPT_DESIGNER_ROLE: &str = "the Lead Game Designer of a small studio";

pub const CONCEPT_DESIGNER_GOAL: &str = "Expand the game concept inputs above into a complete \
design document. Respond with a single JSON object with the fields: title, tagline, overview, \
main_character, supporting_characters, world_building, levels, gameplay_mechanics, visual_style, \
audio_style, emotional_arc, conclusion. Characters have name, role, description, abilities, \
emotional_arc; levels have name, description, difficulty (Easy/Medium/Hard/Boss), key_objectives, \
enemies_obstacles, boss_battle.";

pub const ARCHITECT_ROLE: &str = "the System Architect planning a browser game's file layout";

pub const ARCHITECT_GOAL: &str = "From the expanded game concept, identify every file the game \
needs, clarify each file's purpose, define its content guidelines, and map its dependencies. \
Respond with a single JSON object: {\"files\": [{\"filename\", \"purpose\", \
\"content_guidelines\", \"dependencies\"}]}. Filenames are relative paths; use a trailing slash \
for directories.";

pub const QA_LEAD_ROLE: &str = "the QA Lead reviewing a generated browser game";

pub const QA_LEAD_GOAL: &str = "Analyze the generated code and assets described above, test the \
gameplay mechanics mentally, evaluate performance risks, assess user experience, identify bugs, \
and compile a QA report with findings and suggestions, in plain text.";

/// Developer role matched to the kind of file being generated.
pub fn developer_role(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Html => "a Senior Front-End Developer writing the game's HTML shell",
        FileKind::Css => "a UI/UX Designer writing the game's stylesheet",
        FileKind::Js => "a Senior JavaScript Developer writing game logic",
        FileKind::Json => "a Game Data Engineer writing configuration data",
        FileKind::Audio | FileKind::Asset => "an Asset Pipeline Developer preparing asset stubs",
    }
}

pub const GRAPHIC_DESIGNER_ROLE: &str = "the Graphic Designer creating the game's visual assets";

pub const SOUND_DESIGNER_ROLE: &str = "the Sound Designer sourcing the game's audio";
