//! Story catalogue and theme resolution.
//!
//! Every story identifier, including ones we have never heard of, resolves
//! to a complete [`ThemeConfig`]. Resolution is a pure lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stories a session can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryId {
    SpaceAdventure,
    PrisonEscape,
    PlaneCrash,
    /// Fallback for identifiers outside the catalogue.
    Unknown,
}

impl StoryId {
    /// Selectable stories in menu order.
    pub const ALL: [StoryId; 3] = [
        StoryId::SpaceAdventure,
        StoryId::PrisonEscape,
        StoryId::PlaneCrash,
    ];

    /// Parse a story identifier. Never fails; unrecognized input maps to
    /// [`StoryId::Unknown`].
    ///
    /// Accepts the kebab-case ids (`prison-escape`) as well as the display
    /// labels used on the selection screen (`A prison escape`).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "space-adventure" | "space_adventure" | "a space adventure" => StoryId::SpaceAdventure,
            "prison-escape" | "prison_escape" | "a prison escape" => StoryId::PrisonEscape,
            "plane-crash" | "plane_crash" | "a plane crash survivor" => StoryId::PlaneCrash,
            _ => StoryId::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoryId::SpaceAdventure => "space-adventure",
            StoryId::PrisonEscape => "prison-escape",
            StoryId::PlaneCrash => "plane-crash",
            StoryId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosmetic colours for a story, as `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: &'static str,
    pub accent: &'static str,
    pub alert: &'static str,
}

impl Palette {
    /// The green-on-black console look.
    pub const CONSOLE: Palette = Palette {
        primary: "#86efac",
        accent: "#22c55e",
        alert: "#ef4444",
    };
}

/// Narrative and cosmetic parameters for one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeConfig {
    pub story: StoryId,
    pub title: &'static str,
    pub tagline: &'static str,
    pub palette: Palette,
    /// Instruction text given to the narrator, and shown in the welcome line.
    pub initial_prompt: &'static str,
}

/// Resolve a story to its theme. Total: every input yields a valid config.
pub fn resolve(story: StoryId) -> ThemeConfig {
    match story {
        StoryId::SpaceAdventure => ThemeConfig {
            story,
            title: "A Space Adventure",
            tagline: "Explore the unknown reaches of the galaxy.",
            palette: Palette::CONSOLE,
            initial_prompt: SPACE_ADVENTURE_PROMPT,
        },
        StoryId::PrisonEscape => ThemeConfig {
            story,
            title: "A Prison Escape",
            tagline: "Plan your daring escape from a high-security facility.",
            palette: Palette {
                primary: "#cbd5e1",
                accent: "#f59e0b",
                alert: "#dc2626",
            },
            initial_prompt: PRISON_ESCAPE_PROMPT,
        },
        StoryId::PlaneCrash => ThemeConfig {
            story,
            title: "A Plane Crash Survivor",
            tagline: "Survive in the wilderness after a catastrophic crash.",
            palette: Palette {
                primary: "#bbf7d0",
                accent: "#65a30d",
                alert: "#ea580c",
            },
            initial_prompt: PLANE_CRASH_PROMPT,
        },
        StoryId::Unknown => ThemeConfig {
            story,
            title: "An Unknown Adventure",
            tagline: "Wherever the console takes you.",
            palette: Palette::CONSOLE,
            initial_prompt: DEFAULT_PROMPT,
        },
    }
}

/// Resolve a raw identifier string.
pub fn resolve_str(story: &str) -> ThemeConfig {
    resolve(StoryId::parse(story))
}

const SPACE_ADVENTURE_PROMPT: &str = "\
You are an AI game master for an open-world text-based adventure game. Don't tell them you are a game master or any other detail that will break immersion.
Your role is to guide the player through a dynamic, immersive experience where they have complete freedom to explore, investigate, and interact with planet RS-232. There are no predefined choices or restrictions.

The game is set on a remote mining planet where communication has been lost, and strange events have begun to unfold. The player can describe their actions, make choices, or solve problems freely using natural language, and you will adapt the story in response to their input. Their role and abilities will evolve based on the choices they make.

Key Guidelines:
1. Allow the player to freely describe any actions, decisions, or explorations they want to pursue. Be open to any input.
2. Respond dynamically by adjusting the story, environment, or consequences to match their actions. No restrictions or predefined lists of actions should be provided.
3. Track the player's health, equipment, and progress based on their choices and actions. Add unexpected situations like getting a graze on the finger that needs treating before infection sets in or equipment failures.
4. Keep the narrative immersive, realistic, and reactive to the player's decisions.
5. Introduce challenges, puzzles, and twists based on the player's choices, but ensure they can always use their creativity to overcome them.
6. Do not guide the player to a fixed path. Let their imagination and curiosity drive the story but sticking with the theme.
7. The player's choices should shape the unfolding events, including alien encounters, environmental hazards, or technological issues, and the player's character can change roles or skills accordingly.
8. The player will have a few other companions of varying backgrounds like doctor, engineer, and soldier. They can offer help or even be fatally injured. Other people can appear and even join the team.

If the player has a companion, behave as if they are asking what to do; otherwise, behave as if you're the character's inner monologue.

Keep responses short enough to not overwhelm the player with text.";

const PRISON_ESCAPE_PROMPT: &str = "\
You wake up in a cold, damp cell. The sound of guards patrolling echoes through the corridors.

Narrate this escape as the prisoner's own senses and thoughts. Never mention that you are a game master.
1. Let the player attempt anything; judge the outcome by the prison's routines, its guards and its locks.
2. Guards keep schedules, notice noise, and remember faces. Every risk the player takes should raise the tension.
3. Other inmates can be bargained with, betrayed, or recruited.
4. Never hand the player a list of options. Describe what they see, hear and feel, then wait.

Keep responses short enough to not overwhelm the player with text.";

const PLANE_CRASH_PROMPT: &str = "\
You regain consciousness amidst the wreckage of your plane. The dense jungle surrounds you.

Narrate this survival story as the survivor's own senses and thoughts. Never mention that you are a game master.
1. Let the player attempt anything; judge the outcome by the jungle, the weather and what was salvaged from the wreck.
2. Track injuries, hunger, thirst and supplies, and let small mistakes compound.
3. Other survivors may be found alive, wounded, or not at all.
4. Never hand the player a list of options. Describe what they see, hear and feel, then wait.

Keep responses short enough to not overwhelm the player with text.";

const DEFAULT_PROMPT: &str = "You begin your adventure...";
