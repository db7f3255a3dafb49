use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Per-difficulty session parameters. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    /// How many cats the scene is asked to contain. Detection decides the real count.
    pub expected_targets: u32,
    pub time_limit_secs: u32,
    pub hints: u32,
    pub points_per_target: u32,
    pub label: &'static str,
}

const EASY: DifficultyConfig = DifficultyConfig {
    expected_targets: 7,
    time_limit_secs: 90,
    hints: 3,
    points_per_target: 100,
    label: "Easy",
};

const MEDIUM: DifficultyConfig = DifficultyConfig {
    expected_targets: 10,
    time_limit_secs: 120,
    hints: 2,
    points_per_target: 200,
    label: "Medium",
};

const HARD: DifficultyConfig = DifficultyConfig {
    expected_targets: 12,
    time_limit_secs: 180,
    hints: 1,
    points_per_target: 300,
    label: "Expert",
};

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn config(&self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => EASY,
            Difficulty::Medium => MEDIUM,
            Difficulty::Hard => HARD,
        }
    }

    pub fn label(&self) -> &'static str {
        self.config().label
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering style requested from the image provider. Purely cosmetic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtStyle {
    #[default]
    Minecraft,
    Impressionism,
    Realistic,
    Cartoon,
    Sketch,
    Abstract,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 6] = [
        ArtStyle::Minecraft,
        ArtStyle::Cartoon,
        ArtStyle::Impressionism,
        ArtStyle::Realistic,
        ArtStyle::Sketch,
        ArtStyle::Abstract,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArtStyle::Minecraft => "Minecraft (Voxel)",
            ArtStyle::Impressionism => "Impressionism",
            ArtStyle::Realistic => "Realistic",
            ArtStyle::Cartoon => "Cartoon",
            ArtStyle::Sketch => "Pencil Sketch",
            ArtStyle::Abstract => "Abstract",
        }
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
