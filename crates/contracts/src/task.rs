//! Generation task table
//!
//! The eight image steps of a run: every `Gender` crossed with every `AgeBand`,
//! in a fixed order that callers rely on for incremental rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gender variant of the generated offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Boy,
    Girl,
}

impl Gender {
    /// Word used inside the image prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boy => "boy",
            Self::Girl => "girl",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age band of the generated offspring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Infant,
    Toddler,
    Child,
    Teen,
}

impl AgeBand {
    /// All bands, youngest first
    pub const ALL: [AgeBand; 4] = [Self::Infant, Self::Toddler, Self::Child, Self::Teen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infant => "infant",
            Self::Toddler => "toddler",
            Self::Child => "child",
            Self::Teen => "teen",
        }
    }

    /// Age-specific prompt fragment embedded in the image instruction
    pub fn prompt_fragment(&self) -> &'static str {
        match self {
            Self::Infant => {
                "age 1 year, cute, happy, fully clothed, looking at camera. Soft, natural lighting."
            }
            Self::Toddler => {
                "age 4 years, playing or smiling, fully clothed. Consistent skin tone/hair. Cinematic lighting."
            }
            Self::Child => {
                "age 8 years, school portrait style, fully clothed. Preserve key identifying features."
            }
            Self::Teen => {
                "age 18 years, high school senior portrait or casual lifestyle, fully clothed, fashionable, confident."
            }
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image slot of the result aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultSlot {
    InfantBoy,
    InfantGirl,
    ToddlerBoy,
    ToddlerGirl,
    ChildBoy,
    ChildGirl,
    TeenBoy,
    TeenGirl,
}

impl ResultSlot {
    /// All slots in task table order
    pub const ALL: [ResultSlot; 8] = [
        Self::InfantBoy,
        Self::InfantGirl,
        Self::ToddlerBoy,
        Self::ToddlerGirl,
        Self::ChildBoy,
        Self::ChildGirl,
        Self::TeenBoy,
        Self::TeenGirl,
    ];

    /// Field name as exposed to callers (matches serde naming)
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::InfantBoy => "infantBoy",
            Self::InfantGirl => "infantGirl",
            Self::ToddlerBoy => "toddlerBoy",
            Self::ToddlerGirl => "toddlerGirl",
            Self::ChildBoy => "childBoy",
            Self::ChildGirl => "childGirl",
            Self::TeenBoy => "teenBoy",
            Self::TeenGirl => "teenGirl",
        }
    }

    /// Position in the task table (0-based)
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn gender(&self) -> Gender {
        match self {
            Self::InfantBoy | Self::ToddlerBoy | Self::ChildBoy | Self::TeenBoy => Gender::Boy,
            _ => Gender::Girl,
        }
    }

    pub fn age_band(&self) -> AgeBand {
        match self {
            Self::InfantBoy | Self::InfantGirl => AgeBand::Infant,
            Self::ToddlerBoy | Self::ToddlerGirl => AgeBand::Toddler,
            Self::ChildBoy | Self::ChildGirl => AgeBand::Child,
            Self::TeenBoy | Self::TeenGirl => AgeBand::Teen,
        }
    }
}

impl fmt::Display for ResultSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One image generation unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationTask {
    /// Aggregate slot the result lands in
    pub slot: ResultSlot,
    pub gender: Gender,
    pub age_band: AgeBand,
}

impl GenerationTask {
    const fn new(slot: ResultSlot, gender: Gender, age_band: AgeBand) -> Self {
        Self {
            slot,
            gender,
            age_band,
        }
    }

    pub fn prompt_fragment(&self) -> &'static str {
        self.age_band.prompt_fragment()
    }
}

/// Fixed image task table, executed strictly in this order
pub const TASK_TABLE: [GenerationTask; 8] = [
    GenerationTask::new(ResultSlot::InfantBoy, Gender::Boy, AgeBand::Infant),
    GenerationTask::new(ResultSlot::InfantGirl, Gender::Girl, AgeBand::Infant),
    GenerationTask::new(ResultSlot::ToddlerBoy, Gender::Boy, AgeBand::Toddler),
    GenerationTask::new(ResultSlot::ToddlerGirl, Gender::Girl, AgeBand::Toddler),
    GenerationTask::new(ResultSlot::ChildBoy, Gender::Boy, AgeBand::Child),
    GenerationTask::new(ResultSlot::ChildGirl, Gender::Girl, AgeBand::Child),
    GenerationTask::new(ResultSlot::TeenBoy, Gender::Boy, AgeBand::Teen),
    GenerationTask::new(ResultSlot::TeenGirl, Gender::Girl, AgeBand::Teen),
];

/// A pipeline step, used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Analysis,
    Image(ResultSlot),
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Image(slot) => slot.field_name(),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a single step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Backend produced the expected content
    Succeeded,
    /// Backend answered but without the expected content
    Empty,
    /// Backend call failed
    Failed,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}
