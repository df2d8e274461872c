//! ResultAggregate - Orchestrator output
//!
//! The analysis text plus the eight offspring image slots of one run, and the
//! sparse `ProgressUpdate`s that stream it to the caller.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::{ContractError, InlineImage, ResultSlot};

/// Analysis text used when the analysis backend call fails
pub const ANALYSIS_UNAVAILABLE: &str = "Analysis currently unavailable.";

/// Analysis text used when the backend answers without any text
pub const ANALYSIS_EMPTY: &str = "Could not analyze traits.";

/// Field name of the analysis text in updates and serialized aggregates
pub const ANALYSIS_FIELD: &str = "analysis";

/// Accumulated result of one pipeline run
///
/// Every field starts empty/absent and is set at most once. Setters refuse to
/// overwrite, so a field never changes after it has been filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAggregate {
    #[serde(default, with = "analysis_text")]
    analysis: Option<String>,
    infant_boy: Option<InlineImage>,
    infant_girl: Option<InlineImage>,
    toddler_boy: Option<InlineImage>,
    toddler_girl: Option<InlineImage>,
    child_boy: Option<InlineImage>,
    child_girl: Option<InlineImage>,
    teen_boy: Option<InlineImage>,
    teen_girl: Option<InlineImage>,
}

/// Caller-facing completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// At least one image slot was filled
    Complete,
    /// Every image slot is absent
    NothingGenerated,
}

impl ResultAggregate {
    /// Create empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Analysis text, empty until the analysis step has finished
    pub fn analysis(&self) -> &str {
        self.analysis.as_deref().unwrap_or("")
    }

    /// Whether the analysis was written, even with an empty string
    pub fn has_analysis(&self) -> bool {
        self.analysis.is_some()
    }

    /// Image currently held by `slot`
    pub fn slot(&self, slot: ResultSlot) -> Option<&InlineImage> {
        match slot {
            ResultSlot::InfantBoy => self.infant_boy.as_ref(),
            ResultSlot::InfantGirl => self.infant_girl.as_ref(),
            ResultSlot::ToddlerBoy => self.toddler_boy.as_ref(),
            ResultSlot::ToddlerGirl => self.toddler_girl.as_ref(),
            ResultSlot::ChildBoy => self.child_boy.as_ref(),
            ResultSlot::ChildGirl => self.child_girl.as_ref(),
            ResultSlot::TeenBoy => self.teen_boy.as_ref(),
            ResultSlot::TeenGirl => self.teen_girl.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: ResultSlot) -> &mut Option<InlineImage> {
        match slot {
            ResultSlot::InfantBoy => &mut self.infant_boy,
            ResultSlot::InfantGirl => &mut self.infant_girl,
            ResultSlot::ToddlerBoy => &mut self.toddler_boy,
            ResultSlot::ToddlerGirl => &mut self.toddler_girl,
            ResultSlot::ChildBoy => &mut self.child_boy,
            ResultSlot::ChildGirl => &mut self.child_girl,
            ResultSlot::TeenBoy => &mut self.teen_boy,
            ResultSlot::TeenGirl => &mut self.teen_girl,
        }
    }

    /// Set the analysis text
    ///
    /// # Errors
    /// `FieldAlreadySet` if the analysis was already written.
    pub fn set_analysis(&mut self, text: impl Into<String>) -> Result<(), ContractError> {
        if self.has_analysis() {
            return Err(ContractError::FieldAlreadySet {
                field: ANALYSIS_FIELD,
            });
        }
        self.analysis = Some(text.into());
        Ok(())
    }

    /// Fill an image slot
    ///
    /// # Errors
    /// `FieldAlreadySet` if the slot already holds an image.
    pub fn fill_slot(&mut self, slot: ResultSlot, image: InlineImage) -> Result<(), ContractError> {
        let target = self.slot_mut(slot);
        if target.is_some() {
            return Err(ContractError::slot_already_set(slot));
        }
        *target = Some(image);
        Ok(())
    }

    /// Apply an update produced by the orchestrator
    pub fn apply(&mut self, update: &ProgressUpdate) -> Result<(), ContractError> {
        match update {
            ProgressUpdate::Analysis(text) => self.set_analysis(text.clone()),
            ProgressUpdate::Image { slot, image } => self.fill_slot(*slot, image.clone()),
        }
    }

    /// Merge an update into a caller-side copy
    ///
    /// Fields that are already set are left untouched. Returns whether anything changed.
    pub fn merge(&mut self, update: &ProgressUpdate) -> bool {
        self.apply(update).is_ok()
    }

    /// Filled slots in task table order
    pub fn filled_slots(&self) -> impl Iterator<Item = (ResultSlot, &InlineImage)> + '_ {
        ResultSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot).map(|image| (slot, image)))
    }

    /// Absent slots in task table order
    pub fn missing_slots(&self) -> Vec<ResultSlot> {
        ResultSlot::ALL
            .into_iter()
            .filter(|slot| self.slot(*slot).is_none())
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.filled_slots().count()
    }

    /// True when no image slot was filled
    pub fn is_empty_result(&self) -> bool {
        self.filled_count() == 0
    }

    pub fn status(&self) -> RunStatus {
        if self.is_empty_result() {
            RunStatus::NothingGenerated
        } else {
            RunStatus::Complete
        }
    }
}

/// `analysis` is a plain string on the wire; unset reads and writes as ""
mod analysis_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.filter(|t| !t.is_empty()))
    }
}

/// Sparse partial view of a `ResultAggregate`: the one field that just changed
///
/// Serializes as a single-entry map keyed by the aggregate field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    Analysis(String),
    Image {
        slot: ResultSlot,
        image: InlineImage,
    },
}

impl ProgressUpdate {
    /// Aggregate field this update sets
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Analysis(_) => ANALYSIS_FIELD,
            Self::Image { slot, .. } => slot.field_name(),
        }
    }

    pub fn slot(&self) -> Option<ResultSlot> {
        match self {
            Self::Analysis(_) => None,
            Self::Image { slot, .. } => Some(*slot),
        }
    }
}

impl Serialize for ProgressUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Analysis(text) => map.serialize_entry(ANALYSIS_FIELD, text)?,
            Self::Image { slot, image } => map.serialize_entry(slot.field_name(), image)?,
        }
        map.end()
    }
}
