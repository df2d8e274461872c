//! Request construction
//!
//! Every request is the two parent images followed by one text instruction.

use contracts::{Content, GenerateRequest, GenerationTask, ParentPhoto, Part};

/// Instruction for the trait analysis step
pub const ANALYSIS_PROMPT: &str = "Analyze the facial features of these two parents. \
Provide a short, realistic genetic feature breakdown of what their biological child might inherit. \
Focus on nose, eyes, face shape, and hair. Keep it under 50 words. Be respectful and scientific.";

/// Instruction for one image task
pub fn image_prompt(task: &GenerationTask) -> String {
    format!(
        "Generate a photorealistic image of a biological {} ({}) resulting from these two parents. \
         High quality, realistic.",
        task.gender,
        task.prompt_fragment()
    )
}

/// The two parent image parts, built once per run and reused by every request
#[derive(Debug, Clone)]
pub struct ParentParts {
    parts: [Part; 2],
}

impl ParentParts {
    pub fn new(parent1: &ParentPhoto, parent2: &ParentPhoto) -> Self {
        Self {
            parts: [
                Part::inline(parent1.image.clone()),
                Part::inline(parent2.image.clone()),
            ],
        }
    }

    /// Build a request: parent 1, parent 2, then the instruction
    pub fn request(&self, model: &str, prompt: impl Into<String>) -> GenerateRequest {
        let mut parts = Vec::with_capacity(3);
        parts.extend(self.parts.iter().cloned());
        parts.push(Part::text(prompt));

        GenerateRequest {
            model: model.to_string(),
            contents: Content::from_parts(parts),
        }
    }
}
