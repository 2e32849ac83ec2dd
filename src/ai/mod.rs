// src/ai/mod.rs

//! Question generation through the Gemini API.
//!
//! `prompt` builds the instruction, `gemini` performs the call and
//! `extract` turns the model's free text into validated questions.

pub mod error;
pub mod extract;
pub mod gemini;
pub mod prompt;

use async_trait::async_trait;

pub use error::GenerationError;
pub use extract::extract_questions;
pub use gemini::GeminiClient;
pub use prompt::build_prompt;

use crate::models::question::GeneratedQuestion;

/// Anything that can turn a prompt into raw model text.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Runs prompt building, the model call and extraction for one topic.
pub async fn generate_questions(
    generator: &dyn QuestionGenerator,
    topic: &str,
    count: u32,
) -> Result<Vec<GeneratedQuestion>, GenerationError> {
    let prompt = build_prompt(topic, count);
    let raw = generator.complete(&prompt).await?;
    tracing::debug!("Model returned {} characters", raw.len());
    extract_questions(&raw)
}
