// src/handlers/generate.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
    ai::{self, QuestionGenerator},
    config::DEFAULT_GENERATE_COUNT,
    error::AppError,
    models::question::{Collection, Difficulty},
    store::QuestionStore,
};

fn default_count() -> u32 {
    DEFAULT_GENERATE_COUNT
}

/// DTO for `POST /api/generate`.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    /// Topic the questions should cover.
    #[validate(length(min = 1, max = 500))]
    pub prompt: String,
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 20))]
    pub count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Generates questions on a topic with the AI and stores the usable ones.
///
/// A failed insert only drops that question; the rest of the batch is kept.
pub async fn generate_questions(
    State(store): State<Arc<dyn QuestionStore>>,
    State(generator): State<Arc<dyn QuestionGenerator>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let topic = payload.prompt.trim();
    if topic.is_empty() {
        return Err(AppError::BadRequest("Prompt cannot be empty".to_string()));
    }

    tracing::info!(topic, count = payload.count, difficulty = %payload.difficulty, "Generating questions");

    let generated = ai::generate_questions(generator.as_ref(), topic, payload.count).await?;
    let generated_count = generated.len();

    let mut saved = Vec::with_capacity(generated_count);
    for (index, question) in generated.into_iter().enumerate() {
        match store
            .insert_question(Collection::Generated, question.with_difficulty(payload.difficulty))
            .await
        {
            Ok(q) => saved.push(q),
            Err(e) => tracing::error!(index, "Failed to save generated question: {}", e),
        }
    }

    if saved.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "none of the {} generated questions could be saved",
            generated_count
        )));
    }

    tracing::info!("Saved {} of {} generated questions", saved.len(), generated_count);

    Ok(Json(serde_json::json!({
        "success": true,
        "count": saved.len(),
        "questions": saved,
    })))
}
