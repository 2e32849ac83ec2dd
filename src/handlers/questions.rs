// src/handlers/questions.rs

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::{DEFAULT_QUESTION_LIMIT, DEFAULT_SCORE_LIMIT, MAX_QUESTION_LIMIT},
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question, Step},
        score::CreateScoreRequest,
    },
    store::QuestionStore,
};

/// Query parameters for `GET /api/questions`.
///
/// Values are taken as text so malformed input yields a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub step: Option<String>,
    pub limit: Option<String>,
}

fn parse_limit(raw: Option<&str>, default: i64) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map(|n| n.clamp(1, MAX_QUESTION_LIMIT))
            .map_err(|_| AppError::BadRequest(format!("Invalid limit '{}'", s))),
    }
}

fn parse_step(raw: &str) -> Result<Step, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(Step::from_number)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid step '{}', expected 1, 2 or 3", raw)))
}

/// Lists questions, scores or collection counts depending on the query.
///
/// * `type=stats` returns counts per collection.
/// * `type=scores` returns the most recent scores.
/// * `type=generated` returns the most recent AI-generated questions.
/// * `step=N` returns that step's questions in order.
/// * no filter returns questions from all steps, shuffled.
pub async fn list_questions(
    State(store): State<Arc<dyn QuestionStore>>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    match params.kind.as_deref().map(str::trim) {
        Some("stats") => return Ok(Json(store.stats().await?).into_response()),
        Some("scores") => {
            let limit = parse_limit(params.limit.as_deref(), DEFAULT_SCORE_LIMIT)?;
            return Ok(Json(store.recent_scores(limit).await?).into_response());
        }
        Some("generated") => {
            let limit = parse_limit(params.limit.as_deref(), DEFAULT_QUESTION_LIMIT)?;
            return Ok(Json(store.list_generated(limit).await?).into_response());
        }
        Some("") | None => {}
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown type '{}'", other)));
        }
    }

    let limit = parse_limit(params.limit.as_deref(), DEFAULT_QUESTION_LIMIT)?;

    let questions = match params.step.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => store.list_step(parse_step(raw)?, limit).await?,
        None => mixed_questions(store.as_ref(), limit).await?,
    };

    Ok(Json(questions).into_response())
}

/// Up to `limit` questions drawn from all three steps, in random order.
async fn mixed_questions(store: &dyn QuestionStore, limit: i64) -> Result<Vec<Question>, AppError> {
    let (one, two, three) = tokio::try_join!(
        store.list_step(Step::One, limit),
        store.list_step(Step::Two, limit),
        store.list_step(Step::Three, limit),
    )?;

    let mut merged: Vec<Question> = one.into_iter().chain(two).chain(three).collect();
    merged.shuffle(&mut rand::thread_rng());
    merged.truncate(usize::try_from(limit).unwrap_or(0));
    Ok(merged)
}

/// Creates either a score (`"type": "score"`) or a question.
///
/// A question without `step` goes to the AI/custom pool: it shows up under
/// `type=generated` and can be deleted, but is not part of the mixed step
/// listing. Send `"step": 1..3` to append it to a step collection instead.
pub async fn create_record(
    State(store): State<Arc<dyn QuestionStore>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    if body.get("type").and_then(Value::as_str) == Some("score") {
        let request: CreateScoreRequest = serde_json::from_value(body)?;
        let score = store.insert_score(request.into_new_score()?).await?;
        tracing::info!(id = score.id, score = score.score, total = score.total, "Score recorded");
        return Ok((StatusCode::CREATED, Json(serde_json::to_value(score)?)));
    }

    let request: CreateQuestionRequest = serde_json::from_value(body)?;
    let (collection, new_question) = request.into_new_question()?;
    let question = store.insert_question(collection, new_question).await?;
    tracing::info!(id = question.id, source = question.source.as_str(), "Question created");

    Ok((StatusCode::CREATED, Json(serde_json::to_value(question)?)))
}

/// An id as sent by clients, either `12` or `"12"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct DeleteQuestionsRequest {
    ids: Option<Vec<IdValue>>,
}

/// Deletes AI-generated questions by id. Unknown ids are not an error.
pub async fn delete_questions(
    State(store): State<Arc<dyn QuestionStore>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: DeleteQuestionsRequest = if body.is_empty() {
        DeleteQuestionsRequest { ids: None }
    } else {
        serde_json::from_slice(&body)?
    };

    let raw_ids = request
        .ids
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| AppError::BadRequest("ids must be a non-empty array".to_string()))?;

    // Ids that are not numbers cannot match any record.
    let ids: Vec<i64> = raw_ids
        .into_iter()
        .filter_map(|id| match id {
            IdValue::Number(n) => Some(n),
            IdValue::Text(s) => s.trim().parse().ok(),
        })
        .collect();

    let count = store.delete_generated(&ids).await?;
    tracing::info!(requested = ids.len(), deleted = count, "Deleted generated questions");

    Ok(Json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}
