// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Represents the 'scores' table in the database.
/// One row per completed quiz attempt, never updated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: i64,
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    /// Seconds spent on the attempt.
    pub duration: Option<i32>,
    /// "1", "2", "3" or "mixed".
    pub step: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    pub duration: Option<i32>,
    pub step: Option<String>,
}

/// Step label as sent by clients, either `2` or `"2"`/`"mixed"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StepLabel {
    Number(i64),
    Text(String),
}

impl StepLabel {
    pub fn into_label(self) -> String {
        match self {
            StepLabel::Number(n) => n.to_string(),
            StepLabel::Text(s) => s.trim().to_string(),
        }
    }
}

/// DTO for submitting a quiz result.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScoreRequest {
    #[validate(range(min = 0))]
    pub score: i32,
    #[validate(range(min = 0))]
    pub total: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: Option<f64>,
    #[validate(range(min = 0))]
    pub duration: Option<i32>,
    pub step: Option<StepLabel>,
}

impl CreateScoreRequest {
    pub fn into_new_score(self) -> Result<NewScore, AppError> {
        self.validate()?;

        if self.score > self.total {
            return Err(AppError::BadRequest(format!(
                "score ({}) cannot exceed total ({})",
                self.score, self.total
            )));
        }

        Ok(NewScore {
            score: self.score,
            total: self.total,
            percentage: self
                .percentage
                .unwrap_or_else(|| compute_percentage(self.score, self.total)),
            duration: self.duration,
            step: self.step.map(StepLabel::into_label).filter(|s| !s.is_empty()),
        })
    }
}

/// `score / total * 100`, rounded to two decimals. Zero when nothing was attempted.
pub fn compute_percentage(score: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = f64::from(score) * 100.0 / f64::from(total);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> Result<NewScore, AppError> {
        serde_json::from_value::<CreateScoreRequest>(body)?.into_new_score()
    }

    #[test]
    fn test_percentage_is_computed_when_omitted() {
        let score = parse(serde_json::json!({"score": 7, "total": 10})).unwrap();
        assert_eq!(score.percentage, 70.0);
        assert_eq!(score.step, None);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(compute_percentage(1, 3), 33.33);
        assert_eq!(compute_percentage(2, 3), 66.67);
        assert_eq!(compute_percentage(0, 0), 0.0);
        assert_eq!(compute_percentage(5, 5), 100.0);
    }

    #[test]
    fn test_score_cannot_exceed_total() {
        assert!(matches!(
            parse(serde_json::json!({"score": 11, "total": 10})),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse(serde_json::json!({"score": -1, "total": 10})).is_err());
    }

    #[test]
    fn test_step_label_accepts_number_or_text() {
        let s = parse(serde_json::json!({"score": 1, "total": 2, "step": 3})).unwrap();
        assert_eq!(s.step.as_deref(), Some("3"));
        let s = parse(serde_json::json!({"score": 1, "total": 2, "step": "mixed", "duration": 95})).unwrap();
        assert_eq!(s.step.as_deref(), Some("mixed"));
        assert_eq!(s.duration, Some(95));
    }
}
