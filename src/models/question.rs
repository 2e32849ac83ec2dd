// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::error::AppError;

/// Number of options every AI-generated question must carry.
pub const GENERATED_OPTION_COUNT: usize = 4;

/// Question difficulty. Stored as its name in a TEXT column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[default]
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three exam tiers, each with its own question collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    One,
    Two,
    Three,
}

impl Step {
    pub fn from_number(n: i64) -> Option<Step> {
        match n {
            1 => Some(Step::One),
            2 => Some(Step::Two),
            3 => Some(Step::Three),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
            Step::Three => 3,
        }
    }
}

/// Where a question lives. Step collections hold imported sets,
/// `Generated` holds AI-generated and custom questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Collection {
    Step(Step),
    Generated,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Step(Step::One),
        Collection::Step(Step::Two),
        Collection::Step(Step::Three),
        Collection::Generated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Step(Step::One) => "step1",
            Collection::Step(Step::Two) => "step2",
            Collection::Step(Step::Three) => "step3",
            Collection::Generated => "ai",
        }
    }

    /// Backing table. Only ever one of these fixed names, so it is safe to
    /// splice into SQL text.
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Step(Step::One) => "step1_questions",
            Collection::Step(Step::Two) => "step2_questions",
            Collection::Step(Step::Three) => "step3_questions",
            Collection::Generated => "ai_questions",
        }
    }
}

impl From<Collection> for String {
    fn from(c: Collection) -> Self {
        c.as_str().to_string()
    }
}

impl TryFrom<String> for Collection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| format!("unknown collection '{}'", value))
    }
}

/// A question as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// Position inside a step collection. `None` for AI-generated questions.
    pub number: Option<i32>,

    pub question: String,

    /// Answer options in display order.
    pub options: Vec<String>,

    /// Index into `options` of the correct answer.
    pub correct: i32,

    pub explanation: String,

    pub subject: String,

    pub difficulty: Difficulty,

    pub source: Collection,

    pub created_at: chrono::DateTime<chrono::Utc>,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    pub fn is_correct(&self, selected: usize) -> bool {
        usize::try_from(self.correct).is_ok_and(|c| c == selected)
    }
}

/// Row shape shared by the four question tables.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub number: Option<i32>,
    pub question: String,
    /// Stored as a JSONB array.
    pub options: Json<Vec<String>>,
    pub correct: i32,
    pub explanation: String,
    pub subject: String,
    pub difficulty: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl QuestionRow {
    pub fn into_question(self, source: Collection) -> Question {
        let difficulty = self.difficulty.parse().unwrap_or_else(|e| {
            tracing::warn!("Question {} in {}: {}", self.id, source.as_str(), e);
            Difficulty::default()
        });

        Question {
            id: self.id,
            number: self.number,
            question: self.question,
            options: self.options.0,
            correct: self.correct,
            explanation: self.explanation,
            subject: self.subject,
            difficulty,
            source,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A validated question ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: i32,
    pub explanation: String,
    pub subject: String,
    pub difficulty: Difficulty,
}

/// Question salvaged from AI output. Always has exactly four options and a
/// correct index below four.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: i32,
    pub explanation: String,
    pub subject: String,
}

impl GeneratedQuestion {
    pub fn with_difficulty(self, difficulty: Difficulty) -> NewQuestion {
        NewQuestion {
            question: self.question,
            options: self.options,
            correct: self.correct,
            explanation: self.explanation,
            subject: self.subject,
            difficulty,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct: i64,
    #[validate(length(max = 4000))]
    pub explanation: Option<String>,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Append to a step collection instead of the AI/custom pool.
    #[validate(range(min = 1, max = 3))]
    pub step: Option<i64>,
}

impl CreateQuestionRequest {
    /// Validates the payload and splits it into a target collection and the
    /// record to insert.
    pub fn into_new_question(self) -> Result<(Collection, NewQuestion), AppError> {
        self.validate()?;

        if self.question.trim().is_empty() {
            return Err(AppError::BadRequest("Question text cannot be empty".to_string()));
        }

        if self.correct < 0 || self.correct as usize >= self.options.len() {
            return Err(AppError::BadRequest(format!(
                "correct must be between 0 and {}",
                self.options.len() - 1
            )));
        }

        let collection = match self.step {
            Some(n) => Step::from_number(n)
                .map(Collection::Step)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid step {}", n)))?,
            None => Collection::Generated,
        };

        Ok((
            collection,
            NewQuestion {
                question: self.question.trim().to_string(),
                options: self.options,
                correct: self.correct as i32,
                explanation: self.explanation.unwrap_or_default(),
                subject: self.subject.unwrap_or_default(),
                difficulty: self.difficulty.unwrap_or_default(),
            },
        ))
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("options_need_at_least_two"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub step1: i64,
    pub step2: i64,
    pub step3: i64,
    pub ai_generated: i64,
    pub step_total: i64,
    pub total: i64,
}

impl QuestionStats {
    pub fn new(step1: i64, step2: i64, step3: i64, ai_generated: i64) -> Self {
        let step_total = step1 + step2 + step3;
        Self {
            step1,
            step2,
            step3,
            ai_generated,
            step_total,
            total: step_total + ai_generated,
        }
    }
}
