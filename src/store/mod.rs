// src/store/mod.rs

//! Persistence for questions and scores.
//!
//! Handlers only see [`QuestionStore`]; `main` decides whether that is
//! Postgres or the in-process store.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{
    error::AppError,
    models::{
        question::{Collection, NewQuestion, Question, QuestionStats, Step},
        score::{NewScore, Score},
    },
};

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Question counts per collection.
    async fn stats(&self) -> Result<QuestionStats, AppError>;

    /// Up to `limit` questions of one step, ascending by number.
    async fn list_step(&self, step: Step, limit: i64) -> Result<Vec<Question>, AppError>;

    /// Up to `limit` AI-generated questions, newest first.
    async fn list_generated(&self, limit: i64) -> Result<Vec<Question>, AppError>;

    /// Inserts one question. Step inserts are numbered after the current last one.
    async fn insert_question(
        &self,
        collection: Collection,
        question: NewQuestion,
    ) -> Result<Question, AppError>;

    /// Deletes AI-generated questions by id. Returns how many were removed.
    async fn delete_generated(&self, ids: &[i64]) -> Result<u64, AppError>;

    async fn insert_score(&self, score: NewScore) -> Result<Score, AppError>;

    /// Up to `limit` scores, newest first.
    async fn recent_scores(&self, limit: i64) -> Result<Vec<Score>, AppError>;

    /// Releases connections. Called once on shutdown.
    async fn close(&self) {}
}
