// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions, types::Json};

use super::QuestionStore;
use crate::{
    error::AppError,
    models::{
        question::{Collection, NewQuestion, Question, QuestionRow, QuestionStats, Step},
        score::{NewScore, Score},
    },
};

const QUESTION_COLUMNS: &str =
    "id, number, question, options, correct, explanation, subject, difficulty, created_at, updated_at";

const SCORE_COLUMNS: &str = "id, score, total, percentage, duration, step, created_at";

const CONNECT_RETRIES: u32 = 5;

/// Postgres-backed store. Each step and the AI pool have their own table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a few retries, for databases that start alongside the app.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > CONNECT_RETRIES {
                        return Err(e);
                    }
                    tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied successfully.");
        Ok(())
    }

    async fn fetch_questions(
        &self,
        collection: Collection,
        order_by: &str,
        limit: i64,
    ) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT $1",
            QUESTION_COLUMNS,
            collection.table_name(),
            order_by
        );

        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch {} questions: {:?}", collection.as_str(), e);
                AppError::from(e)
            })?;

        Ok(rows.into_iter().map(|row| row.into_question(collection)).collect())
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn stats(&self) -> Result<QuestionStats, AppError> {
        let (step1, step2, step3, ai) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM step1_questions),
                (SELECT COUNT(*) FROM step2_questions),
                (SELECT COUNT(*) FROM step3_questions),
                (SELECT COUNT(*) FROM ai_questions)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count questions: {:?}", e);
            AppError::from(e)
        })?;

        Ok(QuestionStats::new(step1, step2, step3, ai))
    }

    async fn list_step(&self, step: Step, limit: i64) -> Result<Vec<Question>, AppError> {
        self.fetch_questions(Collection::Step(step), "number ASC, id ASC", limit)
            .await
    }

    async fn list_generated(&self, limit: i64) -> Result<Vec<Question>, AppError> {
        self.fetch_questions(Collection::Generated, "created_at DESC, id DESC", limit)
            .await
    }

    async fn insert_question(
        &self,
        collection: Collection,
        question: NewQuestion,
    ) -> Result<Question, AppError> {
        let table = collection.table_name();
        let number = match collection {
            Collection::Step(_) => format!("(SELECT COALESCE(MAX(number), 0) + 1 FROM {})", table),
            Collection::Generated => "NULL".to_string(),
        };
        let sql = format!(
            r#"
            INSERT INTO {table}
            (number, question, options, correct, explanation, subject, difficulty)
            VALUES ({number}, $1, $2, $3, $4, $5, $6)
            RETURNING {QUESTION_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await?;

        // Step numbers are MAX + 1, so inserts into one step table take turns.
        if let Collection::Step(_) = collection {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(table)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to lock {} for numbering: {:?}", table, e);
                    AppError::from(e)
                })?;
        }

        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(&question.question)
            .bind(Json(&question.options))
            .bind(question.correct)
            .bind(&question.explanation)
            .bind(&question.subject)
            .bind(question.difficulty.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create question in {}: {:?}", table, e);
                AppError::from(e)
            })?;

        tx.commit().await?;

        Ok(row.into_question(collection))
    }

    async fn delete_generated(&self, ids: &[i64]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // Only the AI pool is reachable from here; step tables are import-only.
        let mut query_builder = QueryBuilder::<Postgres>::new("DELETE FROM ai_questions WHERE id IN (");
        let mut separated = query_builder.separated(",");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete generated questions: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected())
    }

    async fn insert_score(&self, score: NewScore) -> Result<Score, AppError> {
        let sql = format!(
            r#"
            INSERT INTO scores (score, total, percentage, duration, step)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SCORE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Score>(&sql)
            .bind(score.score)
            .bind(score.total)
            .bind(score.percentage)
            .bind(score.duration)
            .bind(&score.step)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save score: {:?}", e);
                AppError::from(e)
            })
    }

    async fn recent_scores(&self, limit: i64) -> Result<Vec<Score>, AppError> {
        let sql = format!(
            "SELECT {} FROM scores ORDER BY created_at DESC, id DESC LIMIT $1",
            SCORE_COLUMNS
        );

        sqlx::query_as::<_, Score>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch scores: {:?}", e);
                AppError::from(e)
            })
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed.");
    }
}
