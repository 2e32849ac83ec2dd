// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::QuestionStore;
use crate::{
    error::AppError,
    models::{
        question::{Collection, NewQuestion, Question, QuestionStats, Step},
        score::{NewScore, Score},
    },
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    questions: HashMap<Collection, Vec<Question>>,
    scores: Vec<Score>,
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn count(&self, collection: Collection) -> i64 {
        self.questions.get(&collection).map_or(0, |q| q.len() as i64)
    }
}

/// In-process store with the same behaviour as [`super::PgStore`].
/// Used by tests and by local runs with `DATABASE_URL=memory`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn take_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn stats(&self) -> Result<QuestionStats, AppError> {
        let inner = self.inner.read().await;
        Ok(QuestionStats::new(
            inner.count(Collection::Step(Step::One)),
            inner.count(Collection::Step(Step::Two)),
            inner.count(Collection::Step(Step::Three)),
            inner.count(Collection::Generated),
        ))
    }

    async fn list_step(&self, step: Step, limit: i64) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        let mut questions = inner
            .questions
            .get(&Collection::Step(step))
            .cloned()
            .unwrap_or_default();
        questions.sort_by_key(|q| (q.number, q.id));
        questions.truncate(take_limit(limit));
        Ok(questions)
    }

    async fn list_generated(&self, limit: i64) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        let mut questions = inner
            .questions
            .get(&Collection::Generated)
            .cloned()
            .unwrap_or_default();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        questions.truncate(take_limit(limit));
        Ok(questions)
    }

    async fn insert_question(
        &self,
        collection: Collection,
        question: NewQuestion,
    ) -> Result<Question, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.allocate_id();
        let bucket = inner.questions.entry(collection).or_default();

        let number = match collection {
            Collection::Step(_) => Some(bucket.iter().filter_map(|q| q.number).max().unwrap_or(0) + 1),
            Collection::Generated => None,
        };

        let now = Utc::now();
        let stored = Question {
            id,
            number,
            question: question.question,
            options: question.options,
            correct: question.correct,
            explanation: question.explanation,
            subject: question.subject,
            difficulty: question.difficulty,
            source: collection,
            created_at: now,
            updated_at: now,
        };
        bucket.push(stored.clone());
        Ok(stored)
    }

    async fn delete_generated(&self, ids: &[i64]) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        let Some(bucket) = inner.questions.get_mut(&Collection::Generated) else {
            return Ok(0);
        };
        let before = bucket.len();
        bucket.retain(|q| !ids.contains(&q.id));
        Ok((before - bucket.len()) as u64)
    }

    async fn insert_score(&self, score: NewScore) -> Result<Score, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.allocate_id();
        let stored = Score {
            id,
            score: score.score,
            total: score.total,
            percentage: score.percentage,
            duration: score.duration,
            step: score.step,
            created_at: Utc::now(),
        };
        inner.scores.push(stored.clone());
        Ok(stored)
    }

    async fn recent_scores(&self, limit: i64) -> Result<Vec<Score>, AppError> {
        let inner = self.inner.read().await;
        let mut scores = inner.scores.clone();
        scores.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        scores.truncate(take_limit(limit));
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;

    fn new_question(text: &str) -> NewQuestion {
        NewQuestion {
            question: text.to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: 2,
            explanation: String::new(),
            subject: "Pharmacology".into(),
            difficulty: Difficulty::Hard,
        }
    }

    #[tokio::test]
    async fn test_step_inserts_are_numbered() {
        let store = MemoryStore::new();
        let first = store
            .insert_question(Collection::Step(Step::Two), new_question("q1"))
            .await
            .unwrap();
        let second = store
            .insert_question(Collection::Step(Step::Two), new_question("q2"))
            .await
            .unwrap();
        assert_eq!(first.number, Some(1));
        assert_eq!(second.number, Some(2));

        let listed = store.list_step(Step::Two, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question, "q1");
        assert!(store.list_step(Step::One, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_step_inserts_get_distinct_numbers() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_question(Collection::Step(Step::One), new_question(&format!("q{}", i)))
                        .await
                        .unwrap()
                        .number
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=10).collect::<Vec<i32>>());
    }

    #[tokio::test]
    async fn test_delete_only_touches_generated() {
        let store = MemoryStore::new();
        let step = store
            .insert_question(Collection::Step(Step::One), new_question("imported"))
            .await
            .unwrap();
        let ai = store
            .insert_question(Collection::Generated, new_question("generated"))
            .await
            .unwrap();

        let deleted = store.delete_generated(&[step.id, ai.id, 9999]).await.unwrap();
        assert_eq!(deleted, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.step1, 1);
        assert_eq!(stats.ai_generated, 0);
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_recent_scores_newest_first() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .insert_score(NewScore {
                    score: i,
                    total: 3,
                    percentage: 0.0,
                    duration: None,
                    step: None,
                })
                .await
                .unwrap();
        }
        let scores = store.recent_scores(2).await.unwrap();
        let values: Vec<i32> = scores.iter().map(|s| s.score).collect();
        assert_eq!(values, vec![2, 1]);
    }
}
