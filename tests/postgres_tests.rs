// tests/postgres_tests.rs
//
// Needs a running Postgres: DATABASE_URL=postgres://... cargo test -- --ignored

use medquiz::{
    models::{
        question::{Collection, Difficulty, NewQuestion, Step},
        score::NewScore,
    },
    store::{PgStore, QuestionStore},
};

async fn connect() -> PgStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");
    store.migrate().await.expect("Failed to migrate database");
    store
}

fn new_question(text: String) -> NewQuestion {
    NewQuestion {
        question: text,
        options: vec![
            "Beta blocker".to_string(),
            "ACE inhibitor".to_string(),
            "Loop diuretic".to_string(),
            "Digoxin".to_string(),
        ],
        correct: 1,
        explanation: "Reduces mortality".to_string(),
        subject: "Cardiology".to_string(),
        difficulty: Difficulty::Hard,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn question_round_trip() {
    let store = connect().await;
    let text = format!("Round trip {}", uuid::Uuid::new_v4());

    let created = store
        .insert_question(Collection::Step(Step::Three), new_question(text.clone()))
        .await
        .unwrap();
    assert!(created.number.is_some());

    let listed = store.list_step(Step::Three, 200).await.unwrap();
    let found = listed.iter().find(|q| q.id == created.id).expect("question not listed");
    assert_eq!(found.question, text);
    assert_eq!(found.options, created.options);
    assert_eq!(found.correct, 1);
    assert_eq!(found.subject, "Cardiology");
    assert_eq!(found.difficulty, Difficulty::Hard);
    assert_eq!(found.source, Collection::Step(Step::Three));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn generated_delete_and_scores() {
    let store = connect().await;

    let ai = store
        .insert_question(
            Collection::Generated,
            new_question(format!("Generated {}", uuid::Uuid::new_v4())),
        )
        .await
        .unwrap();
    assert_eq!(ai.number, None);

    assert_eq!(store.delete_generated(&[ai.id, -1]).await.unwrap(), 1);
    assert_eq!(store.delete_generated(&[ai.id]).await.unwrap(), 0);

    let score = store
        .insert_score(NewScore {
            score: 7,
            total: 10,
            percentage: 70.0,
            duration: Some(120),
            step: Some("mixed".to_string()),
        })
        .await
        .unwrap();
    let recent = store.recent_scores(50).await.unwrap();
    assert!(recent.iter().any(|s| s.id == score.id && s.percentage == 70.0));

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, stats.step_total + stats.ai_generated);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_step_inserts_get_distinct_numbers() {
    let store = connect().await;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_question(
                        Collection::Step(Step::Two),
                        new_question(format!("Concurrent {}", uuid::Uuid::new_v4())),
                    )
                    .await
                    .unwrap()
                    .number
                    .unwrap()
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort_unstable();
    numbers.dedup();
    assert_eq!(numbers.len(), 8);
}
