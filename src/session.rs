// src/session.rs

//! Client-side quiz attempt.
//!
//! A session is created in `Loading`, fed the result of a question fetch,
//! then walks `Ready -> Answering <-> Reviewing -> Submitted`. Each question
//! accepts exactly one selection; navigation never unlocks an answer.

use std::fmt;

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        question::{Question, Step},
        score::{NewScore, compute_percentage},
    },
};

/// Which question set the attempt draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    Step(Step),
    Mixed,
}

impl QuizMode {
    /// Label stored with the score.
    pub fn label(&self) -> String {
        match self {
            QuizMode::Step(step) => step.number().to_string(),
            QuizMode::Mixed => "mixed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready,
    /// Current question has no answer yet.
    Answering,
    /// Current question is answered and its feedback is visible.
    Reviewing,
    Submitted,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidState { action: &'static str, state: SessionState },
    AlreadyAnswered(usize),
    OptionOutOfRange { option: usize, options: usize },
    QuestionOutOfRange(usize),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidState { action, state } => {
                write!(f, "cannot {} while {:?}", action, state)
            }
            SessionError::AlreadyAnswered(i) => write!(f, "question {} is already answered", i + 1),
            SessionError::OptionOutOfRange { option, options } => {
                write!(f, "option {} does not exist ({} options)", option, options)
            }
            SessionError::QuestionOutOfRange(i) => write!(f, "question {} does not exist", i + 1),
        }
    }
}

impl std::error::Error for SessionError {}

/// What the user sees right after selecting an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub omitted: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    mode: QuizMode,
    state: SessionState,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    summary: Option<QuizSummary>,
}

impl QuizSession {
    pub fn new(mode: QuizMode) -> Self {
        Self {
            mode,
            state: SessionState::Loading,
            questions: Vec::new(),
            answers: Vec::new(),
            current: 0,
            summary: None,
        }
    }

    /// Consumes the outcome of the question fetch.
    pub fn load(&mut self, fetched: Result<Vec<Question>, AppError>) -> Result<(), SessionError> {
        self.expect_state("load", &[SessionState::Loading])?;

        self.state = match fetched {
            Ok(questions) if questions.is_empty() => {
                SessionState::Error("No questions available".to_string())
            }
            Ok(questions) => {
                self.answers = vec![None; questions.len()];
                self.questions = questions;
                SessionState::Ready
            }
            Err(e) => SessionState::Error(e.to_string()),
        };
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_state("start", &[SessionState::Ready])?;
        self.current = 0;
        self.state = SessionState::Answering;
        Ok(())
    }

    /// Records the answer to the current question. Answers are final.
    pub fn select(&mut self, option: usize) -> Result<Feedback, SessionError> {
        self.expect_in_progress("select")?;

        if self.answers[self.current].is_some() {
            return Err(SessionError::AlreadyAnswered(self.current));
        }

        let question = &self.questions[self.current];
        if option >= question.options.len() {
            return Err(SessionError::OptionOutOfRange { option, options: question.options.len() });
        }

        let feedback = Feedback {
            is_correct: question.is_correct(option),
            correct_index: usize::try_from(question.correct).unwrap_or_default(),
            explanation: question.explanation.clone(),
        };
        self.answers[self.current] = Some(option);
        self.state = SessionState::Reviewing;
        Ok(feedback)
    }

    pub fn jump(&mut self, index: usize) -> Result<(), SessionError> {
        self.expect_in_progress("navigate")?;
        if index >= self.questions.len() {
            return Err(SessionError::QuestionOutOfRange(index));
        }
        self.current = index;
        self.state = if self.answers[index].is_some() {
            SessionState::Reviewing
        } else {
            SessionState::Answering
        };
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), SessionError> {
        self.jump(self.current + 1)
    }

    pub fn previous(&mut self) -> Result<(), SessionError> {
        let index = self
            .current
            .checked_sub(1)
            .ok_or(SessionError::QuestionOutOfRange(0))?;
        self.jump(index)
    }

    /// Scores the attempt and returns the record to persist.
    /// Unanswered questions count as omitted.
    pub fn submit(&mut self, duration_secs: Option<i32>) -> Result<(QuizSummary, NewScore), SessionError> {
        self.expect_in_progress("submit")?;

        let total = self.questions.len();
        let mut correct = 0;
        let mut omitted = 0;
        for (question, answer) in self.questions.iter().zip(&self.answers) {
            match answer {
                Some(selected) if question.is_correct(*selected) => correct += 1,
                Some(_) => {}
                None => omitted += 1,
            }
        }

        let score = i32::try_from(correct).unwrap_or(i32::MAX);
        let total_i32 = i32::try_from(total).unwrap_or(i32::MAX);
        let percentage = compute_percentage(score, total_i32);

        let summary = QuizSummary {
            correct,
            incorrect: total - correct - omitted,
            omitted,
            total,
            percentage,
        };
        let new_score = NewScore {
            score,
            total: total_i32,
            percentage,
            duration: duration_secs,
            step: Some(self.mode.label()),
        };

        tracing::debug!(correct, total, "Quiz submitted");
        self.summary = Some(summary.clone());
        self.state = SessionState::Submitted;
        Ok((summary, new_score))
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn answer(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    fn expect_in_progress(&self, action: &'static str) -> Result<(), SessionError> {
        self.expect_state(action, &[SessionState::Answering, SessionState::Reviewing])
    }

    fn expect_state(&self, action: &'static str, allowed: &[SessionState]) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState { action, state: self.state.clone() })
        }
    }
}

/// JSON body for `POST /api/questions` that stores a finished attempt.
pub fn score_request_body(score: &NewScore) -> serde_json::Value {
    serde_json::json!({
        "type": "score",
        "score": score.score,
        "total": score.total,
        "percentage": score.percentage,
        "duration": score.duration,
        "step": score.step,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::question::{Collection, Difficulty};

    fn question(id: i64, correct: i32) -> Question {
        Question {
            id,
            number: Some(id as i32),
            question: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
            explanation: format!("Because {}", correct),
            subject: "Cardiology".into(),
            difficulty: Difficulty::Medium,
            source: Collection::Step(Step::One),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ready_session(n: i64) -> QuizSession {
        let mut session = QuizSession::new(QuizMode::Step(Step::One));
        session.load(Ok((1..=n).map(|i| question(i, (i % 4) as i32)).collect())).unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_empty_fetch_is_error() {
        let mut session = QuizSession::new(QuizMode::Mixed);
        session.load(Ok(vec![])).unwrap();
        assert!(matches!(session.state(), SessionState::Error(_)));
        assert!(session.start().is_err());
    }

    #[test]
    fn test_failed_fetch_is_error() {
        let mut session = QuizSession::new(QuizMode::Mixed);
        session.load(Err(AppError::ServiceUnavailable("gone".into()))).unwrap();
        assert!(matches!(session.state(), SessionState::Error(msg) if msg.contains("gone")));
    }

    #[test]
    fn test_answer_is_locked() {
        let mut session = ready_session(3);
        assert_eq!(session.state(), &SessionState::Answering);

        let feedback = session.select(1).unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.correct_index, 1);
        assert_eq!(feedback.explanation, "Because 1");
        assert_eq!(session.state(), &SessionState::Reviewing);

        assert_eq!(session.select(2), Err(SessionError::AlreadyAnswered(0)));

        // Navigating away and back keeps the lock.
        session.next().unwrap();
        assert_eq!(session.state(), &SessionState::Answering);
        session.previous().unwrap();
        assert_eq!(session.state(), &SessionState::Reviewing);
        assert!(session.select(0).is_err());
        assert_eq!(session.answer(0), Some(1));
    }

    #[test]
    fn test_navigation_bounds() {
        let mut session = ready_session(2);
        assert_eq!(session.previous(), Err(SessionError::QuestionOutOfRange(0)));
        session.jump(1).unwrap();
        assert_eq!(session.next(), Err(SessionError::QuestionOutOfRange(2)));
        assert_eq!(session.current_index(), 1);
        assert_eq!(
            session.select(7),
            Err(SessionError::OptionOutOfRange { option: 7, options: 4 })
        );
    }

    #[test]
    fn test_submit_counts_omitted() {
        // correct indices: q1 -> 1, q2 -> 2, q3 -> 3, q4 -> 0
        let mut session = ready_session(4);
        session.select(1).unwrap();
        session.jump(1).unwrap();
        session.select(0).unwrap();
        session.jump(3).unwrap();
        session.select(0).unwrap();

        let (summary, score) = session.submit(Some(42)).unwrap();
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.omitted, 1);
        assert_eq!(summary.percentage, 50.0);
        assert_eq!(score.score, 2);
        assert_eq!(score.total, 4);
        assert_eq!(score.duration, Some(42));
        assert_eq!(score.step.as_deref(), Some("1"));

        assert_eq!(session.state(), &SessionState::Submitted);
        assert!(session.select(1).is_err());
        assert!(session.submit(None).is_err());
    }

    #[test]
    fn test_score_request_body() {
        let mut session = ready_session(1);
        let (_, score) = session.submit(None).unwrap();
        let body = score_request_body(&score);
        assert_eq!(body["type"], "score");
        assert_eq!(body["score"], 0);
        assert_eq!(body["total"], 1);
    }
}
