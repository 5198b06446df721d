// src/store/mod.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
    },
    services::evaluator::Grade,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryQuizStore;
pub use postgres::PgQuizStore;

pub type SharedStore = Arc<dyn QuizStore>;

/// Outcome of appending a question to a quiz.
#[derive(Debug)]
pub enum AddQuestion {
    Added(Question),
    QuizNotFound,
    /// The quiz already has attempts and can no longer change.
    QuizLocked,
}

/// Persistence for quizzes, their questions, and attempts.
///
/// Lookups return `Ok(None)` for unknown ids; mapping that to a 404 is the caller's job.
/// Quizzes always come back with their questions sorted by `order_index`, then id.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError>;

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;

    async fn list_quizzes_by_course(&self, course_id: &str) -> Result<Vec<Quiz>, AppError>;

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    /// Removes the quiz together with its questions and attempts.
    /// Returns `false` when nothing was deleted.
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;

    async fn add_question(&self, quiz_id: i64, question: NewQuestion)
    -> Result<AddQuestion, AppError>;

    /// Grades the submission against the quiz's current questions and persists it as
    /// COMPLETED. Grading and insertion happen while the quiz is held, so no question can
    /// be added in between. Returns `None` for an unknown quiz.
    async fn insert_attempt(
        &self,
        attempt: NewAttempt,
    ) -> Result<Option<(Attempt, Grade)>, AppError>;

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;

    /// Attempts of a student ordered oldest first, optionally restricted to one quiz.
    async fn list_attempts(
        &self,
        student_id: &str,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError>;
}
