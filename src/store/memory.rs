// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptStatus, NewAttempt},
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz},
    },
    services::evaluator::{Grade, grade_answers},
    store::{AddQuestion, QuizStore},
};

/// Process-local store. Ids are sequential per table, starting at 1.
#[derive(Default)]
pub struct MemoryQuizStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    quizzes: BTreeMap<i64, Quiz>,
    attempts: BTreeMap<i64, Attempt>,
    next_quiz_id: i64,
    next_question_id: i64,
    next_attempt_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        let mut tables = self.inner.write().await;
        let id = next_id(&mut tables.next_quiz_id);

        let quiz = Quiz {
            id,
            course_id: quiz.course_id,
            chapter_id: quiz.chapter_id,
            lecture_id: quiz.lecture_id,
            title: quiz.title,
            topic: quiz.topic,
            question_count: quiz.question_count,
            question_type: quiz.question_type,
            difficulty: quiz.difficulty,
            created_by: quiz.created_by,
            created_at: Utc::now(),
            questions: Vec::new(),
        };
        tables.quizzes.insert(id, quiz.clone());

        Ok(quiz)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.inner.read().await.quizzes.get(&id).cloned())
    }

    async fn list_quizzes_by_course(&self, course_id: &str) -> Result<Vec<Quiz>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .quizzes
            .values()
            .filter(|q| q.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        Ok(self.inner.read().await.quizzes.values().cloned().collect())
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.inner.write().await;
        if tables.quizzes.remove(&id).is_none() {
            return Ok(false);
        }
        tables.attempts.retain(|_, a| a.quiz_id != id);
        Ok(true)
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        question: NewQuestion,
    ) -> Result<AddQuestion, AppError> {
        let mut tables = self.inner.write().await;

        if !tables.quizzes.contains_key(&quiz_id) {
            return Ok(AddQuestion::QuizNotFound);
        }
        if tables.attempts.values().any(|a| a.quiz_id == quiz_id) {
            return Ok(AddQuestion::QuizLocked);
        }

        let id = next_id(&mut tables.next_question_id);
        let Some(quiz) = tables.quizzes.get_mut(&quiz_id) else {
            return Ok(AddQuestion::QuizNotFound);
        };

        let order_index = question.order_index.unwrap_or_else(|| {
            quiz.questions
                .iter()
                .map(|q| q.order_index + 1)
                .max()
                .unwrap_or(0)
        });

        let question = Question {
            id,
            quiz_id,
            content: question.content,
            options: question.options,
            correct_answer: question.correct_answer,
            order_index,
        };
        quiz.questions.push(question.clone());
        quiz.questions.sort_by_key(|q| (q.order_index, q.id));

        Ok(AddQuestion::Added(question))
    }

    async fn insert_attempt(
        &self,
        attempt: NewAttempt,
    ) -> Result<Option<(Attempt, Grade)>, AppError> {
        let mut tables = self.inner.write().await;

        // graded under the write guard, so add_question cannot interleave
        let Some(quiz) = tables.quizzes.get(&attempt.quiz_id) else {
            return Ok(None);
        };
        let grade = grade_answers(&quiz.questions, &attempt.answers);

        let id = next_id(&mut tables.next_attempt_id);
        let attempt = Attempt {
            id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            answers: attempt.answers,
            score: Some(grade.score),
            status: AttemptStatus::Completed,
            started_at: attempt.started_at,
            completed_at: Some(attempt.completed_at),
        };
        tables.attempts.insert(id, attempt.clone());

        Ok(Some((attempt, grade)))
    }

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        Ok(self.inner.read().await.attempts.get(&id).cloned())
    }

    async fn list_attempts(
        &self,
        student_id: &str,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .attempts
            .values()
            .filter(|a| a.student_id == student_id)
            .filter(|a| quiz_id.is_none_or(|id| a.quiz_id == id))
            .cloned()
            .collect())
    }
}
