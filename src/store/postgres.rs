// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

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

const QUIZ_COLUMNS: &str = "id, course_id, chapter_id, lecture_id, title, topic, question_count, \
     question_type, difficulty, created_by, created_at";

const QUESTION_COLUMNS: &str = "id, quiz_id, content, options, correct_answer, order_index";

const ATTEMPT_COLUMNS: &str =
    "id, quiz_id, student_id, answers, score, status, started_at, completed_at";

/// Row of the 'quizzes' table. Enum columns are stored as TEXT.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    course_id: String,
    chapter_id: Option<String>,
    lecture_id: Option<String>,
    title: String,
    topic: String,
    question_count: i32,
    question_type: String,
    difficulty: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Result<Quiz, AppError> {
        Ok(Quiz {
            id: self.id,
            course_id: self.course_id,
            chapter_id: self.chapter_id,
            lecture_id: self.lecture_id,
            title: self.title,
            topic: self.topic,
            question_count: self.question_count,
            question_type: self
                .question_type
                .parse()
                .map_err(AppError::InternalServerError)?,
            difficulty: self
                .difficulty
                .parse()
                .map_err(AppError::InternalServerError)?,
            created_by: self.created_by,
            created_at: self.created_at,
            questions,
        })
    }
}

/// Row of the 'questions' table. Options live in a JSONB array.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    content: String,
    options: Json<Vec<String>>,
    correct_answer: String,
    order_index: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            quiz_id: row.quiz_id,
            content: row.content,
            options: row.options.0,
            correct_answer: row.correct_answer,
            order_index: row.order_index,
        }
    }
}

/// Row of the 'quiz_attempts' table. Answers live in a JSONB object keyed by question id.
#[derive(FromRow)]
struct AttemptRow {
    id: i64,
    quiz_id: i64,
    student_id: String,
    answers: Json<HashMap<i64, String>>,
    score: Option<i32>,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = AppError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Attempt {
            id: row.id,
            quiz_id: row.quiz_id,
            student_id: row.student_id,
            answers: row.answers.0,
            score: row.score,
            status: row.status.parse().map_err(AppError::InternalServerError)?,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches questions to a batch of quiz rows with a single query.
    async fn hydrate(&self, rows: Vec<QuizRow>) -> Result<Vec<Quiz>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let question_rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE quiz_id = ANY($1) \
             ORDER BY quiz_id, order_index, id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            AppError::from(e)
        })?;

        let mut by_quiz: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in question_rows {
            by_quiz.entry(row.quiz_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let questions = by_quiz.remove(&row.id).unwrap_or_default();
                row.into_quiz(questions)
            })
            .collect()
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            r#"
            INSERT INTO quizzes
            (course_id, chapter_id, lecture_id, title, topic, question_count, question_type, difficulty, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {QUIZ_COLUMNS}
            "#
        ))
        .bind(&quiz.course_id)
        .bind(&quiz.chapter_id)
        .bind(&quiz.lecture_id)
        .bind(&quiz.title)
        .bind(&quiz.topic)
        .bind(quiz.question_count)
        .bind(quiz.question_type.as_str())
        .bind(quiz.difficulty.as_str())
        .bind(&quiz.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::from(e)
        })?;

        row.into_quiz(Vec::new())
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_quizzes_by_course(&self, course_id: &str) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE course_id = $1 ORDER BY id"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        // questions and quiz_attempts cascade
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz {}: {:?}", id, e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        question: NewQuestion,
    ) -> Result<AddQuestion, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes with attempt inserts, which take a share lock.
        let locked =
            sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
                .bind(quiz_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(AddQuestion::QuizNotFound);
        }

        let attempted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM quiz_attempts WHERE quiz_id = $1)",
        )
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;
        if attempted {
            return Ok(AddQuestion::QuizLocked);
        }

        let order_index = match question.order_index {
            Some(index) => index,
            None => {
                sqlx::query_scalar::<_, i32>(
                    "SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE quiz_id = $1",
                )
                .bind(quiz_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            INSERT INTO questions (quiz_id, content, options, correct_answer, order_index)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(quiz_id)
        .bind(&question.content)
        .bind(Json(&question.options))
        .bind(&question.correct_answer)
        .bind(order_index)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question for quiz {}: {:?}", quiz_id, e);
            AppError::from(e)
        })?;

        tx.commit().await?;

        Ok(AddQuestion::Added(row.into()))
    }

    async fn insert_attempt(
        &self,
        attempt: NewAttempt,
    ) -> Result<Option<(Attempt, Grade)>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Share lock conflicts with add_question's FOR UPDATE until commit.
        let quiz =
            sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1 FOR SHARE")
                .bind(attempt.quiz_id)
                .fetch_optional(&mut *tx)
                .await?;
        if quiz.is_none() {
            return Ok(None);
        }

        let questions: Vec<Question> = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE quiz_id = $1 \
             ORDER BY order_index, id"
        ))
        .bind(attempt.quiz_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Question::from)
        .collect();
        let grade = grade_answers(&questions, &attempt.answers);

        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            INSERT INTO quiz_attempts
            (quiz_id, student_id, answers, score, status, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(attempt.quiz_id)
        .bind(&attempt.student_id)
        .bind(Json(&attempt.answers))
        .bind(grade.score)
        .bind(AttemptStatus::Completed.as_str())
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert quiz attempt: {:?}", e);
            AppError::from(e)
        })?;

        tx.commit().await?;

        Ok(Some((Attempt::try_from(row)?, grade)))
    }

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Attempt::try_from)
        .transpose()
    }

    async fn list_attempts(
        &self,
        student_id: &str,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts
            WHERE student_id = $1 AND ($2::BIGINT IS NULL OR quiz_id = $2)
            ORDER BY id
            "#
        ))
        .bind(student_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Attempt::try_from).collect()
    }
}
