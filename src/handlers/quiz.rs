// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, NewQuestion},
        quiz::{CreateQuizRequest, NewQuiz, QuizView},
    },
    store::{AddQuestion, SharedStore},
    utils::{html::clean_html, jwt::Session},
};

/// Creates a quiz with no questions.
/// Instructor or admin only.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require_author()?;

    let Json(payload) = payload?;
    payload.validate()?;

    let quiz = store
        .create_quiz(NewQuiz {
            course_id: payload.course_id,
            chapter_id: payload.chapter_id,
            lecture_id: payload.lecture_id,
            title: clean_html(&payload.title),
            topic: clean_html(&payload.topic),
            question_count: payload.question_count,
            question_type: payload.question_type,
            difficulty: payload.difficulty,
            created_by: session.user_id,
        })
        .await?;

    tracing::info!(quiz_id = quiz.id, course_id = %quiz.course_id, "Quiz created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "quiz": quiz.into_view(true) })),
    ))
}

/// Retrieves a quiz with its ordered questions.
/// Answer keys are stripped for students.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;

    let quiz = store
        .find_quiz(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", id)))?;

    Ok(Json(json!({
        "success": true,
        "quiz": quiz.into_view(session.role.sees_answer_keys()),
    })))
}

/// Lists the quizzes of a course.
pub async fn list_course_quizzes(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
    course_id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(course_id) = course_id?;
    let reveal = session.role.sees_answer_keys();
    let quizzes: Vec<QuizView> = store
        .list_quizzes_by_course(&course_id)
        .await?
        .into_iter()
        .map(|q| q.into_view(reveal))
        .collect();

    Ok(Json(json!({ "success": true, "quizzes": quizzes })))
}

/// Lists every quiz in the system.
/// Admin only.
pub async fn list_all_quizzes(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    if !session.role.can_list_all_quizzes() {
        return Err(AppError::Forbidden(
            "Only administrators can list all quizzes".to_string(),
        ));
    }

    let quizzes: Vec<QuizView> = store
        .list_quizzes()
        .await?
        .into_iter()
        .map(|q| q.into_view(true))
        .collect();

    Ok(Json(json!({ "success": true, "quizzes": quizzes })))
}

/// Appends a question to a quiz that has not been attempted yet.
/// Instructor or admin only.
pub async fn add_question(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require_author()?;

    let Path(quiz_id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;

    let outcome = store
        .add_question(
            quiz_id,
            NewQuestion {
                content: clean_html(&payload.content),
                options: payload.options,
                correct_answer: payload.correct_answer,
                order_index: payload.order_index,
            },
        )
        .await?;

    match outcome {
        AddQuestion::Added(question) => Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "question": question.into_view(true) })),
        )),
        AddQuestion::QuizNotFound => {
            Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)))
        }
        AddQuestion::QuizLocked => Err(AppError::BadRequest(
            "Quiz already has attempts and can no longer be changed".to_string(),
        )),
    }
}

/// Deletes a quiz along with its questions and attempts.
/// Instructor or admin only.
pub async fn delete_quiz(
    State(store): State<SharedStore>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    session.require_author()?;

    let Path(id) = id?;

    if !store.delete_quiz(id).await? {
        return Err(AppError::NotFound(format!("Quiz {} not found", id)));
    }

    tracing::info!(quiz_id = id, deleted_by = %session.user_id, "Quiz deleted");

    Ok(Json(json!({ "success": true })))
}
