// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::attempt::{AttemptsQuery, SubmitAttemptRequest},
    services::evaluator::Evaluator,
    utils::jwt::Session,
};

/// Submits the caller's answers for a quiz and returns the graded attempt.
///
/// * The caller identity from the session is the student.
/// * Questions the caller skipped count as wrong.
/// * Every submission is a new attempt; retakes are kept side by side.
pub async fn submit_attempt(
    State(evaluator): State<Evaluator>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SubmitAttemptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(quiz_id) = id?;
    let Json(req) = payload?;

    let answers = req
        .answers
        .ok_or_else(|| AppError::BadRequest("answers is required".to_string()))?;

    let attempt = evaluator
        .submit_attempt(quiz_id, &session.user_id, answers)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "score": attempt.score,
            "attempt": attempt,
        })),
    ))
}

/// Lists the caller's attempts grouped by quiz id.
pub async fn list_attempts(
    State(evaluator): State<Evaluator>,
    Extension(session): Extension<Session>,
    query: Result<Query<AttemptsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;

    let attempts = evaluator
        .get_attempts(&session.user_id, query.quiz_id)
        .await?;

    Ok(Json(json!({ "success": true, "attempts": attempts })))
}

/// Returns the performance report of one attempt.
/// Only the student who made the attempt may read it.
pub async fn get_report(
    State(evaluator): State<Evaluator>,
    Extension(session): Extension<Session>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(attempt_id) = id?;

    let attempt = evaluator.find_attempt(attempt_id).await?;
    if attempt.student_id != session.user_id {
        tracing::warn!(
            attempt_id,
            caller = %session.user_id,
            "Rejected report request for another student's attempt"
        );
        return Err(AppError::Forbidden(
            "You can only view reports for your own attempts".to_string(),
        ));
    }

    let report = evaluator.report_for(attempt).await?;

    Ok(Json(json!({ "success": true, "report": report })))
}
