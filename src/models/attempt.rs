// src/models/attempt.rs

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an attempt.
/// Submission moves an attempt to `Completed`; nothing moves it back.
/// `InProgress` and `Abandoned` are reserved for save/resume support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "IN_PROGRESS",
            AttemptStatus::Completed => "COMPLETED",
            AttemptStatus::Abandoned => "ABANDONED",
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(AttemptStatus::InProgress),
            "COMPLETED" => Ok(AttemptStatus::Completed),
            "ABANDONED" => Ok(AttemptStatus::Abandoned),
            other => Err(format!("unknown attempt status '{}'", other)),
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's submission against a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: String,

    /// Key: Question ID, Value: submitted answer.
    pub answers: HashMap<i64, String>,

    /// Percentage in 0..=100, `None` until graded.
    pub score: Option<i32>,

    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A submission to grade and persist.
/// The store grades it against the quiz's questions while holding the quiz.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub quiz_id: i64,
    pub student_id: String,
    pub answers: HashMap<i64, String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    /// Key: Question ID (JSON object keys are numeric strings).
    /// Value: the selected option, compared verbatim.
    pub answers: Option<HashMap<i64, String>>,
}

/// Query string of the attempt listing.
#[derive(Debug, Default, Deserialize)]
pub struct AttemptsQuery {
    #[serde(rename = "quizId", alias = "quiz_id")]
    pub quiz_id: Option<i64>,
}
