// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A question owned by exactly one quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The text content of the question.
    pub content: String,

    /// Options in display order (e.g., ["A", "B", "C", "D"]).
    pub options: Vec<String>,

    /// Compared verbatim against submitted answers.
    pub correct_answer: String,

    pub order_index: i32,
}

impl Question {
    pub fn into_view(self, reveal_answer: bool) -> QuestionView {
        QuestionView {
            id: self.id,
            content: self.content,
            options: self.options,
            order_index: self.order_index,
            correct_answer: reveal_answer.then_some(self.correct_answer),
        }
    }
}

/// DTO for sending a question to a client. `correct_answer` is omitted for students.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub content: String,
    pub options: Vec<String>,
    pub order_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// DTO for adding a question to a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    /// Appended after the last question when omitted.
    #[validate(range(min = 0))]
    pub order_index: Option<i32>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length_invalid"));
        }
    }
    Ok(())
}

/// Validated input handed to the store.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub order_index: Option<i32>,
}
