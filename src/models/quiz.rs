// src/models/quiz.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::question::{Question, QuestionView};

/// Kind of questions the quiz is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "SINGLE_CHOICE",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::TrueFalse => "TRUE_FALSE",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SINGLE_CHOICE" => Ok(QuestionType::SingleChoice),
            "MULTIPLE_CHOICE" => Ok(QuestionType::MultipleChoice),
            "TRUE_FALSE" => Ok(QuestionType::TrueFalse),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quiz attached to a course, with its questions in `order_index` order.
#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub course_id: String,
    pub chapter_id: Option<String>,
    pub lecture_id: Option<String>,
    pub title: String,
    pub topic: String,

    /// Number of questions requested from the generator.
    /// Independent of how many questions are currently attached.
    pub question_count: i32,

    pub question_type: QuestionType,
    pub difficulty: Difficulty,

    /// User id of the instructor or admin that created the quiz.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Shapes the quiz for a caller, stripping answer keys when `reveal_answers` is false.
    pub fn into_view(self, reveal_answers: bool) -> QuizView {
        QuizView {
            id: self.id,
            course_id: self.course_id,
            chapter_id: self.chapter_id,
            lecture_id: self.lecture_id,
            title: self.title,
            topic: self.topic,
            question_count: self.question_count,
            question_type: self.question_type,
            difficulty: self.difficulty,
            created_by: self.created_by,
            created_at: self.created_at,
            questions: self
                .questions
                .into_iter()
                .map(|q| q.into_view(reveal_answers))
                .collect(),
        }
    }
}

/// Quiz as sent over the wire.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: i64,
    pub course_id: String,
    pub chapter_id: Option<String>,
    pub lecture_id: Option<String>,
    pub title: String,
    pub topic: String,
    pub question_count: i32,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionView>,
}

/// DTO for creating a new quiz.
/// Missing required fields are rejected during deserialization.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 64, message = "course_id must not be empty"))]
    pub course_id: String,
    #[validate(length(min = 1, max = 64))]
    pub chapter_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub lecture_id: Option<String>,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Topic length must be between 1 and 200 characters."
    ))]
    pub topic: String,
    #[validate(range(min = 1, max = 100, message = "question_count must be between 1 and 100"))]
    pub question_count: i32,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
}

/// Validated input handed to the store.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub course_id: String,
    pub chapter_id: Option<String>,
    pub lecture_id: Option<String>,
    pub title: String,
    pub topic: String,
    pub question_count: i32,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_every_mandatory_field() {
        let missing_topic = serde_json::json!({
            "course_id": "course-1",
            "title": "Ownership",
            "question_count": 5,
            "question_type": "SINGLE_CHOICE",
            "difficulty": "EASY"
        });
        let err = serde_json::from_value::<CreateQuizRequest>(missing_topic).unwrap_err();
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn create_request_rejects_out_of_range_count() {
        let req: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "course_id": "course-1",
            "title": "Ownership",
            "topic": "Borrowing",
            "question_count": 0,
            "question_type": "MULTIPLE_CHOICE",
            "difficulty": "HARD"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn enum_wire_names_match_storage_names() {
        assert_eq!(
            serde_json::to_value(QuestionType::TrueFalse).unwrap(),
            serde_json::json!(QuestionType::TrueFalse.as_str())
        );
        assert_eq!("MEDIUM".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("medium".parse::<Difficulty>().is_err());
    }
}
