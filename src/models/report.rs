// src/models/report.rs

use serde::Serialize;

use crate::models::quiz::Difficulty;

/// Per-attempt performance report. Derived on demand, never stored.
#[derive(Debug, Serialize)]
pub struct PerformanceReport {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub student_id: String,
    pub score: i32,
    pub results: Vec<QuestionResult>,
    pub breakdown: ReportBreakdown,
}

/// Outcome of one answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub question_text: String,
    pub submitted_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Totals for the quiz's topic and difficulty tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBreakdown {
    pub topic: String,
    pub difficulty: Difficulty,
    pub total_questions: usize,
    pub answered: usize,
    pub correct: usize,
    pub unanswered: usize,
}
