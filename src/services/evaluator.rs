// src/services/evaluator.rs

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt},
        question::Question,
        report::{PerformanceReport, QuestionResult, ReportBreakdown},
    },
    store::SharedStore,
};

/// Result of comparing an answer map against a quiz's questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub correct_count: usize,
    pub answered_count: usize,
    pub total_questions: usize,
    /// Percentage of all questions answered correctly, rounded to the nearest integer.
    pub score: i32,
}

/// Scores `answers` against `questions` by exact, case-sensitive match.
///
/// Only questions present in the answer map can count as correct; answer keys that
/// name questions outside `questions` are ignored. A quiz without questions scores 0.
pub fn grade_answers(questions: &[Question], answers: &HashMap<i64, String>) -> Grade {
    let total_questions = questions.len();
    let mut correct_count = 0;
    let mut answered_count = 0;

    for question in questions {
        if let Some(submitted) = answers.get(&question.id) {
            answered_count += 1;
            if submitted == &question.correct_answer {
                correct_count += 1;
            }
        }
    }

    Grade {
        correct_count,
        answered_count,
        total_questions,
        score: percentage(correct_count, total_questions),
    }
}

fn percentage(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as i32
}

/// Grades and records attempts, and builds reports from recorded attempts.
///
/// Ownership of an attempt is not checked here; handlers do that before asking for a report.
#[derive(Clone)]
pub struct Evaluator {
    store: SharedStore,
}

impl Evaluator {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Grades `answers` and stores a COMPLETED attempt for `student_id`.
    pub async fn submit_attempt(
        &self,
        quiz_id: i64,
        student_id: &str,
        answers: HashMap<i64, String>,
    ) -> Result<Attempt, AppError> {
        if student_id.trim().is_empty() {
            return Err(AppError::AuthError("Missing student identity".to_string()));
        }

        let now = Utc::now();
        let (attempt, grade) = self
            .store
            .insert_attempt(NewAttempt {
                quiz_id,
                student_id: student_id.to_string(),
                answers,
                started_at: now,
                completed_at: now,
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

        let ignored = attempt.answers.len() - grade.answered_count;
        if ignored > 0 {
            tracing::debug!(
                quiz_id,
                ignored,
                "Submission contained answers for questions outside the quiz"
            );
        }

        tracing::info!(
            quiz_id,
            attempt_id = attempt.id,
            score = grade.score,
            "Recorded quiz attempt"
        );

        Ok(attempt)
    }

    /// Attempts of a student grouped by quiz id, oldest first within each quiz.
    pub async fn get_attempts(
        &self,
        student_id: &str,
        quiz_id: Option<i64>,
    ) -> Result<BTreeMap<i64, Vec<Attempt>>, AppError> {
        let attempts = self.store.list_attempts(student_id, quiz_id).await?;

        let mut grouped: BTreeMap<i64, Vec<Attempt>> = BTreeMap::new();
        for attempt in attempts {
            grouped.entry(attempt.quiz_id).or_default().push(attempt);
        }

        Ok(grouped)
    }

    pub async fn find_attempt(&self, attempt_id: i64) -> Result<Attempt, AppError> {
        self.store
            .find_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))
    }

    /// Builds the report for an attempt: one entry per answered question, in quiz order.
    pub async fn generate_performance_report(
        &self,
        attempt_id: i64,
    ) -> Result<PerformanceReport, AppError> {
        let attempt = self.find_attempt(attempt_id).await?;
        self.report_for(attempt).await
    }

    /// Same as `generate_performance_report` for an attempt that is already loaded.
    pub async fn report_for(&self, attempt: Attempt) -> Result<PerformanceReport, AppError> {
        let quiz = self
            .store
            .find_quiz(attempt.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", attempt.quiz_id)))?;

        let grade = grade_answers(&quiz.questions, &attempt.answers);
        if attempt.score.is_some_and(|stored| stored != grade.score) {
            tracing::warn!(
                attempt_id = attempt.id,
                stored = ?attempt.score,
                computed = grade.score,
                "Stored score disagrees with recomputed grade"
            );
        }

        let results = quiz
            .questions
            .iter()
            .filter_map(|question| {
                attempt.answers.get(&question.id).map(|submitted| QuestionResult {
                    question_id: question.id,
                    question_text: question.content.clone(),
                    submitted_answer: submitted.clone(),
                    correct_answer: question.correct_answer.clone(),
                    is_correct: submitted == &question.correct_answer,
                })
            })
            .collect();

        Ok(PerformanceReport {
            attempt_id: attempt.id,
            quiz_id: quiz.id,
            quiz_title: quiz.title,
            student_id: attempt.student_id,
            score: attempt.score.unwrap_or(grade.score),
            results,
            breakdown: ReportBreakdown {
                topic: quiz.topic,
                difficulty: quiz.difficulty,
                total_questions: grade.total_questions,
                answered: grade.answered_count,
                correct: grade.correct_count,
                unanswered: grade.total_questions - grade.answered_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{
            attempt::AttemptStatus,
            question::NewQuestion,
            quiz::{Difficulty, NewQuiz, Quiz, QuestionType},
        },
        store::{AddQuestion, MemoryQuizStore, QuizStore},
    };

    fn question(id: i64, correct: &str) -> Question {
        Question {
            id,
            quiz_id: 1,
            content: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct.to_string(),
            order_index: id as i32,
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, a)| (*id, a.to_string())).collect()
    }

    fn abcd() -> Vec<Question> {
        vec![
            question(1, "A"),
            question(2, "B"),
            question(3, "C"),
            question(4, "D"),
        ]
    }

    #[test]
    fn three_of_four_scores_75() {
        let grade = grade_answers(
            &abcd(),
            &answers(&[(1, "A"), (2, "B"), (3, "X"), (4, "D")]),
        );
        assert_eq!(grade.correct_count, 3);
        assert_eq!(grade.score, 75);
    }

    #[test]
    fn all_correct_scores_100_and_none_scores_0() {
        let perfect = grade_answers(
            &abcd(),
            &answers(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]),
        );
        assert_eq!(perfect.score, 100);

        let wrong = grade_answers(
            &abcd(),
            &answers(&[(1, "D"), (2, "C"), (3, "B"), (4, "A")]),
        );
        assert_eq!(wrong.score, 0);
    }

    #[test]
    fn unanswered_questions_still_count_in_total() {
        let grade = grade_answers(&abcd(), &answers(&[(1, "A")]));
        assert_eq!(grade.answered_count, 1);
        assert_eq!(grade.total_questions, 4);
        assert_eq!(grade.score, 25);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let grade = grade_answers(&abcd(), &answers(&[(1, "a")]));
        assert_eq!(grade.correct_count, 0);
    }

    #[test]
    fn foreign_question_ids_are_ignored() {
        let grade = grade_answers(&abcd(), &answers(&[(1, "A"), (99, "A")]));
        assert_eq!(grade.answered_count, 1);
        assert_eq!(grade.correct_count, 1);
    }

    #[test]
    fn score_rounds_to_nearest_integer() {
        let questions = vec![question(1, "A"), question(2, "A"), question(3, "A")];
        // 2/3 = 66.67
        let grade = grade_answers(&questions, &answers(&[(1, "A"), (2, "A")]));
        assert_eq!(grade.score, 67);
        // 1/3 = 33.33
        let grade = grade_answers(&questions, &answers(&[(1, "A")]));
        assert_eq!(grade.score, 33);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let grade = grade_answers(&[], &answers(&[(1, "A")]));
        assert_eq!(grade.score, 0);
        assert_eq!(grade.total_questions, 0);
    }

    async fn seeded() -> (Evaluator, Arc<MemoryQuizStore>, i64, Vec<i64>) {
        let store = Arc::new(MemoryQuizStore::new());
        let quiz = store
            .create_quiz(NewQuiz {
                course_id: "course-1".to_string(),
                chapter_id: Some("chapter-1".to_string()),
                lecture_id: None,
                title: "Letters".to_string(),
                topic: "Alphabet".to_string(),
                question_count: 4,
                question_type: QuestionType::SingleChoice,
                difficulty: Difficulty::Easy,
                created_by: "instructor-1".to_string(),
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for correct in ["A", "B", "C", "D"] {
            let outcome = store
                .add_question(
                    quiz.id,
                    NewQuestion {
                        content: format!("Pick {}", correct),
                        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                        correct_answer: correct.to_string(),
                        order_index: None,
                    },
                )
                .await
                .unwrap();
            match outcome {
                AddQuestion::Added(q) => ids.push(q.id),
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        let shared: SharedStore = store.clone();
        (Evaluator::new(shared), store, quiz.id, ids)
    }

    #[tokio::test]
    async fn submit_records_completed_attempt() {
        let (evaluator, _, quiz_id, ids) = seeded().await;
        let submitted = answers(&[(ids[0], "A"), (ids[1], "B"), (ids[2], "X"), (ids[3], "D")]);

        let attempt = evaluator
            .submit_attempt(quiz_id, "student-1", submitted)
            .await
            .unwrap();

        assert_eq!(attempt.score, Some(75));
        assert_eq!(attempt.status, AttemptStatus::Completed);
        assert!(attempt.completed_at.is_some());
    }

    #[tokio::test]
    async fn submit_to_unknown_quiz_creates_nothing() {
        let (evaluator, store, _, _) = seeded().await;

        let err = evaluator
            .submit_attempt(404, "student-1", answers(&[(1, "A")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_attempts("student-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_without_student_is_unauthorized() {
        let (evaluator, _, quiz_id, _) = seeded().await;
        let err = evaluator
            .submit_attempt(quiz_id, "  ", HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn attempts_are_grouped_by_quiz() {
        let (evaluator, _, quiz_id, ids) = seeded().await;
        assert!(evaluator.get_attempts("student-1", None).await.unwrap().is_empty());

        evaluator
            .submit_attempt(quiz_id, "student-1", answers(&[(ids[0], "A")]))
            .await
            .unwrap();
        evaluator
            .submit_attempt(quiz_id, "student-1", answers(&[(ids[0], "B")]))
            .await
            .unwrap();
        evaluator
            .submit_attempt(quiz_id, "student-2", HashMap::new())
            .await
            .unwrap();

        let grouped = evaluator.get_attempts("student-1", None).await.unwrap();
        assert_eq!(grouped.len(), 1);
        let scores: Vec<_> = grouped[&quiz_id].iter().map(|a| a.score).collect();
        assert_eq!(scores, [Some(25), Some(0)]);

        let filtered = evaluator
            .get_attempts("student-1", Some(quiz_id + 1))
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn report_lists_answered_questions_in_quiz_order() {
        let (evaluator, _, quiz_id, ids) = seeded().await;
        let attempt = evaluator
            .submit_attempt(quiz_id, "student-1", answers(&[(ids[2], "C"), (ids[0], "B")]))
            .await
            .unwrap();

        let report = evaluator
            .generate_performance_report(attempt.id)
            .await
            .unwrap();

        assert_eq!(report.score, 25);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].question_id, ids[0]);
        assert!(!report.results[0].is_correct);
        assert_eq!(report.results[0].correct_answer, "A");
        assert!(report.results[1].is_correct);
        assert_eq!(report.breakdown.answered, 2);
        assert_eq!(report.breakdown.unanswered, 2);
        assert_eq!(report.breakdown.topic, "Alphabet");
        assert_eq!(report.breakdown.difficulty, Difficulty::Easy);
    }

    #[tokio::test]
    async fn report_for_unknown_attempt_is_not_found() {
        let (evaluator, _, _, _) = seeded().await;
        let err = evaluator.generate_performance_report(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// Adds one question to the quiz the first time anyone reads it, the way an
    /// instructor editing the quiz during a submission would.
    struct AuthorsDuringRead {
        inner: Arc<MemoryQuizStore>,
        added: AtomicBool,
    }

    #[async_trait]
    impl QuizStore for AuthorsDuringRead {
        async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
            self.inner.create_quiz(quiz).await
        }

        async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
            let quiz = self.inner.find_quiz(id).await?;
            if !self.added.swap(true, Ordering::SeqCst) {
                self.inner
                    .add_question(
                        id,
                        NewQuestion {
                            content: "Added late".to_string(),
                            options: vec!["A".into(), "B".into()],
                            correct_answer: "B".to_string(),
                            order_index: None,
                        },
                    )
                    .await?;
            }
            Ok(quiz)
        }

        async fn list_quizzes_by_course(&self, course_id: &str) -> Result<Vec<Quiz>, AppError> {
            self.inner.list_quizzes_by_course(course_id).await
        }

        async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
            self.inner.list_quizzes().await
        }

        async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
            self.inner.delete_quiz(id).await
        }

        async fn add_question(
            &self,
            quiz_id: i64,
            question: NewQuestion,
        ) -> Result<AddQuestion, AppError> {
            self.inner.add_question(quiz_id, question).await
        }

        async fn insert_attempt(
            &self,
            attempt: NewAttempt,
        ) -> Result<Option<(Attempt, Grade)>, AppError> {
            // the late question lands before the submission is recorded
            self.find_quiz(attempt.quiz_id).await?;
            self.inner.insert_attempt(attempt).await
        }

        async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
            self.inner.find_attempt(id).await
        }

        async fn list_attempts(
            &self,
            student_id: &str,
            quiz_id: Option<i64>,
        ) -> Result<Vec<Attempt>, AppError> {
            self.inner.list_attempts(student_id, quiz_id).await
        }
    }

    #[tokio::test]
    async fn score_reflects_question_added_just_before_recording() {
        let inner = Arc::new(MemoryQuizStore::new());
        let quiz = inner
            .create_quiz(NewQuiz {
                course_id: "course-1".to_string(),
                chapter_id: None,
                lecture_id: None,
                title: "Race".to_string(),
                topic: "Locking".to_string(),
                question_count: 2,
                question_type: QuestionType::SingleChoice,
                difficulty: Difficulty::Medium,
                created_by: "instructor-1".to_string(),
            })
            .await
            .unwrap();
        let first = match inner
            .add_question(
                quiz.id,
                NewQuestion {
                    content: "Original".to_string(),
                    options: vec!["A".into(), "B".into()],
                    correct_answer: "A".to_string(),
                    order_index: None,
                },
            )
            .await
            .unwrap()
        {
            AddQuestion::Added(q) => q.id,
            other => panic!("unexpected outcome {:?}", other),
        };

        let store: SharedStore = Arc::new(AuthorsDuringRead {
            inner: inner.clone(),
            added: AtomicBool::new(false),
        });
        let evaluator = Evaluator::new(store);

        let attempt = evaluator
            .submit_attempt(quiz.id, "student-1", answers(&[(first, "A")]))
            .await
            .unwrap();

        let final_quiz = inner.find_quiz(quiz.id).await.unwrap().unwrap();
        assert_eq!(final_quiz.questions.len(), 2);
        assert_eq!(attempt.score, Some(50));

        let report = evaluator
            .generate_performance_report(attempt.id)
            .await
            .unwrap();
        assert_eq!(report.score, 50);
        assert_eq!(report.breakdown.total_questions, 2);
        assert_eq!(report.breakdown.correct, 1);
    }
}
