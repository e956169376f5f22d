// src/services/submission.rs

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::{exam::Exam, exam_result::ExamResult, learner::Learner},
    repositories::{ExamStore, StoreError},
    services::{notifier::Notifier, scoring},
    utils::{
        format::{format_marks, percentage},
        time::wall_clock_now,
    },
};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("exam {0} not found")]
    ExamNotFound(i64),

    #[error("learner {0} not found")]
    LearnerNotFound(i64),

    #[error("learner {user_id} already submitted exam {exam_id}")]
    DuplicateSubmission { user_id: i64, exam_id: i64 },

    #[error("failed to store result: {0}")]
    PersistenceFailure(#[source] StoreError),
}

/// What the learner gets back after a graded submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub score: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub passed: bool,
    pub total_questions: usize,
    pub answered_questions: usize,
    pub completion_percentage: f64,
    pub feedback: String,
    pub submitted_at: NaiveDateTime,
    pub result_id: i64,
}

/// Response-only statistics; never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionStats {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub completion_percentage: f64,
}

impl CompletionStats {
    pub fn of(exam: &Exam, answers: &HashMap<String, String>) -> Self {
        let total_questions = exam.questions.len();
        let answered_questions = exam
            .questions
            .iter()
            .filter(|question| scoring::answer_for(question, answers).is_some())
            .count();

        Self {
            total_questions,
            answered_questions,
            completion_percentage: percentage(answered_questions as f64, total_questions as f64),
        }
    }
}

/// Tiered feedback text. Every message carries the rounded score and percentage.
pub fn feedback_for(raw_score: f64, total_marks: f64, passed: bool) -> String {
    let pct = percentage(raw_score, total_marks);
    let summary = format!(
        "You scored {}/{} ({}%).",
        format_marks(raw_score),
        format_marks(total_marks),
        format_marks(pct)
    );

    if !passed {
        return format!(
            "{summary} Unfortunately this is below the 60% pass mark. \
             Review the material and try to strengthen the weak areas."
        );
    }

    let opener = if pct >= 90.0 {
        "Excellent work!"
    } else if pct >= 80.0 {
        "Great job!"
    } else if pct >= 70.0 {
        "Good work!"
    } else {
        "You passed. Keep up the effort!"
    };
    format!("{opener} {summary}")
}

/// Minute-resolution clock in the high digits, weighted ids in the low five.
/// Always below 10^12.
fn primary_result_id(now: NaiveDateTime, user_id: i64, exam_id: i64) -> i64 {
    let minutes = now.and_utc().timestamp().div_euclid(60).rem_euclid(10_000_000);
    let salt = user_id
        .wrapping_mul(31)
        .wrapping_add(exam_id.wrapping_mul(17))
        .rem_euclid(100_000);
    minutes * 100_000 + salt
}

/// Millisecond clock with a different weighting, in [10^12, 2 * 10^12) so it
/// can never collide with a primary id.
fn fallback_result_id(now: NaiveDateTime, user_id: i64, exam_id: i64) -> i64 {
    let millis = now.and_utc().timestamp_millis().rem_euclid(1_000_000_000);
    let salt = user_id
        .wrapping_mul(7_919)
        .wrapping_add(exam_id.wrapping_mul(104_729))
        .rem_euclid(1_000);
    1_000_000_000_000 + millis * 1_000 + salt
}

fn persist_error(err: StoreError, result: &ExamResult) -> SubmissionError {
    match err {
        StoreError::DuplicateResult { user_id, exam_id } => {
            tracing::warn!(user_id, exam_id, "Store rejected concurrent duplicate submission");
            SubmissionError::DuplicateSubmission { user_id, exam_id }
        }
        other => {
            tracing::error!(
                error = %other,
                result_id = result.id,
                user_id = result.user_id,
                exam_id = result.exam_id,
                "Failed to persist exam result"
            );
            SubmissionError::PersistenceFailure(other)
        }
    }
}

/// Grades a learner's attempt and records it, at most once per (learner, exam).
#[derive(Clone)]
pub struct SubmissionCoordinator {
    store: Arc<dyn ExamStore>,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionCoordinator {
    pub fn new(store: Arc<dyn ExamStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn submit(
        &self,
        exam_id: i64,
        learner_id: i64,
        answers: HashMap<String, String>,
        time_taken: i64,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submit_at(exam_id, learner_id, answers, time_taken, wall_clock_now())
            .await
    }

    /// Same as [`submit`](Self::submit) with an explicit wall-clock time.
    pub async fn submit_at(
        &self,
        exam_id: i64,
        learner_id: i64,
        answers: HashMap<String, String>,
        time_taken: i64,
        now: NaiveDateTime,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let exam = self
            .store
            .find_exam(exam_id)
            .await
            .map_err(SubmissionError::PersistenceFailure)?
            .ok_or(SubmissionError::ExamNotFound(exam_id))?;
        let learner = self
            .store
            .find_learner(learner_id)
            .await
            .map_err(SubmissionError::PersistenceFailure)?
            .ok_or(SubmissionError::LearnerNotFound(learner_id))?;

        let existing = self
            .store
            .find_result_for(learner.id, exam.id)
            .await
            .map_err(SubmissionError::PersistenceFailure)?;
        if existing.is_some() {
            tracing::warn!(
                user_id = learner.id,
                exam_id = exam.id,
                "Rejected duplicate submission"
            );
            return Err(SubmissionError::DuplicateSubmission {
                user_id: learner.id,
                exam_id: exam.id,
            });
        }

        let outcome = scoring::score(&exam, &answers);
        let feedback = feedback_for(outcome.raw_score, outcome.total_marks, outcome.passed);

        let mut result = ExamResult {
            id: primary_result_id(now, learner.id, exam.id),
            exam_id: exam.id,
            user_id: learner.id,
            score: outcome.raw_score,
            passed: outcome.passed,
            time_taken,
            attempted_at: now,
            feedback,
            answers: serde_json::to_string(&answers).unwrap_or_default(),
        };
        self.persist(&mut result, now).await?;

        tracing::info!(
            result_id = result.id,
            user_id = learner.id,
            exam_id = exam.id,
            score = outcome.raw_score,
            passed = outcome.passed,
            "Exam submission graded"
        );

        let stats = CompletionStats::of(&exam, &answers);
        let receipt = SubmissionReceipt {
            score: outcome.raw_score,
            total_marks: outcome.total_marks,
            percentage: percentage(outcome.raw_score, outcome.total_marks),
            passed: outcome.passed,
            total_questions: stats.total_questions,
            answered_questions: stats.answered_questions,
            completion_percentage: stats.completion_percentage,
            feedback: result.feedback.clone(),
            submitted_at: now,
            result_id: result.id,
        };

        self.dispatch_notification(learner, exam, result, answers);
        Ok(receipt)
    }

    /// Inserts `result`, retrying once with the fallback id if the primary id is taken.
    async fn persist(
        &self,
        result: &mut ExamResult,
        now: NaiveDateTime,
    ) -> Result<(), SubmissionError> {
        match self.store.insert_result(result).await {
            Ok(()) => return Ok(()),
            Err(StoreError::IdentityConflict(taken)) => {
                tracing::warn!(
                    result_id = taken,
                    "Result id already taken; retrying with fallback id"
                );
            }
            Err(err) => return Err(persist_error(err, result)),
        }

        result.id = fallback_result_id(now, result.user_id, result.exam_id);
        let retried = self.store.insert_result(result).await;
        retried.map_err(|err| persist_error(err, result))
    }

    fn dispatch_notification(
        &self,
        learner: Learner,
        exam: Exam,
        result: ExamResult,
        answers: HashMap<String, String>,
    ) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier
                .notify_result(&learner, &exam, &result, &answers)
                .await
            {
                tracing::warn!(error = %err, result_id = result.id, "Result notification failed");
            }
        });
    }
}
