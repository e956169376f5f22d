// src/services/notifier.rs

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{exam::Exam, exam_result::ExamResult, learner::Learner};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Tells a learner their exam was graded. Called after the result is stored;
/// a failure here never affects the stored result.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_result(
        &self,
        learner: &Learner,
        exam: &Exam,
        result: &ExamResult,
        answers: &HashMap<String, String>,
    ) -> Result<(), NotifyError>;
}

/// Records the notification in the log. Email delivery itself is handled
/// outside this service.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_result(
        &self,
        learner: &Learner,
        exam: &Exam,
        result: &ExamResult,
        answers: &HashMap<String, String>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            email = %learner.email,
            exam_id = exam.id,
            result_id = result.id,
            score = result.score,
            passed = result.passed,
            answered = answers.len(),
            "Result notification queued"
        );
        Ok(())
    }
}
