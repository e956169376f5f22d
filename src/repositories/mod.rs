// src/repositories/mod.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{course::Course, exam::Exam, exam_result::ExamResult, learner::Learner};

pub mod memory;
pub mod postgres;

pub use memory::MemoryExamStore;
pub use postgres::PgExamStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The result id is already taken by another row.
    #[error("result id {0} is already taken")]
    IdentityConflict(i64),

    /// A result for the same (user, exam) pair already exists.
    #[error("user {user_id} already has a result for exam {exam_id}")]
    DuplicateResult { user_id: i64, exam_id: i64 },

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Data access used by the exam core.
///
/// `insert_result` must reject a second result for the same (user, exam)
/// pair with `StoreError::DuplicateResult`, atomically with the insert.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn find_exam(&self, exam_id: i64) -> Result<Option<Exam>, StoreError>;

    /// All exams, ordered by id.
    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError>;

    async fn find_learner(&self, user_id: i64) -> Result<Option<Learner>, StoreError>;

    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError>;

    /// Whether the user holds an active enrollment in the course.
    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool, StoreError>;

    async fn find_result_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError>;

    async fn find_result(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError>;

    /// Number of learners with a result for the exam.
    async fn count_results(&self, exam_id: i64) -> Result<i64, StoreError>;

    async fn insert_result(&self, result: &ExamResult) -> Result<(), StoreError>;
}
