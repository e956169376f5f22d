// src/repositories/memory.rs

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ExamStore, StoreError};
use crate::models::{course::Course, exam::Exam, exam_result::ExamResult, learner::Learner};

#[derive(Default)]
struct Tables {
    learners: HashMap<i64, Learner>,
    courses: HashMap<i64, Course>,
    enrollments: HashSet<(i64, i64)>,
    exams: BTreeMap<i64, Exam>,
    results: BTreeMap<i64, ExamResult>,
}

/// In-process store with the same conflict semantics as the Postgres schema.
/// Both uniqueness checks run under one write lock.
#[derive(Clone, Default)]
pub struct MemoryExamStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_learner(&self, learner: Learner) {
        self.tables.write().await.learners.insert(learner.id, learner);
    }

    pub async fn add_course(&self, course: Course) {
        self.tables.write().await.courses.insert(course.id, course);
    }

    pub async fn enroll(&self, user_id: i64, course_id: i64) {
        self.tables
            .write()
            .await
            .enrollments
            .insert((user_id, course_id));
    }

    pub async fn add_exam(&self, exam: Exam) {
        self.tables.write().await.exams.insert(exam.id, exam);
    }
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn find_exam(&self, exam_id: i64) -> Result<Option<Exam>, StoreError> {
        Ok(self.tables.read().await.exams.get(&exam_id).cloned())
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError> {
        Ok(self.tables.read().await.exams.values().cloned().collect())
    }

    async fn find_learner(&self, user_id: i64) -> Result<Option<Learner>, StoreError> {
        Ok(self.tables.read().await.learners.get(&user_id).cloned())
    }

    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError> {
        Ok(self.tables.read().await.courses.get(&course_id).cloned())
    }

    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .enrollments
            .contains(&(user_id, course_id)))
    }

    async fn find_result_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .results
            .values()
            .find(|r| r.user_id == user_id && r.exam_id == exam_id)
            .cloned())
    }

    async fn find_result(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError> {
        Ok(self.tables.read().await.results.get(&result_id).cloned())
    }

    async fn count_results(&self, exam_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.results.values().filter(|r| r.exam_id == exam_id).count() as i64)
    }

    async fn insert_result(&self, result: &ExamResult) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if tables
            .results
            .values()
            .any(|r| r.user_id == result.user_id && r.exam_id == result.exam_id)
        {
            return Err(StoreError::DuplicateResult {
                user_id: result.user_id,
                exam_id: result.exam_id,
            });
        }
        if tables.results.contains_key(&result.id) {
            return Err(StoreError::IdentityConflict(result.id));
        }

        tables.results.insert(result.id, result.clone());
        Ok(())
    }
}
