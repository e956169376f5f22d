// src/repositories/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use super::{ExamStore, StoreError};
use crate::models::{
    course::{Course, Visibility},
    exam::{Exam, Question, QuestionOption, QuestionType},
    exam_result::ExamResult,
    learner::Learner,
};

const RESULT_PKEY: &str = "results_pkey";
const RESULT_USER_EXAM_KEY: &str = "results_user_exam_key";

const EXAM_COLUMNS: &str = "id, course_id, title, start_date, start_time, end_date, end_time, \
     duration_minutes, total_marks, is_active";

const RESULT_COLUMNS: &str =
    "id, exam_id, user_id, score, passed, time_taken, attempted_at, feedback, answers";

#[derive(FromRow)]
struct ExamRow {
    id: i64,
    course_id: Option<i64>,
    title: String,
    start_date: Option<String>,
    start_time: Option<String>,
    end_date: Option<String>,
    end_time: Option<String>,
    duration_minutes: i32,
    total_marks: Option<f64>,
    is_active: bool,
}

impl ExamRow {
    fn into_exam(self, questions: Vec<Question>) -> Exam {
        Exam {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            start_date: self.start_date,
            start_time: self.start_time,
            end_date: self.end_date,
            end_time: self.end_time,
            duration_minutes: self.duration_minutes,
            total_marks: self.total_marks,
            is_active: self.is_active,
            questions,
        }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    exam_id: i64,
    content: String,
    question_type: String,
    correct_options: Json<Vec<i32>>,
    marks: Option<f64>,
}

#[derive(FromRow)]
struct OptionRow {
    id: i64,
    question_id: i64,
    position: i32,
    content: String,
}

#[derive(FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    visibility: String,
    allowed_emails: Json<Vec<String>>,
}

/// `ExamStore` backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the questions (with options, in position order) of every exam in `exam_ids`.
    async fn load_questions(
        &self,
        exam_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Question>>, StoreError> {
        let question_rows: Vec<QuestionRow> = sqlx::query_as(
            "SELECT id, exam_id, content, question_type, correct_options, marks
             FROM questions
             WHERE exam_id = ANY($1)
             ORDER BY exam_id, position, id",
        )
        .bind(exam_ids)
        .fetch_all(&self.pool)
        .await?;

        let question_ids: Vec<i64> = question_rows.iter().map(|q| q.id).collect();
        let option_rows: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, question_id, position, content
             FROM question_options
             WHERE question_id = ANY($1)
             ORDER BY question_id, position, id",
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut options: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
        for row in option_rows {
            options.entry(row.question_id).or_default().push(QuestionOption {
                id: row.id,
                content: row.content,
                position: row.position,
            });
        }

        let mut questions: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in question_rows {
            let question_type = QuestionType::parse(&row.question_type).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "question {} has unknown type '{}'",
                    row.id, row.question_type
                ))
            })?;
            questions.entry(row.exam_id).or_default().push(Question {
                id: row.id,
                content: row.content,
                question_type,
                options: options.remove(&row.id).unwrap_or_default(),
                correct_options: row.correct_options.0,
                marks: row.marks,
            });
        }

        Ok(questions)
    }
}

/// Maps unique violations on `results` to the two conflict kinds the submission flow handles.
fn classify_insert_error(err: sqlx::Error, result: &ExamResult) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(RESULT_USER_EXAM_KEY) => {
                    return StoreError::DuplicateResult {
                        user_id: result.user_id,
                        exam_id: result.exam_id,
                    };
                }
                Some(RESULT_PKEY) => return StoreError::IdentityConflict(result.id),
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn find_exam(&self, exam_id: i64) -> Result<Option<Exam>, StoreError> {
        let row: Option<ExamRow> =
            sqlx::query_as(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
                .bind(exam_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut questions = self.load_questions(&[row.id]).await?;
        let exam_questions = questions.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_exam(exam_questions)))
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError> {
        let rows: Vec<ExamRow> =
            sqlx::query_as(&format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        let exam_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut questions = self.load_questions(&exam_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let exam_questions = questions.remove(&row.id).unwrap_or_default();
                row.into_exam(exam_questions)
            })
            .collect())
    }

    async fn find_learner(&self, user_id: i64) -> Result<Option<Learner>, StoreError> {
        let learner = sqlx::query_as::<_, Learner>(
            "SELECT id, username, email, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(learner)
    }

    async fn find_course(&self, course_id: i64) -> Result<Option<Course>, StoreError> {
        let row: Option<CourseRow> = sqlx::query_as(
            "SELECT id, title, visibility, allowed_emails FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let visibility = Visibility::parse(&row.visibility).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "course {} has unknown visibility '{}'",
                    row.id, row.visibility
                ))
            })?;
            Ok(Course {
                id: row.id,
                title: row.title,
                visibility,
                allowed_emails: row.allowed_emails.0,
            })
        })
        .transpose()
    }

    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool, StoreError> {
        let enrolled: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM enrollments
                WHERE user_id = $1 AND course_id = $2 AND status = 'active'
            )",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrolled)
    }

    async fn find_result_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE user_id = $1 AND exam_id = $2"
        ))
        .bind(user_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(result)
    }

    async fn find_result(&self, result_id: i64) -> Result<Option<ExamResult>, StoreError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE id = $1"
        ))
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(result)
    }

    async fn count_results(&self, exam_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_result(&self, result: &ExamResult) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO results
                (id, exam_id, user_id, score, passed, time_taken, attempted_at, feedback, answers)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(result.id)
        .bind(result.exam_id)
        .bind(result.user_id)
        .bind(result.score)
        .bind(result.passed)
        .bind(result.time_taken)
        .bind(result.attempted_at)
        .bind(&result.feedback)
        .bind(&result.answers)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, result))?;
        Ok(())
    }
}
