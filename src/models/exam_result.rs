// src/models/exam_result.rs

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::services::access::AccessReason;

/// Represents the 'results' table in the database.
/// Written exactly once per (user, exam) and never updated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: i64,
    pub exam_id: i64,
    pub user_id: i64,

    /// Raw score rounded to 2 decimals.
    pub score: f64,
    pub passed: bool,

    /// Seconds reported by the client.
    pub time_taken: i64,
    pub attempted_at: NaiveDateTime,
    pub feedback: String,

    /// JSON snapshot of the submitted answers.
    pub answers: String,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamRequest {
    /// Key: question id, value: the learner's answer.
    pub answers: HashMap<String, String>,

    #[validate(range(min = 0, message = "timeTaken must not be negative."))]
    #[serde(default)]
    pub time_taken: i64,
}

/// Response of the access check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub has_access: bool,
    pub reason: AccessReason,
    pub has_submitted: bool,
}
