// src/models/learner.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Learner {
    pub id: i64,
    pub username: String,
    pub email: String,

    /// 'student', 'instructor' or 'admin'.
    pub role: String,
}

impl Learner {
    /// Instructors and admins get the instructor view of exam status.
    pub fn is_instructor(&self) -> bool {
        matches!(self.role.as_str(), "instructor" | "admin")
    }
}
