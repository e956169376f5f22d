// src/models/course.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Open to anyone with an active enrollment.
    Public,
    /// Restricted to the emails on the course allow-list.
    Private,
}

impl Visibility {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// The owning course of an exam, as far as access control needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub visibility: Visibility,
    pub allowed_emails: Vec<String>,
}

impl Course {
    /// Case-insensitive allow-list lookup. A blank email never matches.
    pub fn allows(&self, email: &str) -> bool {
        let email = email.trim();
        !email.is_empty()
            && self
                .allowed_emails
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
    }
}
