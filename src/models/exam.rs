// src/models/exam.rs

use serde::{Deserialize, Serialize};

use crate::services::status::{ActionSet, ExamStatus};

/// The three answer formats the scoring engine knows how to grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    FreeText,
}

impl QuestionType {
    /// Parses the type tag stored in the `questions.question_type` column.
    /// Accepts the short legacy tags (`single`, `multiple`, `text`) as well.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single" | "single_choice" | "radio" => Some(Self::SingleChoice),
            "multiple" | "multi" | "multi_choice" | "multiple_choice" | "checkbox" => {
                Some(Self::MultiChoice)
            }
            "text" | "free_text" | "essay" | "short_answer" => Some(Self::FreeText),
            _ => None,
        }
    }
}

/// One selectable answer of a choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub content: String,
    /// Ordinal position inside the owning question.
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub content: String,
    pub question_type: QuestionType,

    /// Options in display order. Correct-option indices point into this list.
    pub options: Vec<QuestionOption>,

    /// Indices of the correct options. Indices outside `options` are ignored.
    pub correct_options: Vec<i32>,

    /// Weight of the question. Unset or non-positive counts as 1.
    pub marks: Option<f64>,
}

impl Question {
    pub fn weight(&self) -> f64 {
        match self.marks {
            Some(marks) if marks > 0.0 => marks,
            _ => 1.0,
        }
    }

    /// Correct options that actually exist, in the order they were stored.
    pub fn correct_options(&self) -> impl Iterator<Item = (usize, &QuestionOption)> + '_ {
        self.correct_options.iter().filter_map(|&index| {
            let index = usize::try_from(index).ok()?;
            self.options.get(index).map(|option| (index, option))
        })
    }
}

/// An exam as stored by the authoring side.
///
/// The scheduling window is kept as the raw wall-clock strings the authoring
/// tool wrote; `services::status` is the only place that interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub course_id: Option<i64>,
    pub title: String,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: i32,

    /// Explicit total. Zero or unset means "derive from the questions".
    pub total_marks: Option<f64>,

    pub is_active: bool,
    pub questions: Vec<Question>,
}

impl Exam {
    /// Total marks used for scoring, display and percentages alike.
    pub fn effective_total_marks(&self) -> f64 {
        match self.total_marks {
            Some(total) if total > 0.0 => total,
            _ => self.questions.iter().map(Question::weight).sum(),
        }
    }
}

/// Option as shown to learners.
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub content: String,
    pub position: i32,
}

/// DTO for sending a question to the client (excludes the answer key).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<PublicOption>,
    pub marks: f64,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            content: question.content.clone(),
            question_type: question.question_type,
            options: question
                .options
                .iter()
                .map(|option| PublicOption {
                    id: option.id,
                    content: option.content.clone(),
                    position: option.position,
                })
                .collect(),
            marks: question.weight(),
        }
    }
}

/// Exam record enriched for listing and detail views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub id: i64,
    pub title: String,
    pub course_id: Option<i64>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: i32,
    pub question_count: usize,
    pub total_marks: f64,
    pub student_count: i64,
    pub status: ExamStatus,
    pub countdown_display: String,
    pub is_urgent: bool,
    pub is_expired: bool,
    pub actions: ActionSet,
}

#[derive(Debug, Serialize)]
pub struct ExamDetail {
    #[serde(flatten)]
    pub summary: ExamSummary,
    pub questions: Vec<PublicQuestion>,
}
