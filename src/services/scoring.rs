// src/services/scoring.rs

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    models::exam::{Exam, Question, QuestionType},
    utils::format::round2,
};

/// Fraction of the total marks needed to pass. Not configurable.
pub const PASS_RATIO: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    /// Sum of awarded marks, rounded to 2 decimals.
    pub raw_score: f64,
    pub total_marks: f64,
    pub passed: bool,
}

/// The learner's answer to `question`, if it is present and not blank.
pub fn answer_for<'a>(
    question: &Question,
    answers: &'a HashMap<String, String>,
) -> Option<&'a str> {
    answers
        .get(&question.id.to_string())
        .map(|answer| answer.trim())
        .filter(|answer| !answer.is_empty())
}

pub fn is_passing(raw_score: f64, total_marks: f64) -> bool {
    total_marks > 0.0 && raw_score / total_marks >= PASS_RATIO
}

/// Grades `answers` (keyed by question id) against the exam's answer key.
pub fn score(exam: &Exam, answers: &HashMap<String, String>) -> ScoreOutcome {
    let awarded: f64 = exam
        .questions
        .iter()
        .filter_map(|question| {
            answer_for(question, answers).map(|answer| question_award(question, answer))
        })
        .sum();

    let raw_score = round2(awarded);
    let total_marks = exam.effective_total_marks();

    ScoreOutcome {
        raw_score,
        total_marks,
        passed: is_passing(raw_score, total_marks),
    }
}

/// Marks awarded for one non-blank answer.
pub fn question_award(question: &Question, answer: &str) -> f64 {
    match question.question_type {
        QuestionType::SingleChoice => single_choice_award(question, answer),
        QuestionType::MultiChoice => multi_choice_award(question, answer),
        // Not evaluated: any non-blank answer gets full marks.
        QuestionType::FreeText => question.weight(),
    }
}

/// Full weight when the answer names the correct option by text, id or index.
fn single_choice_award(question: &Question, answer: &str) -> f64 {
    let Some((index, option)) = question.correct_options().next() else {
        return 0.0;
    };

    let matches = answer == option.content.trim()
        || answer == option.id.to_string()
        || answer == index.to_string();

    if matches { question.weight() } else { 0.0 }
}

/// Net-correct partial credit: each wrong pick cancels a right one, floored at zero.
fn multi_choice_award(question: &Question, answer: &str) -> f64 {
    let correct_set: HashSet<&str> = question
        .correct_options()
        .map(|(_, option)| option.content.trim())
        .collect();
    if correct_set.is_empty() {
        return 0.0;
    }

    let selection = split_selection(answer);
    let submitted: HashSet<&str> = selection.iter().map(String::as_str).collect();

    let correct = submitted.intersection(&correct_set).count();
    let incorrect = submitted.difference(&correct_set).count();
    let partial = correct.saturating_sub(incorrect);

    partial as f64 / correct_set.len() as f64 * question.weight()
}

/// Multi-choice answers arrive either as a JSON array of option texts or comma-separated.
fn split_selection(answer: &str) -> Vec<String> {
    if answer.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(answer) {
            return items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    answer
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
