// src/services/status.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;

use crate::models::exam::Exam;

/// Lifecycle phase of an exam for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Upcoming,
    Active,
    Inactive,
    Completed,
    /// Learner view only: the window elapsed without an attempt.
    Missed,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// One side of the scheduling window, interpreted as loosely as the stored text allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Nothing stored: unconstrained on this side.
    Open,
    At(NaiveDateTime),
    /// Only the date could be read; compared at day granularity.
    Day(NaiveDate),
    Malformed,
}

impl Bound {
    fn parse(date: Option<&str>, time: Option<&str>) -> Self {
        let Some(date) = non_blank(date) else {
            return Bound::Open;
        };
        if let Some(at) = parse_with(date, DATETIME_FORMATS, NaiveDateTime::parse_from_str) {
            return Bound::At(at);
        }

        // "2025-03-01 garbage" still yields a usable day.
        let day = parse_with(date, DATE_FORMATS, NaiveDate::parse_from_str).or_else(|| {
            date.get(..10)
                .and_then(|prefix| parse_with(prefix, DATE_FORMATS, NaiveDate::parse_from_str))
        });
        let Some(day) = day else {
            return Bound::Malformed;
        };

        match non_blank(time).and_then(|t| parse_with(t, TIME_FORMATS, NaiveTime::parse_from_str))
        {
            Some(time) => Bound::At(day.and_time(time)),
            None => Bound::Day(day),
        }
    }

    /// `Some(true)` when `now` is strictly before this bound.
    fn still_ahead(&self, now: NaiveDateTime) -> Option<bool> {
        match self {
            Bound::Open => Some(false),
            Bound::At(at) => Some(now < *at),
            Bound::Day(day) => Some(now.date() < *day),
            Bound::Malformed => None,
        }
    }

    /// `Some(true)` when `now` is strictly past this bound. A day bound lasts until end of day.
    fn already_passed(&self, now: NaiveDateTime) -> Option<bool> {
        match self {
            Bound::Open => Some(false),
            Bound::At(at) => Some(now > *at),
            Bound::Day(day) => Some(now.date() > *day),
            Bound::Malformed => None,
        }
    }

    /// Last instant covered by an end bound.
    fn deadline(&self) -> Option<NaiveDateTime> {
        match self {
            Bound::At(at) => Some(*at),
            Bound::Day(day) => day
                .succ_opt()
                .and_then(|next| next.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight - TimeDelta::seconds(1)),
            Bound::Open | Bound::Malformed => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_with<T>(
    raw: &str,
    formats: &[&str],
    parse: fn(&str, &str) -> chrono::ParseResult<T>,
) -> Option<T> {
    formats.iter().find_map(|format| parse(raw, format).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Before,
    Within,
    After,
}

fn window_position(exam: &Exam, now: NaiveDateTime) -> Option<Position> {
    let start = Bound::parse(exam.start_date.as_deref(), exam.start_time.as_deref());
    let end = Bound::parse(exam.end_date.as_deref(), exam.end_time.as_deref());

    // An unreadable side constrains nothing as long as the other side is readable.
    let before = start.still_ahead(now);
    let after = end.already_passed(now);
    match (before, after) {
        (None, None) => None,
        (Some(true), _) => Some(Position::Before),
        (_, Some(true)) => Some(Position::After),
        _ => Some(Position::Within),
    }
}

fn availability(exam: &Exam) -> ExamStatus {
    if exam.is_active {
        ExamStatus::Active
    } else {
        ExamStatus::Inactive
    }
}

/// Classifies `exam` for a viewer at wall-clock time `now`.
///
/// For learners a submission is final and wins over the window. Window values
/// that cannot be read at all fall back to the exam's active flag, so this
/// always produces a status.
pub fn classify(
    exam: &Exam,
    now: NaiveDateTime,
    has_submitted: bool,
    viewer_is_instructor: bool,
) -> ExamStatus {
    if !viewer_is_instructor && has_submitted {
        return ExamStatus::Completed;
    }

    match window_position(exam, now) {
        Some(Position::Before) => ExamStatus::Upcoming,
        Some(Position::After) if viewer_is_instructor => ExamStatus::Completed,
        Some(Position::After) => ExamStatus::Missed,
        Some(Position::Within) | None => availability(exam),
    }
}

/// Time left until the end of the window, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub display: String,
    pub is_urgent: bool,
    pub is_expired: bool,
}

pub fn countdown(exam: &Exam, now: NaiveDateTime) -> Countdown {
    let end = Bound::parse(exam.end_date.as_deref(), exam.end_time.as_deref());
    let Some(deadline) = end.deadline() else {
        return Countdown {
            display: "No deadline".to_string(),
            is_urgent: false,
            is_expired: false,
        };
    };

    let remaining = deadline - now;
    if remaining < TimeDelta::zero() {
        return Countdown {
            display: "Expired".to_string(),
            is_urgent: false,
            is_expired: true,
        };
    }

    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    let display = if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    };

    Countdown {
        display,
        is_urgent: remaining < TimeDelta::hours(1),
        is_expired: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub enabled: bool,
}

impl Action {
    fn when(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// UI actions offered for an exam, keyed to its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionSet {
    pub view: Action,
    pub start: Action,
    pub publish: Action,
    pub results: Action,
}

pub fn actions_for(
    status: ExamStatus,
    exam_is_active: bool,
    viewer_is_instructor: bool,
) -> ActionSet {
    if viewer_is_instructor {
        ActionSet {
            view: Action::when(true),
            start: Action::when(false),
            publish: Action::when(!exam_is_active && status != ExamStatus::Completed),
            results: Action::when(status != ExamStatus::Upcoming),
        }
    } else {
        ActionSet {
            view: Action::when(true),
            start: Action::when(status == ExamStatus::Active),
            publish: Action::when(false),
            results: Action::when(status == ExamStatus::Completed),
        }
    }
}
