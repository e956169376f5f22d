// src/utils/time.rs

use chrono::{Local, NaiveDateTime};

/// Current wall-clock time without an offset.
///
/// Exam windows are stored as naive local times, so "now" must be read the same way.
pub fn wall_clock_now() -> NaiveDateTime {
    Local::now().naive_local()
}
