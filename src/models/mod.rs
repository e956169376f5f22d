// src/models/mod.rs

pub mod course;
pub mod exam;
pub mod exam_result;
pub mod learner;
