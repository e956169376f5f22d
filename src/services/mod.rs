// src/services/mod.rs

pub mod access;
pub mod notifier;
pub mod scoring;
pub mod status;
pub mod submission;
