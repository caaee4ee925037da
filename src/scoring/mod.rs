// src/scoring/mod.rs

//! Grading of quiz attempts. Pure functions, no storage access.

pub mod evaluator;
pub mod scorer;

pub use evaluator::is_correct;
pub use scorer::{Scorecard, percentage, score_quiz};
