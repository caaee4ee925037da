// src/scoring/evaluator.rs

use std::collections::HashSet;

use crate::models::{
    question::{CorrectAnswer, Question, QuestionKind},
    result::SubmittedAnswer,
};

/// Decides whether `submitted` answers `question` when graded as `kind`.
///
/// Never fails: mismatched shapes, absent answers and unknown types are
/// simply wrong.
pub fn is_correct(kind: QuestionKind, question: &Question, submitted: &SubmittedAnswer) -> bool {
    match kind {
        QuestionKind::MultipleChoice | QuestionKind::TrueFalse => {
            match (&question.correct_answer, submitted) {
                (Some(CorrectAnswer::Index(key)), SubmittedAnswer::Index(given)) => key == given,
                (Some(CorrectAnswer::Text(key)), SubmittedAnswer::Text(given)) => {
                    same_text(key, given)
                }
                _ => false,
            }
        }
        QuestionKind::Identification | QuestionKind::FillInBlank => {
            match (&question.correct_answer, submitted) {
                (Some(CorrectAnswer::Text(key)), SubmittedAnswer::Text(given)) => {
                    same_text(key, given)
                }
                _ => false,
            }
        }
        QuestionKind::Enumeration => {
            let accepted = question.correct_answers.as_deref().unwrap_or_default();
            covers_all(accepted, submitted)
        }
        QuestionKind::Unrecognized => false,
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn same_text(key: &str, given: &str) -> bool {
    normalize(key) == normalize(given)
}

/// Every accepted answer must appear in the submission. Extra submitted
/// items are ignored.
fn covers_all(accepted: &[String], submitted: &SubmittedAnswer) -> bool {
    if accepted.is_empty() {
        return false;
    }
    let provided: HashSet<String> = match submitted {
        SubmittedAnswer::List(items) => items.iter().map(|s| normalize(s)).collect(),
        _ => return false,
    };
    accepted.iter().all(|a| provided.contains(&normalize(a)))
}
