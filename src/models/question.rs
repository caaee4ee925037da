// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Option labels every true/false question carries.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

/// Number of options a multiple-choice question must have.
pub const CHOICE_OPTION_COUNT: usize = 4;

/// Closed set of question types.
/// Tags that are not part of the set decode to `Unrecognized` so a stray
/// value in storage never breaks reading a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    Identification,
    FillInBlank,
    Enumeration,
    #[serde(other)]
    Unrecognized,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::TrueFalse => "true-false",
            QuestionKind::Identification => "identification",
            QuestionKind::FillInBlank => "fill-in-blank",
            QuestionKind::Enumeration => "enumeration",
            QuestionKind::Unrecognized => "unrecognized",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "multiple-choice" => QuestionKind::MultipleChoice,
            "true-false" => QuestionKind::TrueFalse,
            "identification" => QuestionKind::Identification,
            "fill-in-blank" => QuestionKind::FillInBlank,
            "enumeration" => QuestionKind::Enumeration,
            _ => QuestionKind::Unrecognized,
        }
    }

    /// Resolves the type a question is graded as:
    /// its own tag, else the quiz tag, else multiple-choice.
    pub fn effective(own: Option<QuestionKind>, quiz: Option<QuestionKind>) -> QuestionKind {
        own.or(quiz).unwrap_or(QuestionKind::MultipleChoice)
    }
}

/// Single-valued answer key: an option index or a free-text answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Index(i64),
    Text(String),
}

/// A stored question. `correct_answer` is 0-based on this side of the
/// repository; the SQL store keeps it 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,

    pub question: String,

    #[serde(default)]
    pub options: Vec<String>,

    /// Set for choice, identification and fill-in-blank questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,

    /// Set for enumeration questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<Vec<String>>,
}

/// A validated question that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub kind: Option<QuestionKind>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Option<CorrectAnswer>,
    pub correct_answers: Option<Vec<String>>,
}

impl NewQuestion {
    pub fn into_question(self, id: i64, quiz_id: i64) -> Question {
        Question {
            id,
            quiz_id,
            kind: self.kind,
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            correct_answers: self.correct_answers,
        }
    }
}

/// DTO for a question inside a create request, or on its own when
/// appended to an existing quiz. Every field is optional at the serde
/// level so that missing data is reported with a field hint instead of
/// a generic decode failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub correct_answer: Option<Value>,
    #[serde(default)]
    pub correct_answers: Option<Vec<Option<String>>>,
}

/// Prefixes messages and field names with the question position when the
/// question is part of a larger payload.
struct FieldScope {
    index: Option<usize>,
}

impl FieldScope {
    fn error(&self, message: impl AsRef<str>, field: &str) -> AppError {
        match self.index {
            Some(i) => AppError::validation(
                format!("Question {}: {}", i + 1, message.as_ref()),
                format!("questions[{}].{}", i, field),
            ),
            None => AppError::validation(message.as_ref(), field),
        }
    }
}

impl QuestionInput {
    /// Validates the input against the rules of its effective type and
    /// normalizes it (trimmed text, fixed true/false options).
    ///
    /// `index` is the position inside a create payload, used for messages.
    /// `quiz_kind` is the quiz-level type used when the question has none.
    pub fn into_new_question(
        self,
        index: Option<usize>,
        quiz_kind: Option<QuestionKind>,
    ) -> Result<NewQuestion, AppError> {
        let scope = FieldScope { index };

        let kind = match self.kind.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => match QuestionKind::from_tag(tag) {
                QuestionKind::Unrecognized => {
                    return Err(scope.error(format!("Unsupported question type '{}'", tag), "type"));
                }
                kind => Some(kind),
            },
            None => None,
        };

        let question = self.question.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() {
            return Err(scope.error("Question text is required", "question"));
        }

        let mut validated = NewQuestion {
            kind,
            question: question.to_string(),
            options: Vec::new(),
            correct_answer: None,
            correct_answers: None,
        };

        match QuestionKind::effective(kind, quiz_kind) {
            QuestionKind::MultipleChoice => {
                validated.options = choice_options(&scope, self.options)?;
                let index = choice_index(&scope, self.correct_answer, CHOICE_OPTION_COUNT as i64 - 1)?;
                validated.correct_answer = Some(CorrectAnswer::Index(index));
            }
            QuestionKind::TrueFalse => {
                validated.options = TRUE_FALSE_OPTIONS.iter().map(|o| o.to_string()).collect();
                let index = choice_index(&scope, self.correct_answer, 1)?;
                validated.correct_answer = Some(CorrectAnswer::Index(index));
            }
            QuestionKind::Identification | QuestionKind::FillInBlank => {
                let answer = match self.correct_answer {
                    Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                    _ => return Err(scope.error("Correct answer text is required", "correctAnswer")),
                };
                validated.correct_answer = Some(CorrectAnswer::Text(answer));
            }
            QuestionKind::Enumeration => {
                let accepted = self.correct_answers.unwrap_or_default();
                if accepted.is_empty() {
                    return Err(scope.error("At least one accepted answer is required", "correctAnswers"));
                }
                let mut answers = Vec::with_capacity(accepted.len());
                for (j, answer) in accepted.into_iter().enumerate() {
                    match answer.as_deref().map(str::trim) {
                        Some(a) if !a.is_empty() => answers.push(a.to_string()),
                        _ => {
                            return Err(scope.error(
                                format!("Accepted answer {} is required", j + 1),
                                &format!("correctAnswers[{}]", j),
                            ));
                        }
                    }
                }
                validated.correct_answers = Some(answers);
            }
            QuestionKind::Unrecognized => {
                return Err(scope.error("Unsupported question type", "type"));
            }
        }

        Ok(validated)
    }
}

fn choice_options(scope: &FieldScope, options: Option<Vec<Option<String>>>) -> Result<Vec<String>, AppError> {
    let options = match options {
        Some(options) if options.len() == CHOICE_OPTION_COUNT => options,
        _ => {
            return Err(scope.error(
                format!("Must have exactly {} options", CHOICE_OPTION_COUNT),
                "options",
            ));
        }
    };

    let mut trimmed = Vec::with_capacity(CHOICE_OPTION_COUNT);
    for (j, option) in options.into_iter().enumerate() {
        match option.as_deref().map(str::trim) {
            Some(o) if !o.is_empty() => trimmed.push(o.to_string()),
            _ => {
                return Err(scope.error(
                    format!("Option {} is required", j + 1),
                    &format!("options[{}]", j),
                ));
            }
        }
    }
    Ok(trimmed)
}

/// Accepts a JSON number or a numeric string, like the web client sends.
fn choice_index(scope: &FieldScope, value: Option<Value>, max: i64) -> Result<i64, AppError> {
    let raw = match value {
        None | Some(Value::Null) => {
            return Err(scope.error("Correct answer is required", "correctAnswer"));
        }
        Some(raw) => raw,
    };

    let index = match &raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match index {
        Some(i) if (0..=max).contains(&i) => Ok(i),
        _ => Err(scope.error(
            format!("Correct answer must be between 0 and {} (got {})", max, raw),
            "correctAnswer",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> QuestionInput {
        serde_json::from_value(value).unwrap()
    }

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn multiple_choice_is_the_default_type() {
        let q = input(json!({
            "question": "  Capital of France? ",
            "options": ["Paris", " Rome", "Berlin", "Madrid"],
            "correctAnswer": 0
        }))
        .into_new_question(None, None)
        .unwrap();

        assert_eq!(q.kind, None);
        assert_eq!(q.question, "Capital of France?");
        assert_eq!(q.options[1], "Rome");
        assert_eq!(q.correct_answer, Some(CorrectAnswer::Index(0)));
        assert_eq!(q.correct_answers, None);
    }

    #[test]
    fn missing_option_is_reported_with_position() {
        let err = input(json!({
            "question": "Pick one",
            "options": ["a", "b", "", "d"],
            "correctAnswer": 1
        }))
        .into_new_question(Some(1), None)
        .unwrap_err();

        match err {
            AppError::Validation { message, field } => {
                assert_eq!(message, "Question 2: Option 3 is required");
                assert_eq!(field, "questions[1].options[2]");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn three_options_are_rejected() {
        let err = input(json!({
            "question": "Pick one",
            "options": ["a", "b", "c"],
            "correctAnswer": 1
        }))
        .into_new_question(None, None)
        .unwrap_err();
        assert_eq!(field_of(err), "options");
    }

    #[test]
    fn correct_index_must_be_in_range() {
        let err = input(json!({
            "question": "Pick one",
            "options": ["a", "b", "c", "d"],
            "correctAnswer": 4
        }))
        .into_new_question(None, None)
        .unwrap_err();
        assert_eq!(field_of(err), "correctAnswer");
    }

    #[test]
    fn numeric_string_index_is_accepted() {
        let q = input(json!({
            "question": "Pick one",
            "options": ["a", "b", "c", "d"],
            "correctAnswer": "2"
        }))
        .into_new_question(None, None)
        .unwrap();
        assert_eq!(q.correct_answer, Some(CorrectAnswer::Index(2)));
    }

    #[test]
    fn true_false_uses_fixed_options() {
        let q = input(json!({
            "type": "true-false",
            "question": "The sky is blue",
            "options": ["Yes", "No", "Maybe", "?"],
            "correctAnswer": 0
        }))
        .into_new_question(None, None)
        .unwrap();
        assert_eq!(q.options, vec!["True".to_string(), "False".to_string()]);

        let err = input(json!({
            "type": "true-false",
            "question": "The sky is blue",
            "correctAnswer": 2
        }))
        .into_new_question(None, None)
        .unwrap_err();
        assert_eq!(field_of(err), "correctAnswer");
    }

    #[test]
    fn quiz_type_applies_when_question_has_none() {
        let q = input(json!({
            "question": "Largest planet",
            "correctAnswer": " Jupiter "
        }))
        .into_new_question(None, Some(QuestionKind::Identification))
        .unwrap();
        assert_eq!(q.kind, None);
        assert_eq!(q.correct_answer, Some(CorrectAnswer::Text("Jupiter".to_string())));
    }

    #[test]
    fn enumeration_requires_accepted_answers() {
        let err = input(json!({
            "type": "enumeration",
            "question": "Name two primes",
            "correctAnswers": []
        }))
        .into_new_question(None, None)
        .unwrap_err();
        assert_eq!(field_of(err), "correctAnswers");

        let q = input(json!({
            "type": "enumeration",
            "question": "Name two primes",
            "correctAnswers": [" 2", "3 "]
        }))
        .into_new_question(None, None)
        .unwrap();
        assert_eq!(q.correct_answers, Some(vec!["2".to_string(), "3".to_string()]));
        assert_eq!(q.correct_answer, None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = input(json!({
            "type": "essay",
            "question": "Discuss"
        }))
        .into_new_question(Some(0), None)
        .unwrap_err();
        assert_eq!(field_of(err), "questions[0].type");
    }

    #[test]
    fn unknown_stored_tag_decodes_as_unrecognized() {
        let kind: QuestionKind = serde_json::from_value(json!("essay")).unwrap();
        assert_eq!(kind, QuestionKind::Unrecognized);
        assert_eq!(QuestionKind::from_tag(" Fill-In-Blank "), QuestionKind::FillInBlank);
    }
}
