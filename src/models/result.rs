// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::question::CorrectAnswer;

/// A raw answer as submitted by the client.
///
/// Decoding never fails: values that fit none of the expected shapes are
/// kept as `Unsupported` and graded as wrong. Non-string list items are kept
/// as their JSON text, so `[null, 7]` becomes `["null", "7"]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Index(i64),
    Text(String),
    List(Vec<String>),
    #[default]
    Absent,
    Unsupported(Value),
}

impl From<Value> for SubmittedAnswer {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SubmittedAnswer::Absent,
            Value::String(s) => SubmittedAnswer::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SubmittedAnswer::Index(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        SubmittedAnswer::Index(f as i64)
                    }
                    _ => SubmittedAnswer::Unsupported(Value::Number(n)),
                },
            },
            Value::Array(items) => SubmittedAnswer::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => SubmittedAnswer::Unsupported(other),
        }
    }
}

impl<'de> Deserialize<'de> for SubmittedAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(SubmittedAnswer::from)
    }
}

/// Per-question breakdown of a graded attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: i64,
    pub question: String,
    #[serde(default)]
    pub user_answer: SubmittedAnswer,
    /// Answer key at grading time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<Vec<String>>,
    pub is_correct: bool,
}

/// A recorded quiz attempt. Never modified after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub quiz_id: i64,
    /// Copied from the quiz at submission time.
    pub quiz_title: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<UserAnswer>,
}

/// A graded attempt waiting to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuizResult {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub answers: Vec<UserAnswer>,
}

impl NewQuizResult {
    pub fn into_result(self, id: i64, completed_at: DateTime<Utc>) -> QuizResult {
        QuizResult {
            id,
            quiz_id: self.quiz_id,
            quiz_title: self.quiz_title,
            score: self.score,
            total_questions: self.total_questions,
            percentage: self.percentage,
            completed_at,
            answers: self.answers,
        }
    }
}

/// DTO for submitting answers, aligned by position with the quiz questions.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: Option<Vec<AnswerEntry>>,
}

/// One element of `answers`. Entries that are not objects decode as absent.
#[derive(Debug, Default)]
pub struct AnswerEntry {
    pub answer: SubmittedAnswer,
}

impl<'de> Deserialize<'de> for AnswerEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let answer = match Value::deserialize(deserializer)? {
            Value::Object(mut fields) => fields
                .remove("answer")
                .map(SubmittedAnswer::from)
                .unwrap_or_default(),
            _ => SubmittedAnswer::Absent,
        };
        Ok(AnswerEntry { answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_each_shape() {
        assert_eq!(SubmittedAnswer::from(json!(2)), SubmittedAnswer::Index(2));
        assert_eq!(SubmittedAnswer::from(json!(2.0)), SubmittedAnswer::Index(2));
        assert_eq!(
            SubmittedAnswer::from(json!("Paris")),
            SubmittedAnswer::Text("Paris".to_string())
        );
        assert_eq!(
            SubmittedAnswer::from(json!(["a", 7])),
            SubmittedAnswer::List(vec!["a".to_string(), "7".to_string()])
        );
        assert_eq!(
            SubmittedAnswer::from(json!([null, true])),
            SubmittedAnswer::List(vec!["null".to_string(), "true".to_string()])
        );
        assert_eq!(SubmittedAnswer::from(json!(null)), SubmittedAnswer::Absent);
        assert_eq!(
            SubmittedAnswer::from(json!(1.5)),
            SubmittedAnswer::Unsupported(json!(1.5))
        );
        assert_eq!(
            SubmittedAnswer::from(json!(true)),
            SubmittedAnswer::Unsupported(json!(true))
        );
    }

    #[test]
    fn missing_answer_field_is_absent() {
        let req: SubmitQuizRequest =
            serde_json::from_value(json!({ "answers": [{}, { "answer": 1 }] })).unwrap();
        let answers = req.answers.unwrap();
        assert_eq!(answers[0].answer, SubmittedAnswer::Absent);
        assert_eq!(answers[1].answer, SubmittedAnswer::Index(1));
    }

    #[test]
    fn malformed_entries_do_not_fail_the_request() {
        let req: SubmitQuizRequest = serde_json::from_value(json!({
            "answers": [null, 1, "x", { "answer": 3 }, [2]]
        }))
        .unwrap();
        let answers: Vec<SubmittedAnswer> =
            req.answers.unwrap().into_iter().map(|e| e.answer).collect();
        assert_eq!(
            answers,
            vec![
                SubmittedAnswer::Absent,
                SubmittedAnswer::Absent,
                SubmittedAnswer::Absent,
                SubmittedAnswer::Index(3),
                SubmittedAnswer::Absent,
            ]
        );
    }

    #[test]
    fn absent_answer_serializes_as_null() {
        let value = serde_json::to_value(SubmittedAnswer::Absent).unwrap();
        assert_eq!(value, Value::Null);
    }
}
