// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{NewQuestion, Question, QuestionInput, QuestionKind},
    utils::validation::{first_violation, not_blank},
};

/// A quiz with its questions in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Type applied to questions that do not carry their own.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionKind>,

    #[serde(default)]
    pub questions: Vec<Question>,

    pub created_at: DateTime<Utc>,
}

/// A validated quiz ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub kind: Option<QuestionKind>,
    pub questions: Vec<NewQuestion>,
}

/// Title/description edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl QuizPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// DTO for creating a quiz together with its questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[serde(default)]
    #[validate(custom(function = not_blank), length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = not_blank), length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub questions: Option<Vec<QuestionInput>>,
}

impl CreateQuizRequest {
    /// Validates the whole payload. Any failing question rejects the quiz.
    pub fn into_new_quiz(self) -> Result<NewQuiz, AppError> {
        if let Err(errors) = self.validate() {
            return Err(first_violation(&errors, &["title", "description"]));
        }

        let inputs = match self.questions {
            None => return Err(AppError::validation("Questions must be an array", "questions")),
            Some(inputs) if inputs.is_empty() => {
                return Err(AppError::validation(
                    "At least one question is required",
                    "questions",
                ));
            }
            Some(inputs) => inputs,
        };

        let kind = match self.kind.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => match QuestionKind::from_tag(tag) {
                QuestionKind::Unrecognized => {
                    return Err(AppError::validation(
                        format!("Unsupported quiz type '{}'", tag),
                        "type",
                    ));
                }
                kind => Some(kind),
            },
            None => None,
        };

        let questions = inputs
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.into_new_question(Some(i), kind))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewQuiz {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            kind,
            questions,
        })
    }
}

/// DTO for editing a quiz. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(custom(function = not_blank), length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,

    #[validate(custom(function = not_blank), length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl UpdateQuizRequest {
    pub fn into_patch(self) -> Result<QuizPatch, AppError> {
        if let Err(errors) = self.validate() {
            return Err(first_violation(&errors, &["title", "description"]));
        }

        Ok(QuizPatch {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
        })
    }
}
