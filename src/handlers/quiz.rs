// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        question::QuestionInput,
        quiz::{CreateQuizRequest, UpdateQuizRequest},
        result::{SubmitQuizRequest, SubmittedAnswer},
    },
    repository::SharedQuizRepository,
    scoring::score_quiz,
    state::AppState,
};

/// Lists all quizzes with their questions, newest first.
pub async fn list_quizzes(
    State(quizzes): State<SharedQuizRepository>,
) -> Result<impl IntoResponse, AppError> {
    let list = quizzes.list_quizzes().await?;
    Ok(Json(list))
}

/// Retrieves a single quiz by ID.
pub async fn get_quiz(
    State(quizzes): State<SharedQuizRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = quizzes
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Creates a quiz together with its questions.
///
/// * Validates title, description and every question before touching storage.
/// * A single invalid question rejects the whole quiz.
pub async fn create_quiz(
    State(quizzes): State<SharedQuizRepository>,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let new_quiz = payload.into_new_quiz().inspect_err(|e| {
        tracing::debug!("Rejected quiz: {}", e);
    })?;

    let quiz = quizzes.create_quiz(new_quiz).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates the title and/or description of a quiz.
pub async fn update_quiz(
    State(quizzes): State<SharedQuizRepository>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;

    let quiz = quizzes
        .update_quiz(id, patch)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Deletes a quiz. Its questions and results go with it.
pub async fn delete_quiz(
    State(quizzes): State<SharedQuizRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !quizzes.delete_quiz(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!("Quiz {} deleted", id);

    Ok(Json(serde_json::json!({ "message": "Quiz deleted successfully" })))
}

/// Appends one question to an existing quiz.
pub async fn add_question(
    State(quizzes): State<SharedQuizRepository>,
    Path(id): Path<i64>,
    payload: Result<Json<QuestionInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let quiz = quizzes
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let new_question = payload.into_new_question(None, quiz.kind)?;

    let question = quizzes
        .add_question(id, new_question)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Grades a submission and records the result.
///
/// * Answers are matched to questions by position.
/// * Malformed or missing answers count as wrong, they never fail the request.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let answers: Vec<SubmittedAnswer> = payload
        .answers
        .ok_or_else(|| AppError::validation("Answers must be an array", "answers"))?
        .into_iter()
        .map(|entry| entry.answer)
        .collect();

    let quiz = state
        .quizzes
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let scorecard = score_quiz(&quiz, &answers);

    tracing::info!(
        "Quiz {} submitted: {}/{} ({}%)",
        quiz.id,
        scorecard.score,
        scorecard.total_questions,
        scorecard.percentage
    );

    let result = state
        .results
        .append_result(scorecard.into_new_result(&quiz))
        .await?;

    Ok(Json(result))
}
