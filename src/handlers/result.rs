// src/handlers/result.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, repository::SharedResultRepository};

/// Lists every recorded attempt, most recent first.
pub async fn list_results(
    State(results): State<SharedResultRepository>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(results.list_results().await?))
}

/// Lists the attempts of one quiz. Unknown quizzes yield an empty list.
pub async fn list_quiz_results(
    State(results): State<SharedResultRepository>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(results.list_results_by_quiz(quiz_id).await?))
}

pub async fn delete_result(
    State(results): State<SharedResultRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !results.delete_result(id).await? {
        return Err(AppError::NotFound("Result not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Result deleted successfully" })))
}
