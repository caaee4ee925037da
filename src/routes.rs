// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error,
    handlers::{health, quiz, result},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the quiz, question, submission and result routes under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (repositories and config).
pub fn create_router(state: AppState) -> Router {
    // Credentialed CORS cannot use a wildcard origin.
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .map(|origin| origin.trim())
        .filter_map(|origin| match origin.parse() {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/quizzes", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/quizzes/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/quizzes/{id}/questions", post(quiz::add_question))
        .route("/quizzes/{id}/submit", post(quiz::submit_quiz))
        .route("/quizzes/{id}/results", get(result::list_quiz_results))
        .route("/results", get(result::list_results))
        .route("/results/{id}", delete(result::delete_result));

    Router::new()
        .route("/", get(health::index))
        .nest("/api", api_routes)
        .layer(middleware::map_response_with_state(
            state.clone(),
            error::attach_internal_details,
        ))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
