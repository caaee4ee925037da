use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    repository::{
        QuizRepository, ResultRepository, SharedQuizRepository, SharedResultRepository,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quizzes: SharedQuizRepository,
    pub results: SharedResultRepository,
    pub config: Config,
}

impl AppState {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn ResultRepository>,
        config: Config,
    ) -> Self {
        Self {
            quizzes,
            results,
            config,
        }
    }

    /// State backed by one store that implements both repositories.
    pub fn with_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: QuizRepository + ResultRepository + 'static,
    {
        Self::new(store.clone(), store, config)
    }
}

impl FromRef<AppState> for SharedQuizRepository {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}

impl FromRef<AppState> for SharedResultRepository {
    fn from_ref(state: &AppState) -> Self {
        state.results.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
