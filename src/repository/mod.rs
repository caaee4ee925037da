// src/repository/mod.rs

//! Persistence contracts and their implementations.
//!
//! * `SqliteStore`: relational store, questions and results cascade with their quiz.
//! * `LocalStore`: in-process store with an optional JSON snapshot file.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz, QuizPatch},
        result::{NewQuizResult, QuizResult},
    },
};

pub mod local;
pub mod sqlite;

pub use local::LocalStore;
pub use sqlite::SqliteStore;

pub type SharedQuizRepository = Arc<dyn QuizRepository>;
pub type SharedResultRepository = Arc<dyn ResultRepository>;

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Stores the quiz and all of its questions, or nothing at all.
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError>;

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;

    /// Newest first.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    /// Returns `None` when the quiz does not exist.
    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Option<Quiz>, AppError>;

    /// Removes the quiz, its questions and its results.
    /// Returns `false` when nothing was deleted.
    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError>;

    /// Appends a question after the existing ones.
    /// Returns `None` when the quiz does not exist.
    async fn add_question(
        &self,
        quiz_id: i64,
        question: NewQuestion,
    ) -> Result<Option<Question>, AppError>;
}

/// Append-only store of graded attempts.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn append_result(&self, result: NewQuizResult) -> Result<QuizResult, AppError>;

    /// Most recently completed first.
    async fn list_results(&self) -> Result<Vec<QuizResult>, AppError>;

    async fn list_results_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError>;

    async fn delete_result(&self, id: i64) -> Result<bool, AppError>;
}
