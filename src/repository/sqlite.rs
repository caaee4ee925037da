// src/repository/sqlite.rs

use std::{collections::HashMap, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
};

use crate::{
    error::AppError,
    models::{
        question::{CorrectAnswer, NewQuestion, Question, QuestionKind},
        quiz::{NewQuiz, Quiz, QuizPatch},
        result::{NewQuizResult, QuizResult, UserAnswer},
    },
    repository::{QuizRepository, ResultRepository},
};

/// Opens a SQLite pool with foreign keys enforced.
///
/// In-memory databases live inside a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    pool_options
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Relational store for quizzes, questions and results.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn questions_for(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, question_type, question,
                   option1, option2, option3, option4,
                   correct_answer, correct_text, correct_answers
            FROM questions
            WHERE quiz_id = ?
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for quiz {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Question::from).collect())
    }
}

/// Row of the `quizzes` table.
#[derive(Debug, FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    description: String,
    quiz_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: self.id,
            title: self.title,
            description: self.description,
            kind: self.quiz_type.as_deref().map(QuestionKind::from_tag),
            questions,
            created_at: self.created_at,
        }
    }
}

/// Row of the `questions` table.
/// Choice questions keep their options in four columns and a 1-based index.
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    question_type: Option<String>,
    question: String,
    option1: Option<String>,
    option2: Option<String>,
    option3: Option<String>,
    option4: Option<String>,
    correct_answer: Option<i64>,
    correct_text: Option<String>,
    correct_answers: Option<Json<Vec<String>>>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        let correct_answer = match (row.correct_answer, row.correct_text) {
            (Some(stored), _) => Some(CorrectAnswer::Index(stored - 1)),
            (None, Some(text)) => Some(CorrectAnswer::Text(text)),
            (None, None) => None,
        };

        Question {
            id: row.id,
            quiz_id: row.quiz_id,
            kind: row.question_type.as_deref().map(QuestionKind::from_tag),
            question: row.question,
            options: [row.option1, row.option2, row.option3, row.option4]
                .into_iter()
                .flatten()
                .collect(),
            correct_answer,
            correct_answers: row.correct_answers.map(|answers| answers.0),
        }
    }
}

/// Row of the `results` table.
#[derive(Debug, FromRow)]
struct ResultRow {
    id: i64,
    quiz_id: i64,
    quiz_title: String,
    score: i64,
    total_questions: i64,
    percentage: i64,
    answers: Json<Vec<UserAnswer>>,
    completed_at: DateTime<Utc>,
}

impl From<ResultRow> for QuizResult {
    fn from(row: ResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            score: row.score,
            total_questions: row.total_questions,
            percentage: row.percentage,
            completed_at: row.completed_at,
            answers: row.answers.0,
        }
    }
}

/// Inserts one question row and returns its id.
/// The 0-based index of the API is stored 1-based.
async fn insert_question(
    conn: &mut SqliteConnection,
    quiz_id: i64,
    position: i64,
    question: &NewQuestion,
) -> Result<i64, AppError> {
    let option = |i: usize| question.options.get(i).cloned();

    let (correct_index, correct_text) = match &question.correct_answer {
        Some(CorrectAnswer::Index(index)) => (Some(index + 1), None),
        Some(CorrectAnswer::Text(text)) => (None, Some(text.clone())),
        None => (None, None),
    };

    let correct_answers = question
        .correct_answers
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions
        (quiz_id, position, question_type, question,
         option1, option2, option3, option4,
         correct_answer, correct_text, correct_answers)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(quiz_id)
    .bind(position)
    .bind(question.kind.map(|k| k.as_str()))
    .bind(&question.question)
    .bind(option(0))
    .bind(option(1))
    .bind(option(2))
    .bind(option(3))
    .bind(correct_index)
    .bind(correct_text)
    .bind(correct_answers)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

#[async_trait]
impl QuizRepository for SqliteStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let quiz_id = sqlx::query(
            r#"
            INSERT INTO quizzes (title, description, quiz_type, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.kind.map(|k| k.as_str()))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .last_insert_rowid();

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for (position, question) in quiz.questions.into_iter().enumerate() {
            // Dropping `tx` on error rolls the whole quiz back.
            let id = insert_question(&mut tx, quiz_id, position as i64, &question).await?;
            questions.push(question.into_question(id, quiz_id));
        }

        tx.commit().await?;

        tracing::info!("Quiz {} created with {} questions", quiz_id, questions.len());

        Ok(Quiz {
            id: quiz_id,
            title: quiz.title,
            description: quiz.description,
            kind: quiz.kind,
            questions,
            created_at,
        })
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, title, description, quiz_type, created_at FROM quizzes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let questions = self.questions_for(row.id).await?;
                Ok(Some(row.into_quiz(questions)))
            }
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, description, quiz_type, created_at
            FROM quizzes
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let question_rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, question_type, question,
                   option1, option2, option3, option4,
                   correct_answer, correct_text, correct_answers
            FROM questions
            ORDER BY quiz_id ASC, position ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_quiz: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in question_rows {
            by_quiz.entry(row.quiz_id).or_default().push(Question::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let questions = by_quiz.remove(&row.id).unwrap_or_default();
                row.into_quiz(questions)
            })
            .collect())
    }

    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Option<Quiz>, AppError> {
        if patch.is_empty() {
            return self.get_quiz(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE quizzes SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = patch.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }

        if let Some(description) = patch.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to update quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_quiz(id).await
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        question: NewQuestion,
    ) -> Result<Option<Question>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
            .bind(quiz_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let position = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE quiz_id = ?",
        )
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;

        let id = insert_question(&mut tx, quiz_id, position, &question).await?;
        tx.commit().await?;

        Ok(Some(question.into_question(id, quiz_id)))
    }
}

#[async_trait]
impl ResultRepository for SqliteStore {
    async fn append_result(&self, result: NewQuizResult) -> Result<QuizResult, AppError> {
        let completed_at = Utc::now();
        let answers = serde_json::to_string(&result.answers)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let id = sqlx::query(
            r#"
            INSERT INTO results
            (quiz_id, quiz_title, score, total_questions, percentage, answers, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result.quiz_id)
        .bind(&result.quiz_title)
        .bind(result.score)
        .bind(result.total_questions)
        .bind(result.percentage)
        .bind(answers)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save result for quiz {}: {:?}", result.quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?
        .last_insert_rowid();

        Ok(result.into_result(id, completed_at))
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, AppError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, quiz_id, quiz_title, score, total_questions, percentage, answers, completed_at
            FROM results
            ORDER BY completed_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn list_results_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, quiz_id, quiz_title, score, total_questions, percentage, answers, completed_at
            FROM results
            WHERE quiz_id = ?
            ORDER BY completed_at DESC, id DESC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn delete_result(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM results WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::SubmittedAnswer;

    async fn store() -> SqliteStore {
        let pool = connect("sqlite::memory:", 1).await.unwrap();
        migrate(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn choice(text: &str, index: i64) -> NewQuestion {
        NewQuestion {
            kind: None,
            question: text.to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: Some(CorrectAnswer::Index(index)),
            correct_answers: None,
        }
    }

    fn new_quiz(title: &str, questions: Vec<NewQuestion>) -> NewQuiz {
        NewQuiz {
            title: title.to_string(),
            description: "desc".to_string(),
            kind: None,
            questions,
        }
    }

    fn new_result(quiz: &Quiz, score: i64) -> NewQuizResult {
        NewQuizResult {
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            score,
            total_questions: quiz.questions.len() as i64,
            percentage: 0,
            answers: vec![UserAnswer {
                question_id: quiz.questions[0].id,
                question: quiz.questions[0].question.clone(),
                user_answer: SubmittedAnswer::Index(score),
                correct_answer: quiz.questions[0].correct_answer.clone(),
                correct_answers: None,
                is_correct: score > 0,
            }],
        }
    }

    #[tokio::test]
    async fn failed_question_insert_rolls_back_the_quiz() {
        let store = store().await;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_question BEFORE INSERT ON questions
            WHEN NEW.question = 'rejected'
            BEGIN
                SELECT RAISE(ABORT, 'question rejected');
            END
            "#,
        )
        .execute(store.pool())
        .await
        .unwrap();

        let err = store
            .create_quiz(new_quiz("Half", vec![choice("fine", 0), choice("rejected", 1)]))
            .await;
        assert!(err.is_err());

        let quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(store.pool())
            .await
            .unwrap();
        let questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(quizzes, 0);
        assert_eq!(questions, 0);
        assert!(store.list_quizzes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn correct_index_is_stored_one_based() {
        let store = store().await;
        let quiz = store
            .create_quiz(new_quiz("Q", vec![choice("first", 0), choice("second", 3)]))
            .await
            .unwrap();

        let stored: Vec<i64> = sqlx::query_scalar(
            "SELECT correct_answer FROM questions WHERE quiz_id = ? ORDER BY position",
        )
        .bind(quiz.id)
        .fetch_all(store.pool())
        .await
        .unwrap();
        assert_eq!(stored, vec![1, 4]);

        let loaded = store.get_quiz(quiz.id).await.unwrap().unwrap();
        assert_eq!(loaded.questions[0].correct_answer, Some(CorrectAnswer::Index(0)));
        assert_eq!(loaded.questions[1].correct_answer, Some(CorrectAnswer::Index(3)));
        assert_eq!(loaded.questions[1].options.len(), 4);
    }

    #[tokio::test]
    async fn text_and_list_keys_round_trip() {
        let store = store().await;
        let identification = NewQuestion {
            kind: Some(QuestionKind::Identification),
            question: "Capital of Peru".into(),
            options: vec![],
            correct_answer: Some(CorrectAnswer::Text("Lima".into())),
            correct_answers: None,
        };
        let enumeration = NewQuestion {
            kind: Some(QuestionKind::Enumeration),
            question: "Greek letters".into(),
            options: vec![],
            correct_answer: None,
            correct_answers: Some(vec!["alpha".into(), "beta".into()]),
        };

        let quiz = store
            .create_quiz(new_quiz("Mixed", vec![identification, enumeration]))
            .await
            .unwrap();
        let loaded = store.get_quiz(quiz.id).await.unwrap().unwrap();

        assert_eq!(loaded.questions, quiz.questions);
        assert_eq!(loaded.questions[1].kind, Some(QuestionKind::Enumeration));
        assert!(loaded.questions[0].options.is_empty());
    }

    #[tokio::test]
    async fn quizzes_are_listed_newest_first() {
        let store = store().await;
        let first = store.create_quiz(new_quiz("first", vec![choice("q", 0)])).await.unwrap();
        let second = store.create_quiz(new_quiz("second", vec![choice("q", 1)])).await.unwrap();

        let listed = store.list_quizzes().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[1].questions.len(), 1);
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        let store = store().await;
        let quiz = store.create_quiz(new_quiz("old", vec![choice("q", 0)])).await.unwrap();

        let patch = QuizPatch {
            title: Some("new".into()),
            description: None,
        };
        let updated = store.update_quiz(quiz.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description, "desc");

        let missing = store
            .update_quiz(9999, QuizPatch { title: Some("x".into()), description: None })
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn added_questions_go_last() {
        let store = store().await;
        let quiz = store.create_quiz(new_quiz("Q", vec![choice("one", 0)])).await.unwrap();

        let added = store.add_question(quiz.id, choice("two", 2)).await.unwrap().unwrap();
        assert_eq!(added.quiz_id, quiz.id);

        let loaded = store.get_quiz(quiz.id).await.unwrap().unwrap();
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.questions[1].question, "two");

        assert!(store.add_question(9999, choice("x", 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_quiz_cascades() {
        let store = store().await;
        let quiz = store.create_quiz(new_quiz("Q", vec![choice("q", 0)])).await.unwrap();
        let other = store.create_quiz(new_quiz("Other", vec![choice("q", 0)])).await.unwrap();

        store.append_result(new_result(&quiz, 1)).await.unwrap();
        store.append_result(new_result(&other, 0)).await.unwrap();
        assert_eq!(store.list_results_by_quiz(quiz.id).await.unwrap().len(), 1);

        assert!(store.delete_quiz(quiz.id).await.unwrap());
        assert!(!store.delete_quiz(quiz.id).await.unwrap());

        assert!(store.list_results_by_quiz(quiz.id).await.unwrap().is_empty());
        assert_eq!(store.list_results().await.unwrap().len(), 1);

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
            .bind(quiz.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn results_keep_their_breakdown() {
        let store = store().await;
        let quiz = store.create_quiz(new_quiz("Q", vec![choice("q", 1)])).await.unwrap();

        let first = store.append_result(new_result(&quiz, 1)).await.unwrap();
        let second = store.append_result(new_result(&quiz, 0)).await.unwrap();

        let listed = store.list_results().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[1].answers, first.answers);
        assert_eq!(listed[1].answers[0].user_answer, SubmittedAnswer::Index(1));

        assert!(store.delete_result(first.id).await.unwrap());
        assert!(!store.delete_result(first.id).await.unwrap());
        assert_eq!(store.list_results().await.unwrap().len(), 1);
    }
}
