// src/repository/local.rs

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{
        question::{NewQuestion, Question},
        quiz::{NewQuiz, Quiz, QuizPatch},
        result::{NewQuizResult, QuizResult},
    },
    repository::{QuizRepository, ResultRepository},
};

/// Everything the local store knows, as written to the snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    quizzes: Vec<Quiz>,
    #[serde(default)]
    results: Vec<QuizResult>,
    #[serde(default)]
    last_quiz_id: i64,
    #[serde(default)]
    last_question_id: i64,
    #[serde(default)]
    last_result_id: i64,
}

impl Snapshot {
    /// Makes sure id counters are ahead of every stored id, even when the
    /// file was edited by hand.
    fn reconcile(&mut self) {
        let max_quiz = self.quizzes.iter().map(|q| q.id).max().unwrap_or(0);
        let max_question = self
            .quizzes
            .iter()
            .flat_map(|q| q.questions.iter().map(|question| question.id))
            .max()
            .unwrap_or(0);
        let max_result = self.results.iter().map(|r| r.id).max().unwrap_or(0);

        self.last_quiz_id = self.last_quiz_id.max(max_quiz);
        self.last_question_id = self.last_question_id.max(max_question);
        self.last_result_id = self.last_result_id.max(max_result);
    }

    fn next_question_id(&mut self) -> i64 {
        self.last_question_id += 1;
        self.last_question_id
    }
}

/// In-process implementation of both repositories.
///
/// When a path is set, every write is followed by a full snapshot of the
/// data to that file, and the file is read back on `open`.
pub struct LocalStore {
    data: Mutex<Snapshot>,
    path: Option<PathBuf>,
    /// Serializes writers so snapshots reach the disk in mutation order.
    write_lock: tokio::sync::Mutex<()>,
}

impl LocalStore {
    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            data: Mutex::new(Snapshot::default()),
            path: None,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Loads the snapshot at `path` (if any) and keeps saving to it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let mut snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Snapshot::default(),
            Ok(raw) => serde_json::from_str::<Snapshot>(&raw).map_err(|e| {
                AppError::InternalServerError(format!(
                    "Failed to parse local store {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        snapshot.reconcile();

        tracing::info!(
            "Local store loaded from {} ({} quizzes, {} results)",
            path.display(),
            snapshot.quizzes.len(),
            snapshot.results.len()
        );

        Ok(Self {
            data: Mutex::new(snapshot),
            path: Some(path),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> Result<R, AppError> {
        let data = self
            .data
            .lock()
            .map_err(|_| AppError::InternalServerError("Local store lock poisoned".to_string()))?;
        Ok(f(&*data))
    }

    /// Applies `f` to a copy of the data and publishes the copy only once
    /// it has been persisted. A failed save leaves the store unchanged.
    async fn write<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> Result<R, AppError> {
        let _writer = self.write_lock.lock().await;

        let mut next = self.read(Snapshot::clone)?;
        let out = f(&mut next);

        if let Some(path) = &self.path {
            let serialized = serde_json::to_string_pretty(&next)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            save(path, serialized).await?;
        }

        let mut data = self
            .data
            .lock()
            .map_err(|_| AppError::InternalServerError("Local store lock poisoned".to_string()))?;
        *data = next;

        Ok(out)
    }
}

/// Writes through a temporary file so a crash never leaves half a snapshot.
async fn save(path: &Path, contents: String) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await.map_err(|e| {
        tracing::error!("Failed to write local store {}: {:?}", tmp.display(), e);
        AppError::InternalServerError(e.to_string())
    })?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl QuizRepository for LocalStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        let created = self
            .write(|data| {
                data.last_quiz_id += 1;
                let quiz_id = data.last_quiz_id;

                let questions = quiz
                    .questions
                    .into_iter()
                    .map(|q| {
                        let id = data.next_question_id();
                        q.into_question(id, quiz_id)
                    })
                    .collect();

                let created = Quiz {
                    id: quiz_id,
                    title: quiz.title,
                    description: quiz.description,
                    kind: quiz.kind,
                    questions,
                    created_at: Utc::now(),
                };
                data.quizzes.push(created.clone());
                created
            })
            .await?;

        tracing::info!("Quiz {} created with {} questions", created.id, created.questions.len());
        Ok(created)
    }

    async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        self.read(|data| data.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let mut quizzes = self.read(|data| data.quizzes.clone())?;
        newest_first(&mut quizzes, |q| (q.created_at, q.id));
        Ok(quizzes)
    }

    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Option<Quiz>, AppError> {
        if patch.is_empty() {
            return self.get_quiz(id).await;
        }

        self.write(|data| {
            let quiz = data.quizzes.iter_mut().find(|q| q.id == id)?;
            if let Some(title) = patch.title {
                quiz.title = title;
            }
            if let Some(description) = patch.description {
                quiz.description = description;
            }
            Some(quiz.clone())
        })
        .await
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        self.write(|data| {
            let before = data.quizzes.len();
            data.quizzes.retain(|q| q.id != id);
            let removed = data.quizzes.len() != before;
            if removed {
                data.results.retain(|r| r.quiz_id != id);
            }
            removed
        })
        .await
    }

    async fn add_question(
        &self,
        quiz_id: i64,
        question: NewQuestion,
    ) -> Result<Option<Question>, AppError> {
        self.write(|data| {
            let index = data.quizzes.iter().position(|q| q.id == quiz_id)?;
            let id = data.next_question_id();
            let question = question.into_question(id, quiz_id);
            data.quizzes[index].questions.push(question.clone());
            Some(question)
        })
        .await
    }
}

#[async_trait]
impl ResultRepository for LocalStore {
    async fn append_result(&self, result: NewQuizResult) -> Result<QuizResult, AppError> {
        self.write(|data| {
            data.last_result_id += 1;
            let stored = result.into_result(data.last_result_id, Utc::now());
            data.results.push(stored.clone());
            stored
        })
        .await
    }

    async fn list_results(&self) -> Result<Vec<QuizResult>, AppError> {
        let mut results = self.read(|data| data.results.clone())?;
        newest_first(&mut results, |r| (r.completed_at, r.id));
        Ok(results)
    }

    async fn list_results_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizResult>, AppError> {
        let mut results = self.read(|data| {
            data.results
                .iter()
                .filter(|r| r.quiz_id == quiz_id)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        newest_first(&mut results, |r| (r.completed_at, r.id));
        Ok(results)
    }

    async fn delete_result(&self, id: i64) -> Result<bool, AppError> {
        self.write(|data| {
            let before = data.results.len();
            data.results.retain(|r| r.id != id);
            data.results.len() != before
        })
        .await
    }
}
