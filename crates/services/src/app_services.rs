use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::QuizFile;
use storage::repository::Storage;

use crate::content_service::ContentService;
use crate::error::{AppServicesError, ContentServiceError};
use crate::ledger::ProgressLedger;
use crate::sessions::SessionEngine;
use crate::Clock;

/// Quiz file opened when neither the caller nor the save names one.
pub const DEFAULT_QUIZ_FILE: &str = "current.json";

/// Assembles the ledger and content service over one storage backend.
#[derive(Clone)]
pub struct QuizServices {
    clock: Clock,
    ledger: Arc<ProgressLedger>,
    content: Arc<ContentService>,
}

impl QuizServices {
    /// Build services backed by `SQLite` saves and a content directory.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        content_dir: impl Into<PathBuf>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, content_dir).await?;
        Ok(Self::from_storage(storage, clock).await)
    }

    /// Build services over any storage, loading saved progress.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Self {
        let ledger = Arc::new(ProgressLedger::load(Arc::clone(&storage.saves)).await);
        let content = Arc::new(ContentService::new(Arc::clone(&storage.content)));
        Self {
            clock,
            ledger,
            content,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<ProgressLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentService> {
        Arc::clone(&self.content)
    }

    /// A fresh engine writing to this ledger.
    #[must_use]
    pub fn engine(&self) -> SessionEngine {
        SessionEngine::new(self.ledger()).with_clock(self.clock)
    }

    /// Quiz to open: the requested one, else the last one played, else the default.
    #[must_use]
    pub fn resolve_quiz(&self, requested: Option<QuizFile>) -> QuizFile {
        requested
            .or_else(|| self.ledger.current_quiz())
            .unwrap_or_else(|| QuizFile::new(DEFAULT_QUIZ_FILE))
    }

    /// Load `file` into `engine` and remember it as the current quiz.
    ///
    /// On failure the engine is left without content.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError` if the file cannot be fetched or validated.
    pub async fn open_quiz(
        &self,
        engine: &mut SessionEngine,
        file: &QuizFile,
    ) -> Result<(), ContentServiceError> {
        match self.content.load(file).await {
            Ok(content) => {
                engine.load_content(content);
                self.ledger.set_current_quiz(file.clone()).await;
                Ok(())
            }
            Err(err) => {
                engine.unload_content();
                Err(err)
            }
        }
    }
}
