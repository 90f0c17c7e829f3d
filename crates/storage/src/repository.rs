use async_trait::async_trait;
use quiz_core::model::QuizFile;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key the progress blob is stored under.
pub const SAVE_KEY: &str = "studyQuizSave";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store for opaque save blobs.
#[async_trait]
pub trait SaveRepository: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (or replace) the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be stored.
    async fn save_blob(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Delete the blob stored under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the delete.
    async fn remove_blob(&self, key: &str) -> Result<(), StorageError>;
}

/// Source of raw quiz documents, fetched by file name.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch the raw JSON text of a quiz file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file does not exist, or other
    /// storage errors.
    async fn fetch(&self, file: &QuizFile) -> Result<String, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    blobs: Arc<Mutex<HashMap<String, String>>>,
    documents: Arc<Mutex<HashMap<QuizFile, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quiz document under a file name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_document(
        &self,
        file: QuizFile,
        json: impl Into<String>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(file, json.into());
        Ok(())
    }
}

#[async_trait]
impl SaveRepository for InMemoryRepository {
    async fn load_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn save_blob(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), blob.to_owned());
        Ok(())
    }

    async fn remove_blob(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn fetch(&self, file: &QuizFile) -> Result<String, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(file)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file.to_string()))
    }
}

/// Aggregates save and content repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub saves: Arc<dyn SaveRepository>,
    pub content: Arc<dyn ContentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let saves: Arc<dyn SaveRepository> = Arc::new(repo.clone());
        let content: Arc<dyn ContentRepository> = Arc::new(repo);
        Self { saves, content }
    }
}
