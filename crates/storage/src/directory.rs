use async_trait::async_trait;
use quiz_core::model::QuizFile;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::repository::{ContentRepository, StorageError};

/// Reads quiz documents from files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryContentRepository {
    root: PathBuf,
}

impl DirectoryContentRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a file name inside the root, refusing anything that climbs out.
    fn resolve(&self, file: &QuizFile) -> Result<PathBuf, StorageError> {
        let relative = Path::new(file.as_str());
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || file.as_str().is_empty() {
            return Err(StorageError::NotFound(file.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentRepository for DirectoryContentRepository {
    async fn fetch(&self, file: &QuizFile) -> Result<String, StorageError> {
        let path = self.resolve(file)?;
        log::debug!("reading quiz file {}", path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(file.to_string()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}
