use std::sync::Arc;

use quiz_core::QuizContent;
use quiz_core::model::{QuestionKind, QuizFile};
use storage::repository::ContentRepository;

use crate::error::ContentServiceError;

/// Fetches quiz documents and validates them into `QuizContent`.
#[derive(Clone)]
pub struct ContentService {
    source: Arc<dyn ContentRepository>,
}

impl ContentService {
    #[must_use]
    pub fn new(source: Arc<dyn ContentRepository>) -> Self {
        Self { source }
    }

    /// Load and validate one quiz file.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError::Storage` if the file cannot be fetched, or
    /// `ContentServiceError::Content` if it is not a valid quiz document.
    pub async fn load(&self, file: &QuizFile) -> Result<QuizContent, ContentServiceError> {
        let raw = self.source.fetch(file).await?;
        let content = QuizContent::from_json_str(file.clone(), &raw).inspect_err(|err| {
            log::warn!("rejected quiz file {file}: {err}");
        })?;

        for question in content.questions() {
            if let QuestionKind::MultipleChoice { choices, answer } = question.kind()
                && !choices.contains(answer)
            {
                log::warn!(
                    "question {} in {file}: answer {answer:?} is not one of its choices",
                    question.id()
                );
            }
        }

        log::info!(
            "loaded {} questions from {file} ({})",
            content.len(),
            content.title()
        );
        Ok(content)
    }
}
