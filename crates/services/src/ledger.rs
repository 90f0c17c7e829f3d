use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::{Progress, QuestionId, QuizFile, XpAward};
use storage::repository::{SAVE_KEY, SaveRepository};

use crate::error::LedgerError;

/// Scoring-side view of the persisted progress.
///
/// Every mutation is flushed to the backing store before it returns. Storage
/// failures are logged and never surface to gameplay.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Award XP for a correct answer at `streak`, returning what was earned.
    async fn award_xp(&self, base: u32, streak: u32) -> XpAward;

    /// Move mastery by one step and return the new value.
    async fn bump_mastery(&self, quiz: &QuizFile, id: &QuestionId, correct: bool) -> u8;

    /// Apply a signed mastery delta and return the new (clamped) value.
    async fn override_mastery(&self, quiz: &QuizFile, id: &QuestionId, delta: i8) -> u8;

    async fn increment_correct(&self);

    async fn increment_wrong(&self);

    /// Take back one wrong answer (used when a miss is overridden).
    async fn undo_wrong(&self);

    /// Record a badge. Returns `true` only the first time.
    async fn add_badge(&self, id: &str) -> bool;

    /// Record a sticker for `quiz`. Returns `true` only the first time.
    async fn add_sticker(&self, quiz: &QuizFile, sticker: &str) -> bool;

    /// Copy of the current progress.
    async fn snapshot(&self) -> Progress;
}

//
// ─── PERSISTENT LEDGER ─────────────────────────────────────────────────────────
//

/// `Ledger` backed by one JSON blob in a `SaveRepository`.
pub struct ProgressLedger {
    store: Arc<dyn SaveRepository>,
    progress: Mutex<Progress>,
    flush_failures: AtomicUsize,
}

impl ProgressLedger {
    /// Read the save blob and merge it over defaults.
    ///
    /// A missing, unreadable or corrupt blob yields default progress.
    pub async fn load(store: Arc<dyn SaveRepository>) -> Self {
        let progress = match store.load_blob(SAVE_KEY).await {
            Ok(Some(blob)) => Progress::from_blob(&blob).unwrap_or_else(|err| {
                log::warn!("discarding unreadable save data: {err}");
                Progress::default()
            }),
            Ok(None) => Progress::default(),
            Err(err) => {
                log::warn!("could not read save data, starting fresh: {err}");
                Progress::default()
            }
        };
        log::info!(
            "progress loaded: level {} with {} xp",
            progress.level(),
            progress.xp()
        );

        Self {
            store,
            progress: Mutex::new(progress),
            flush_failures: AtomicUsize::new(0),
        }
    }

    /// Number of writes that failed since startup.
    #[must_use]
    pub fn flush_failures(&self) -> usize {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Apply `f` under the lock, then persist the result outside it.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Progress) -> T) -> T {
        let (out, blob) = {
            let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut progress);
            (out, progress.to_blob())
        };
        match blob {
            Ok(blob) => self.flush(&blob).await,
            Err(err) => {
                self.flush_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("could not serialize progress: {err}");
            }
        }
        out
    }

    async fn flush(&self, blob: &str) {
        if let Err(err) = self.store.save_blob(SAVE_KEY, blob).await {
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
            log::warn!("could not write save data: {err}");
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Progress) -> T) -> T {
        let progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        f(&progress)
    }

    /// Switch to an unlocked theme.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Progress` if the theme has not been unlocked.
    pub async fn set_theme(&self, id: &str) -> Result<(), LedgerError> {
        self.mutate(|p| p.set_theme(id)).await?;
        Ok(())
    }

    /// Unlock a theme. Returns `true` if it was not unlocked before.
    pub async fn unlock_theme(&self, id: &str) -> bool {
        self.mutate(|p| p.unlock_theme(id)).await
    }

    pub async fn set_current_quiz(&self, quiz: QuizFile) {
        self.mutate(|p| p.set_current_quiz(quiz)).await;
    }

    pub async fn set_voice_enabled(&self, enabled: bool) {
        self.mutate(|p| p.set_voice_enabled(enabled)).await;
    }

    #[must_use]
    pub fn current_quiz(&self) -> Option<QuizFile> {
        self.read(|p| p.current_quiz().cloned())
    }

    /// Discard all saved progress and restore defaults.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::ResetNotConfirmed` unless `confirmed` is set, or
    /// `LedgerError::Storage` if the blob could not be removed.
    pub async fn reset(&self, confirmed: bool) -> Result<(), LedgerError> {
        if !confirmed {
            return Err(LedgerError::ResetNotConfirmed);
        }
        self.store.remove_blob(SAVE_KEY).await?;
        *self.progress.lock().unwrap_or_else(PoisonError::into_inner) = Progress::default();
        log::info!("progress reset to defaults");
        Ok(())
    }
}

#[async_trait]
impl Ledger for ProgressLedger {
    async fn award_xp(&self, base: u32, streak: u32) -> XpAward {
        let award = self.mutate(|p| p.award_xp(base, streak)).await;
        if let Some(level_up) = &award.level_up {
            log::info!("reached level {} ({})", level_up.level, level_up.title);
        }
        award
    }

    async fn bump_mastery(&self, quiz: &QuizFile, id: &QuestionId, correct: bool) -> u8 {
        self.mutate(|p| p.mastery_mut().bump(quiz, id, correct))
            .await
    }

    async fn override_mastery(&self, quiz: &QuizFile, id: &QuestionId, delta: i8) -> u8 {
        self.mutate(|p| p.mastery_mut().apply_delta(quiz, id, delta))
            .await
    }

    async fn increment_correct(&self) {
        self.mutate(Progress::record_correct).await;
    }

    async fn increment_wrong(&self) {
        self.mutate(Progress::record_wrong).await;
    }

    async fn undo_wrong(&self) {
        self.mutate(Progress::undo_wrong).await;
    }

    async fn add_badge(&self, id: &str) -> bool {
        self.mutate(|p| p.add_badge(id)).await
    }

    async fn add_sticker(&self, quiz: &QuizFile, sticker: &str) -> bool {
        self.mutate(|p| p.add_sticker(quiz, sticker)).await
    }

    async fn snapshot(&self) -> Progress {
        self.read(Progress::clone)
    }
}
