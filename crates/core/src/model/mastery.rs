use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{QuestionId, QuizFile};

/// Highest mastery a question can reach; shown as a star.
pub const MAX_MASTERY: u8 = 5;

/// Sampling weight for a question at the given mastery.
///
/// Mastery 0 weighs 5, mastery 5 weighs 1; never below 1 so every question
/// stays in the weighted pool.
#[must_use]
pub fn weight_for(mastery: u8) -> u32 {
    u32::from(MAX_MASTERY.saturating_sub(mastery)).max(1)
}

/// Star strip for a mastery value, e.g. `★★☆☆☆`.
#[must_use]
pub fn stars(mastery: u8) -> String {
    let filled = usize::from(mastery.min(MAX_MASTERY));
    let empty = usize::from(MAX_MASTERY) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Per-quiz-file mastery scores.
///
/// Absent entries read as 0 and every write is clamped to `0..=MAX_MASTERY`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasteryRecord(BTreeMap<QuizFile, BTreeMap<QuestionId, u8>>);

impl MasteryRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mastery for a question, 0 if never answered.
    #[must_use]
    pub fn get(&self, quiz: &QuizFile, id: &QuestionId) -> u8 {
        self.0
            .get(quiz)
            .and_then(|scores| scores.get(id))
            .copied()
            .unwrap_or(0)
            .min(MAX_MASTERY)
    }

    /// Move mastery one step up on a correct answer, one step down otherwise.
    pub fn bump(&mut self, quiz: &QuizFile, id: &QuestionId, correct: bool) -> u8 {
        self.apply_delta(quiz, id, if correct { 1 } else { -1 })
    }

    /// Add `delta` to the current mastery, clamped. Returns the new value.
    pub fn apply_delta(&mut self, quiz: &QuizFile, id: &QuestionId, delta: i8) -> u8 {
        let current = i16::from(self.get(quiz, id));
        let next = (current + i16::from(delta)).clamp(0, i16::from(MAX_MASTERY));
        // clamped into 0..=5 above
        let next = u8::try_from(next).unwrap_or(0);
        self.0
            .entry(quiz.clone())
            .or_default()
            .insert(id.clone(), next);
        next
    }

    #[must_use]
    pub fn weight(&self, quiz: &QuizFile, id: &QuestionId) -> u32 {
        weight_for(self.get(quiz, id))
    }

    /// Number of the given questions sitting at full mastery.
    #[must_use]
    pub fn mastered_count<'a>(
        &self,
        quiz: &QuizFile,
        ids: impl IntoIterator<Item = &'a QuestionId>,
    ) -> usize {
        ids.into_iter()
            .filter(|id| self.get(quiz, id) >= MAX_MASTERY)
            .count()
    }
}
