use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::levels::{self, DEFAULT_THEME, LevelInfo};
use crate::model::ids::QuizFile;
use crate::model::mastery::MasteryRecord;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("theme '{0}' is not unlocked")]
    ThemeLocked(String),
}

//
// ─── XP AWARD ──────────────────────────────────────────────────────────────────
//

/// Level reached by an XP award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub title: &'static str,
    /// Set only when this level-up unlocked a theme the player did not own.
    pub unlocked_theme: Option<String>,
}

/// Outcome of `Progress::award_xp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpAward {
    pub earned: u32,
    pub total_xp: u64,
    pub level_up: Option<LevelUp>,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Everything that survives between sessions.
///
/// Serialized as one camelCase JSON blob. Every field has a default, so a
/// blob written by an older build merges cleanly over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    xp: u64,
    level: u32,
    total_correct: u64,
    total_wrong: u64,
    unlocked_themes: Vec<String>,
    current_theme: String,
    current_quiz: Option<QuizFile>,
    mastery: MasteryRecord,
    stickers: BTreeMap<QuizFile, Vec<String>>,
    earned_badges: Vec<String>,
    voice_enabled: bool,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            total_correct: 0,
            total_wrong: 0,
            unlocked_themes: vec![DEFAULT_THEME.to_owned()],
            current_theme: DEFAULT_THEME.to_owned(),
            current_quiz: None,
            mastery: MasteryRecord::default(),
            stickers: BTreeMap::new(),
            earned_badges: Vec::new(),
            voice_enabled: false,
        }
    }
}

impl Progress {
    /// Parse a saved blob, filling any missing keys from the defaults.
    ///
    /// The level is re-derived from XP so a hand-edited blob cannot disagree
    /// with the threshold table.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the blob is not a valid progress object.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        let mut progress: Self = serde_json::from_str(blob)?;
        progress.level = levels::level_for_xp(progress.xp);
        if !progress
            .unlocked_themes
            .iter()
            .any(|theme| theme == DEFAULT_THEME)
        {
            progress.unlocked_themes.insert(0, DEFAULT_THEME.to_owned());
        }
        if !progress.has_theme(&progress.current_theme) {
            progress.current_theme = DEFAULT_THEME.to_owned();
        }
        Ok(progress)
    }

    /// Serialize to the saved blob format.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    // Accessors
    #[must_use]
    pub fn xp(&self) -> u64 {
        self.xp
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn level_info(&self) -> LevelInfo {
        levels::level_info(self.level)
    }

    #[must_use]
    pub fn total_correct(&self) -> u64 {
        self.total_correct
    }

    #[must_use]
    pub fn total_wrong(&self) -> u64 {
        self.total_wrong
    }

    #[must_use]
    pub fn unlocked_themes(&self) -> &[String] {
        &self.unlocked_themes
    }

    #[must_use]
    pub fn current_theme(&self) -> &str {
        &self.current_theme
    }

    #[must_use]
    pub fn current_quiz(&self) -> Option<&QuizFile> {
        self.current_quiz.as_ref()
    }

    #[must_use]
    pub fn mastery(&self) -> &MasteryRecord {
        &self.mastery
    }

    pub fn mastery_mut(&mut self) -> &mut MasteryRecord {
        &mut self.mastery
    }

    #[must_use]
    pub fn stickers(&self, quiz: &QuizFile) -> &[String] {
        self.stickers.get(quiz).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn earned_badges(&self) -> &[String] {
        &self.earned_badges
    }

    #[must_use]
    pub fn has_badge(&self, id: &str) -> bool {
        self.earned_badges.iter().any(|badge| badge == id)
    }

    #[must_use]
    pub fn has_theme(&self, id: &str) -> bool {
        self.unlocked_themes.iter().any(|theme| theme == id)
    }

    #[must_use]
    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    // Mutators

    /// Add XP for a correct answer at the given streak and re-derive the level.
    ///
    /// Crossing into a level that defines a theme unlocks it once.
    pub fn award_xp(&mut self, base: u32, streak: u32) -> XpAward {
        let earned = levels::xp_bonus(base, streak);
        let old_level = self.level;
        self.xp = self.xp.saturating_add(u64::from(earned));
        self.level = levels::level_for_xp(self.xp);

        let level_up = (self.level > old_level).then(|| {
            let info = levels::level_info(self.level);
            let unlocked_theme = info
                .unlock_theme
                .filter(|theme| self.unlock_theme(theme))
                .map(str::to_owned);
            LevelUp {
                level: info.level,
                title: info.title,
                unlocked_theme,
            }
        });

        XpAward {
            earned,
            total_xp: self.xp,
            level_up,
        }
    }

    pub fn record_correct(&mut self) {
        self.total_correct = self.total_correct.saturating_add(1);
    }

    pub fn record_wrong(&mut self) {
        self.total_wrong = self.total_wrong.saturating_add(1);
    }

    /// Turn one recorded wrong answer into a correct one.
    pub fn undo_wrong(&mut self) {
        self.total_wrong = self.total_wrong.saturating_sub(1);
        self.total_correct = self.total_correct.saturating_add(1);
    }

    /// Returns `true` if the theme was newly unlocked.
    pub fn unlock_theme(&mut self, id: &str) -> bool {
        if self.has_theme(id) {
            return false;
        }
        self.unlocked_themes.push(id.to_owned());
        true
    }

    /// Switch the active theme.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ThemeLocked` if the theme has not been unlocked.
    pub fn set_theme(&mut self, id: &str) -> Result<(), ProgressError> {
        if !self.has_theme(id) {
            return Err(ProgressError::ThemeLocked(id.to_owned()));
        }
        id.clone_into(&mut self.current_theme);
        Ok(())
    }

    /// Returns `true` if the badge was newly earned.
    pub fn add_badge(&mut self, id: &str) -> bool {
        if self.has_badge(id) {
            return false;
        }
        self.earned_badges.push(id.to_owned());
        true
    }

    /// Returns `true` if the sticker was new for this quiz file.
    pub fn add_sticker(&mut self, quiz: &QuizFile, sticker: &str) -> bool {
        let owned = self.stickers.entry(quiz.clone()).or_default();
        if owned.iter().any(|s| s == sticker) {
            return false;
        }
        owned.push(sticker.to_owned());
        true
    }

    pub fn set_current_quiz(&mut self, quiz: QuizFile) {
        self.current_quiz = Some(quiz);
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_level_one_with_default_theme() {
        let progress = Progress::default();
        assert_eq!(progress.level(), 1);
        assert_eq!(progress.unlocked_themes(), ["default".to_owned()]);
        assert_eq!(progress.current_theme(), "default");
    }

    #[test]
    fn partial_blob_merges_over_defaults() {
        let progress = Progress::from_blob(r#"{"xp": 260, "totalCorrect": 12}"#).unwrap();
        assert_eq!(progress.xp(), 260);
        assert_eq!(progress.level(), 3);
        assert_eq!(progress.total_correct(), 12);
        assert_eq!(progress.total_wrong(), 0);
        assert!(progress.has_theme("default"));
        assert!(!progress.voice_enabled());
    }

    #[test]
    fn blob_round_trips_camel_case_keys() {
        let mut progress = Progress::default();
        progress.record_wrong();
        progress.set_voice_enabled(true);
        let blob = progress.to_blob().unwrap();
        assert!(blob.contains("\"totalWrong\":1"));
        assert!(blob.contains("\"voiceEnabled\":true"));
        assert_eq!(Progress::from_blob(&blob).unwrap(), progress);
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        assert!(Progress::from_blob("{not json").is_err());
        assert!(Progress::from_blob(r#"{"xp": -4}"#).is_err());
    }

    #[test]
    fn level_up_unlocks_theme_once() {
        let mut progress = Progress::default();
        let mut last = None;
        for _ in 0..10 {
            last = Some(progress.award_xp(10, 1));
        }
        let award = last.unwrap();
        assert_eq!(award.total_xp, 100);
        let level_up = award.level_up.unwrap();
        assert_eq!(level_up.level, 2);
        assert_eq!(level_up.unlocked_theme.as_deref(), Some("ocean"));
        assert!(progress.has_theme("ocean"));

        let award = progress.award_xp(10, 1);
        assert!(award.level_up.is_none());
    }

    #[test]
    fn locked_theme_cannot_be_selected() {
        let mut progress = Progress::default();
        let err = progress.set_theme("galaxy").unwrap_err();
        assert_eq!(err, ProgressError::ThemeLocked("galaxy".into()));
        progress.unlock_theme("galaxy");
        progress.set_theme("galaxy").unwrap();
        assert_eq!(progress.current_theme(), "galaxy");
    }

    #[test]
    fn badges_and_stickers_are_idempotent() {
        let mut progress = Progress::default();
        assert!(progress.add_badge("first_correct"));
        assert!(!progress.add_badge("first_correct"));
        assert_eq!(progress.earned_badges().len(), 1);

        let quiz = QuizFile::new("q.json");
        assert!(progress.add_sticker(&quiz, "🦊"));
        assert!(!progress.add_sticker(&quiz, "🦊"));
        assert_eq!(progress.stickers(&quiz), ["🦊".to_owned()]);
    }

    #[test]
    fn undo_wrong_swaps_totals() {
        let mut progress = Progress::default();
        progress.record_wrong();
        progress.undo_wrong();
        assert_eq!(progress.total_wrong(), 0);
        assert_eq!(progress.total_correct(), 1);
    }
}
