use quiz_core::model::mastery::stars;
use quiz_core::model::{MAX_MASTERY, Mode, Player, QuestionId, QuestionKind, SessionSummary};

//
// ─── QUESTION VIEW ─────────────────────────────────────────────────────────────
//

/// What the presentation layer needs to render the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Order items in the shuffled order they should be shown. Empty for
    /// other kinds.
    pub order_items: Vec<String>,
    pub mastery: u8,
    /// 1-based position within the current pass.
    pub number: usize,
    pub total: usize,
    /// Whose turn it is in a challenge.
    pub player: Option<Player>,
}

impl QuestionView {
    #[must_use]
    pub fn starred(&self) -> bool {
        self.mastery >= MAX_MASTERY
    }

    #[must_use]
    pub fn stars(&self) -> String {
        stars(self.mastery)
    }
}

/// Result of submitting an answer or accepting a near miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub xp_earned: u32,
    pub message: String,
    /// Mastery of the question after this answer.
    pub mastery: u8,
    pub close_enough_available: bool,
    /// Set when this answer ended the session.
    pub summary: Option<SessionSummary>,
}

/// What happened when the engine moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Question(QuestionView),
    /// The pass ran out and the skipped questions are coming back.
    ReviewSkipped {
        count: usize,
        question: QuestionView,
    },
    Complete(SessionSummary),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Counters for a status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub mode: Mode,
    pub score: u32,
    pub streak: u32,
    pub misses: u32,
    pub position: usize,
    pub total: usize,
    pub boss_correct: u32,
    pub boss_attempts: u32,
    pub player: Option<Player>,
    pub challenge_scores: (u32, u32),
    pub reviewing_skipped: bool,
    pub complete: bool,
}

impl SessionProgress {
    /// Misses allowed before a streak run ends.
    pub const STREAK_LIVES: u32 = 2;

    /// Mode-specific counter: misses in streak, mastered in boss, position otherwise.
    #[must_use]
    pub fn counter_label(&self) -> String {
        match self.mode {
            Mode::Streak => format!("Misses: {}/{}", self.misses, Self::STREAK_LIVES),
            Mode::Boss => format!("Mastered: {}/{}", self.boss_correct, self.total),
            _ => format!("Q: {}/{}", self.position.min(self.total), self.total),
        }
    }

    #[must_use]
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "Score: {}  Streak: {}  {}",
            self.score,
            self.streak,
            self.counter_label()
        );
        if let Some(player) = self.player {
            let (one, two) = self.challenge_scores;
            line.push_str(&format!("  P1 {one} vs P2 {two}  (Player {} up)", player.number()));
        }
        line
    }
}

//
// ─── STUDY CARD ────────────────────────────────────────────────────────────────
//

/// One flashcard in study mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyCard {
    pub id: QuestionId,
    pub label: &'static str,
    pub prompt: String,
    pub answer: String,
    pub revealed: bool,
    pub mastery: u8,
    /// 0-based card index.
    pub index: usize,
    pub total: usize,
}

impl StudyCard {
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }

    #[must_use]
    pub fn stars(&self) -> String {
        stars(self.mastery)
    }

    #[must_use]
    pub fn position_label(&self) -> String {
        format!("Card {} of {}", self.index + 1, self.total)
    }
}
