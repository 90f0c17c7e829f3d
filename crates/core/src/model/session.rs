use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Game mode selected by `start_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Weighted single pass with a skipped-question review.
    Practice,
    /// No skipping; the second miss ends the run.
    Streak,
    /// Missed questions come back until all are answered correctly.
    Boss,
    /// Flashcards, no scoring.
    Study,
    /// Two players alternate over up to ten questions.
    Challenge,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Practice => "practice",
            Mode::Streak => "streak",
            Mode::Boss => "boss",
            Mode::Study => "study",
            Mode::Challenge => "challenge",
        }
    }

    /// Whether the mode runs over a question queue.
    #[must_use]
    pub fn is_quiz(self) -> bool {
        !matches!(self, Mode::Study)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mode '{0}'")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Mode::Practice),
            "streak" => Ok(Mode::Streak),
            "boss" => Ok(Mode::Boss),
            "study" => Ok(Mode::Study),
            "challenge" => Ok(Mode::Challenge),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

//
// ─── CHALLENGE ─────────────────────────────────────────────────────────────────
//

/// One of the two challenge players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

/// Final comparison of the two challenge scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Winner(Player),
    Tie,
}

impl ChallengeOutcome {
    #[must_use]
    pub fn from_scores(player_one: u32, player_two: u32) -> Self {
        match player_one.cmp(&player_two) {
            std::cmp::Ordering::Greater => Self::Winner(Player::One),
            std::cmp::Ordering::Less => Self::Winner(Player::Two),
            std::cmp::Ordering::Equal => Self::Tie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeResult {
    pub player_one: u32,
    pub player_two: u32,
    pub outcome: ChallengeOutcome,
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every queued question was drawn.
    Exhausted,
    /// Second miss in streak mode.
    StreakOver,
    /// Boss queue and pool both drained.
    BossCleared,
}

/// Statistics reported when a quiz session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub mode: Mode,
    pub reason: CompletionReason,
    pub score: u32,
    pub correct: u32,
    pub wrong: u32,
    pub total_xp: u64,
    pub mastered: usize,
    pub total_questions: usize,
    /// `(boss_correct, boss_attempts)`, boss mode only.
    pub boss: Option<(u32, u32)>,
    pub challenge: Option<ChallengeResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Headline shown on the completion screen.
    #[must_use]
    pub fn headline(&self) -> String {
        match (self.mode, self.reason, self.challenge) {
            (_, CompletionReason::StreakOver, _) => {
                format!("Streak over! Final score: {}.", self.score)
            }
            (_, CompletionReason::BossCleared, _) => "Boss Battle complete!".to_owned(),
            (Mode::Challenge, _, Some(result)) => match result.outcome {
                ChallengeOutcome::Winner(player) => format!(
                    "Player {} wins {}–{}!",
                    player.number(),
                    result.player_one.max(result.player_two),
                    result.player_one.min(result.player_two)
                ),
                ChallengeOutcome::Tie => {
                    format!("It's a tie at {}!", result.player_one)
                }
            },
            _ => "Practice complete!".to_owned(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn summary(mode: Mode, reason: CompletionReason) -> SessionSummary {
        SessionSummary {
            mode,
            reason,
            score: 40,
            correct: 4,
            wrong: 2,
            total_xp: 120,
            mastered: 1,
            total_questions: 6,
            boss: None,
            challenge: None,
            started_at: fixed_now(),
            completed_at: fixed_now(),
        }
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Boss".parse::<Mode>().unwrap(), Mode::Boss);
        assert_eq!(" challenge ".parse::<Mode>().unwrap(), Mode::Challenge);
        assert!("arcade".parse::<Mode>().is_err());
        assert!(!Mode::Study.is_quiz());
    }

    #[test]
    fn challenge_outcome_compares_scores() {
        assert_eq!(
            ChallengeOutcome::from_scores(30, 20),
            ChallengeOutcome::Winner(Player::One)
        );
        assert_eq!(
            ChallengeOutcome::from_scores(0, 10),
            ChallengeOutcome::Winner(Player::Two)
        );
        assert_eq!(ChallengeOutcome::from_scores(10, 10), ChallengeOutcome::Tie);
        assert_eq!(Player::One.other(), Player::Two);
    }

    #[test]
    fn headline_reflects_reason() {
        let streak = summary(Mode::Streak, CompletionReason::StreakOver);
        assert_eq!(streak.headline(), "Streak over! Final score: 40.");

        let mut challenge = summary(Mode::Challenge, CompletionReason::Exhausted);
        challenge.challenge = Some(ChallengeResult {
            player_one: 20,
            player_two: 30,
            outcome: ChallengeOutcome::Winner(Player::Two),
        });
        assert_eq!(challenge.headline(), "Player 2 wins 30–20!");
    }
}
