//! Badge rules, streak milestones and the sticker pool.

use crate::model::{CompletionReason, Mode, SessionSummary};

/// Streak lengths that fire a milestone reward.
pub const STREAK_MILESTONES: [u32; 8] = [3, 5, 7, 10, 15, 20, 25, 30];

#[must_use]
pub fn is_streak_milestone(streak: u32) -> bool {
    STREAK_MILESTONES.contains(&streak)
}

/// Stickers handed out for finished quizzes.
pub const STICKERS: [&str; 12] = [
    "🦊", "🐢", "🦉", "🐙", "🦄", "🐝", "🌵", "🍉", "🚀", "🎈", "🧩", "🌈",
];

/// Pick a sticker the player does not own yet.
///
/// `roll` is any random number; it selects among the unowned stickers.
#[must_use]
pub fn pick_sticker(owned: &[String], roll: usize) -> Option<&'static str> {
    let unowned: Vec<&'static str> = STICKERS
        .iter()
        .copied()
        .filter(|s| !owned.iter().any(|o| o == s))
        .collect();
    if unowned.is_empty() {
        return None;
    }
    Some(unowned[roll % unowned.len()])
}

/// Lines appended to wrong-answer feedback.
pub const ENCOURAGEMENTS: [&str; 6] = [
    "You've got this! 💪",
    "Keep trying! 🌟",
    "Almost there! 🎯",
    "Don't give up! 🚀",
    "Learning is fun! 📚",
    "You're doing great! ⭐",
];

/// `roll` is any random number.
#[must_use]
pub fn encouragement(roll: usize) -> &'static str {
    ENCOURAGEMENTS[roll % ENCOURAGEMENTS.len()]
}

/// Whether a finished session earns a sticker for its quiz file.
#[must_use]
pub fn earns_sticker(summary: &SessionSummary) -> bool {
    match (summary.mode, summary.reason) {
        (Mode::Boss, CompletionReason::BossCleared) => summary.correct > 0,
        (Mode::Practice, CompletionReason::Exhausted) => summary.wrong == 0 && summary.correct > 0,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Badge {
    FirstCorrect,
    StreakFive,
    StreakTen,
    Scholar,
    Champion,
    BossSlayer,
    PerfectStreak,
    ChallengePlayed,
}

impl Badge {
    /// Stable id stored in the save blob.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Badge::FirstCorrect => "first_correct",
            Badge::StreakFive => "streak_5",
            Badge::StreakTen => "streak_10",
            Badge::Scholar => "level_3",
            Badge::Champion => "level_6",
            Badge::BossSlayer => "boss_slayer",
            Badge::PerfectStreak => "perfect_streak",
            Badge::ChallengePlayed => "challenge_played",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Badge::FirstCorrect => "First Steps",
            Badge::StreakFive => "On Fire",
            Badge::StreakTen => "Unstoppable",
            Badge::Scholar => "Scholar",
            Badge::Champion => "Champion",
            Badge::BossSlayer => "Boss Slayer",
            Badge::PerfectStreak => "Flawless",
            Badge::ChallengePlayed => "Friendly Rival",
        }
    }

    /// Badges unlocked by a correct answer at `streak`.
    #[must_use]
    pub fn on_correct(streak: u32) -> Vec<Badge> {
        let mut earned = vec![Badge::FirstCorrect];
        if streak >= 5 {
            earned.push(Badge::StreakFive);
        }
        if streak >= 10 {
            earned.push(Badge::StreakTen);
        }
        earned
    }

    /// Badge unlocked by reaching `level`, if any.
    #[must_use]
    pub fn on_level(level: u32) -> Option<Badge> {
        match level {
            3 => Some(Badge::Scholar),
            6 => Some(Badge::Champion),
            _ => None,
        }
    }

    /// Badges unlocked by finishing a session. A session with no answers
    /// earns nothing.
    #[must_use]
    pub fn on_completion(summary: &SessionSummary) -> Vec<Badge> {
        if summary.correct + summary.wrong == 0 {
            return Vec::new();
        }
        match (summary.mode, summary.reason) {
            (Mode::Boss, CompletionReason::BossCleared) => vec![Badge::BossSlayer],
            (Mode::Streak, CompletionReason::Exhausted) if summary.wrong == 0 => {
                vec![Badge::PerfectStreak]
            }
            (Mode::Challenge, _) => vec![Badge::ChallengePlayed],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn summary(mode: Mode, reason: CompletionReason, correct: u32, wrong: u32) -> SessionSummary {
        SessionSummary {
            mode,
            reason,
            score: correct * 10,
            correct,
            wrong,
            total_xp: 0,
            mastered: 0,
            total_questions: 5,
            boss: None,
            challenge: None,
            started_at: fixed_now(),
            completed_at: fixed_now(),
        }
    }

    #[test]
    fn milestones_are_the_fixed_thresholds() {
        assert!(is_streak_milestone(3));
        assert!(is_streak_milestone(30));
        assert!(!is_streak_milestone(4));
        assert!(!is_streak_milestone(31));
    }

    #[test]
    fn encouragement_wraps_any_roll() {
        assert_eq!(encouragement(0), ENCOURAGEMENTS[0]);
        assert_eq!(encouragement(ENCOURAGEMENTS.len() + 2), ENCOURAGEMENTS[2]);
    }

    #[test]
    fn sticker_pick_skips_owned() {
        let owned: Vec<String> = STICKERS[1..].iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(pick_sticker(&owned, 99), Some(STICKERS[0]));

        let all: Vec<String> = STICKERS.iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(pick_sticker(&all, 0), None);
    }

    #[test]
    fn sticker_rules() {
        assert!(earns_sticker(&summary(Mode::Boss, CompletionReason::BossCleared, 3, 2)));
        assert!(earns_sticker(&summary(Mode::Practice, CompletionReason::Exhausted, 5, 0)));
        assert!(!earns_sticker(&summary(Mode::Practice, CompletionReason::Exhausted, 4, 1)));
        assert!(!earns_sticker(&summary(Mode::Streak, CompletionReason::Exhausted, 5, 0)));
    }

    #[test]
    fn empty_sessions_earn_nothing() {
        for mode in [Mode::Boss, Mode::Challenge, Mode::Streak, Mode::Practice] {
            let reason = if mode == Mode::Boss {
                CompletionReason::BossCleared
            } else {
                CompletionReason::Exhausted
            };
            let empty = summary(mode, reason, 0, 0);
            assert!(!earns_sticker(&empty), "{mode}");
            assert!(Badge::on_completion(&empty).is_empty(), "{mode}");
        }
        assert_eq!(
            Badge::on_completion(&summary(Mode::Challenge, CompletionReason::Exhausted, 0, 1)),
            [Badge::ChallengePlayed]
        );
    }

    #[test]
    fn badge_rules() {
        assert_eq!(Badge::on_correct(1), [Badge::FirstCorrect]);
        assert_eq!(
            Badge::on_correct(10),
            [Badge::FirstCorrect, Badge::StreakFive, Badge::StreakTen]
        );
        assert_eq!(Badge::on_level(3), Some(Badge::Scholar));
        assert_eq!(Badge::on_level(4), None);
        assert_eq!(
            Badge::on_completion(&summary(Mode::Streak, CompletionReason::Exhausted, 5, 0)),
            [Badge::PerfectStreak]
        );
        assert!(
            Badge::on_completion(&summary(Mode::Streak, CompletionReason::StreakOver, 5, 2))
                .is_empty()
        );
    }
}
