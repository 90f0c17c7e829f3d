use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

use quiz_core::achievements::is_streak_milestone;
use quiz_core::model::{Mode, Player, SessionSummary};

use super::view::SessionProgress;

/// Points added to the session score per correct answer.
pub const POINTS_PER_CORRECT: u32 = 10;

/// Where the current question stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for an answer or a skip.
    Asking,
    /// Answered; waiting for the player to move on.
    Answered { close_enough: bool },
    Complete(SessionSummary),
}

/// Next question chosen by `QuizState::draw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    Question(usize),
    /// A skipped-review pass of `count` questions began with this one.
    Review { index: usize, count: usize },
    Exhausted,
}

/// Counter changes from one scored answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub index: usize,
    pub streak: u32,
    pub milestone: bool,
}

/// Transient state of one quiz-mode run. Reset by every mode start.
#[derive(Debug, Clone)]
pub struct QuizState {
    pub mode: Mode,
    pub queue: VecDeque<usize>,
    pub boss_pool: Vec<usize>,
    pub skipped: Vec<usize>,
    pub current: Option<usize>,
    pub phase: Phase,
    pub score: u32,
    pub streak: u32,
    pub misses: u32,
    pub q_index: usize,
    pub total_qs: usize,
    pub correct: u32,
    pub wrong: u32,
    pub boss_correct: u32,
    pub boss_attempts: u32,
    pub player: Player,
    pub challenge_scores: (u32, u32),
    pub reviewing_skipped: bool,
    milestones: HashSet<u32>,
    pub started_at: DateTime<Utc>,
}

impl QuizState {
    #[must_use]
    pub fn new(
        mode: Mode,
        queue: VecDeque<usize>,
        question_count: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        let total_qs = if mode == Mode::Boss {
            question_count
        } else {
            queue.len()
        };
        Self {
            mode,
            queue,
            boss_pool: Vec::new(),
            skipped: Vec::new(),
            current: None,
            phase: Phase::Asking,
            score: 0,
            streak: 0,
            misses: 0,
            q_index: 0,
            total_qs,
            correct: 0,
            wrong: 0,
            boss_correct: 0,
            boss_attempts: 0,
            player: Player::One,
            challenge_scores: (0, 0),
            reviewing_skipped: false,
            milestones: HashSet::new(),
            started_at,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }

    #[must_use]
    pub fn summary(&self) -> Option<&SessionSummary> {
        match &self.phase {
            Phase::Complete(summary) => Some(summary),
            _ => None,
        }
    }

    /// Pick the next question.
    ///
    /// Boss mode drains the main queue before the missed pool, which is
    /// reshuffled on every draw. Other modes fall back to one review pass over
    /// skipped questions once their queue is empty; anything skipped during
    /// that pass is dropped.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Draw {
        if self.current.take().is_some() && self.mode == Mode::Challenge {
            self.player = self.player.other();
        }

        let next = if self.mode == Mode::Boss {
            match self.queue.pop_front() {
                Some(idx) => Some(idx),
                None if self.boss_pool.is_empty() => None,
                None => {
                    self.boss_pool.shuffle(rng);
                    Some(self.boss_pool.remove(0))
                }
            }
        } else {
            self.queue.pop_front()
        };

        let (next, review) = match next {
            Some(idx) => (Some(idx), None),
            None if !self.skipped.is_empty() && !self.reviewing_skipped => {
                let mut pending = std::mem::take(&mut self.skipped);
                pending.shuffle(rng);
                self.queue = pending.into();
                self.total_qs = self.queue.len();
                self.q_index = 0;
                self.reviewing_skipped = true;
                (self.queue.pop_front(), Some(self.total_qs))
            }
            None => (None, None),
        };

        let Some(index) = next else {
            return Draw::Exhausted;
        };
        self.current = Some(index);
        self.q_index += 1;
        self.phase = Phase::Asking;
        match review {
            Some(count) => Draw::Review { index, count },
            None => Draw::Question(index),
        }
    }

    /// Set the current question aside. Boss mode defers it to the missed pool.
    pub fn skip_current(&mut self) -> Option<usize> {
        let index = self.current?;
        if self.mode == Mode::Boss {
            self.boss_pool.push(index);
        } else {
            self.skipped.push(index);
        }
        Some(index)
    }

    /// Apply the session counters for a correct answer.
    pub fn score_correct(&mut self, index: usize) -> Scored {
        self.score += POINTS_PER_CORRECT;
        self.streak += 1;
        self.correct += 1;
        match self.mode {
            Mode::Boss => {
                self.boss_correct += 1;
                self.boss_attempts += 1;
            }
            Mode::Challenge => self.add_challenge_points(),
            _ => {}
        }
        self.scored(index)
    }

    /// Apply the session counters for a wrong answer. Returns `true` when
    /// this miss ends a streak run.
    pub fn score_wrong(&mut self, index: usize) -> bool {
        self.streak = 0;
        self.wrong += 1;
        match self.mode {
            Mode::Boss => {
                self.boss_pool.push(index);
                self.boss_attempts += 1;
                false
            }
            Mode::Streak => {
                self.misses += 1;
                self.misses >= SessionProgress::STREAK_LIVES
            }
            _ => false,
        }
    }

    /// Turn the last wrong answer into a correct one.
    ///
    /// `misses` and `boss_attempts` are left as they are.
    pub fn score_close_enough(&mut self, index: usize) -> Scored {
        self.score += POINTS_PER_CORRECT;
        self.streak += 1;
        self.correct += 1;
        self.wrong = self.wrong.saturating_sub(1);
        match self.mode {
            Mode::Boss => {
                if let Some(pos) = self.boss_pool.iter().position(|&i| i == index) {
                    self.boss_pool.remove(pos);
                }
                self.boss_correct += 1;
            }
            Mode::Challenge => self.add_challenge_points(),
            _ => {}
        }
        self.scored(index)
    }

    fn add_challenge_points(&mut self) {
        match self.player {
            Player::One => self.challenge_scores.0 += POINTS_PER_CORRECT,
            Player::Two => self.challenge_scores.1 += POINTS_PER_CORRECT,
        }
    }

    /// Milestones fire once per session per threshold.
    fn scored(&mut self, index: usize) -> Scored {
        let milestone = is_streak_milestone(self.streak) && self.milestones.insert(self.streak);
        Scored {
            index,
            streak: self.streak,
            milestone,
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            mode: self.mode,
            score: self.score,
            streak: self.streak,
            misses: self.misses,
            position: self.q_index,
            total: self.total_qs,
            boss_correct: self.boss_correct,
            boss_attempts: self.boss_attempts,
            player: (self.mode == Mode::Challenge).then_some(self.player),
            challenge_scores: self.challenge_scores,
            reviewing_skipped: self.reviewing_skipped,
            complete: self.is_complete(),
        }
    }
}

/// Flashcard cursor for study mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StudyState {
    pub index: usize,
    pub revealed: bool,
}

impl StudyState {
    /// Step to the next card, stopping at the last one.
    pub fn next(&mut self, total: usize) {
        if self.index + 1 < total {
            self.index += 1;
            self.revealed = false;
        }
    }

    /// Step back, stopping at the first card.
    pub fn prev(&mut self) {
        if self.index > 0 {
            self.index -= 1;
            self.revealed = false;
        }
    }

    pub fn toggle(&mut self) {
        self.revealed = !self.revealed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(mode: Mode, len: usize) -> QuizState {
        QuizState::new(mode, (0..len).collect(), len, fixed_now())
    }

    #[test]
    fn boss_drains_queue_before_missed_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = state(Mode::Boss, 3);

        assert_eq!(s.draw(&mut rng), Draw::Question(0));
        assert!(!s.score_wrong(0));
        assert_eq!(s.draw(&mut rng), Draw::Question(1));
        assert_eq!(s.draw(&mut rng), Draw::Question(2));
        assert_eq!(s.draw(&mut rng), Draw::Question(0));
        s.score_correct(0);
        assert_eq!(s.draw(&mut rng), Draw::Exhausted);
        assert_eq!((s.boss_correct, s.boss_attempts), (1, 2));
    }

    #[test]
    fn streak_ends_on_second_miss() {
        let mut s = state(Mode::Streak, 5);
        assert!(!s.score_wrong(0));
        s.score_correct(1);
        assert!(s.score_wrong(2));
        assert_eq!(s.misses, 2);
    }

    #[test]
    fn skipped_questions_come_back_in_a_review_pass() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = state(Mode::Practice, 2);

        assert_eq!(s.draw(&mut rng), Draw::Question(0));
        s.skip_current();
        assert_eq!(s.draw(&mut rng), Draw::Question(1));
        assert_eq!(s.draw(&mut rng), Draw::Review { index: 0, count: 1 });
        assert_eq!((s.q_index, s.total_qs), (1, 1));
        assert!(s.reviewing_skipped);
        assert_eq!(s.draw(&mut rng), Draw::Exhausted);
    }

    #[test]
    fn review_pass_runs_only_once() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = state(Mode::Practice, 1);

        assert_eq!(s.draw(&mut rng), Draw::Question(0));
        s.skip_current();
        assert_eq!(s.draw(&mut rng), Draw::Review { index: 0, count: 1 });
        s.skip_current();
        assert_eq!(s.draw(&mut rng), Draw::Exhausted);
    }

    #[test]
    fn challenge_toggles_player_on_each_transition() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = state(Mode::Challenge, 4);

        s.draw(&mut rng);
        assert_eq!(s.player, Player::One);
        s.score_correct(0);
        s.draw(&mut rng);
        assert_eq!(s.player, Player::Two);
        s.score_wrong(1);
        s.draw(&mut rng);
        assert_eq!(s.player, Player::One);
        s.score_correct(2);
        assert_eq!(s.challenge_scores, (20, 0));
    }

    #[test]
    fn milestones_fire_once_per_session() {
        let mut s = state(Mode::Practice, 10);
        s.score_correct(0);
        s.score_correct(1);
        assert!(s.score_correct(2).milestone);
        s.score_wrong(3);
        s.score_correct(4);
        s.score_correct(5);
        assert!(!s.score_correct(6).milestone);
    }

    #[test]
    fn close_enough_in_boss_clears_the_pool_entry() {
        let mut s = state(Mode::Boss, 2);
        s.score_wrong(1);
        assert_eq!(s.boss_pool, vec![1]);
        s.score_close_enough(1);
        assert!(s.boss_pool.is_empty());
        assert_eq!((s.boss_correct, s.boss_attempts), (1, 1));
        assert_eq!((s.correct, s.wrong), (1, 0));
    }

    #[test]
    fn study_cursor_stays_in_bounds() {
        let mut study = StudyState::default();
        study.prev();
        assert_eq!(study.index, 0);
        study.toggle();
        study.next(2);
        assert_eq!(study, StudyState { index: 1, revealed: false });
        study.next(2);
        assert_eq!(study.index, 1);
    }
}
