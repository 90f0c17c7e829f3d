use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

use quiz_core::QuizContent;
use quiz_core::model::{MasteryRecord, Mode};

/// Most questions a two-player challenge draws.
pub const CHALLENGE_LENGTH: usize = 10;

/// Builds the opening question queue for a quiz mode.
///
/// Queues hold indices into `QuizContent::questions`.
pub struct QueuePlanner<'a> {
    content: &'a QuizContent,
    mastery: &'a MasteryRecord,
}

impl<'a> QueuePlanner<'a> {
    #[must_use]
    pub fn new(content: &'a QuizContent, mastery: &'a MasteryRecord) -> Self {
        Self { content, mastery }
    }

    /// Queue for `mode`. Study has no queue and gets an empty one.
    pub fn build<R: Rng + ?Sized>(&self, mode: Mode, rng: &mut R) -> VecDeque<usize> {
        match mode {
            Mode::Practice => self.weighted(rng),
            Mode::Streak | Mode::Boss => shuffled(self.content.len(), rng),
            Mode::Challenge => {
                let mut queue = shuffled(self.content.len(), rng);
                queue.truncate(CHALLENGE_LENGTH);
                queue
            }
            Mode::Study => VecDeque::new(),
        }
    }

    /// Each question repeated by its mastery weight, shuffled, then reduced
    /// to first occurrences. Weak questions tend to surface earlier.
    fn weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> VecDeque<usize> {
        let file = self.content.file();
        let mut pool: Vec<usize> = self
            .content
            .questions()
            .iter()
            .enumerate()
            .flat_map(|(idx, q)| {
                let weight = self.mastery.weight(file, q.id());
                std::iter::repeat_n(idx, usize::try_from(weight).unwrap_or(1))
            })
            .collect();
        pool.shuffle(rng);

        let mut seen = HashSet::new();
        pool.into_iter().filter(|idx| seen.insert(*idx)).collect()
    }
}

/// Every index in `0..len`, shuffled.
pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> VecDeque<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order.into()
}
