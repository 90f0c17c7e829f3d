use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use quiz_core::achievements::{
    Badge, ENCOURAGEMENTS, STICKERS, earns_sticker, encouragement, pick_sticker,
};
use quiz_core::levels::BASE_XP;
use quiz_core::matching::{AnswerMatching, check_answer};
use quiz_core::model::{
    Answer, ChallengeOutcome, ChallengeResult, CompletionReason, Mode, QuestionKind,
    SessionSummary, XpAward,
};
use quiz_core::{Clock, QuizContent};

use crate::error::{SessionError, SoftRejection};
use crate::ledger::Ledger;
use crate::rewards::{RewardBus, RewardEvent};

use super::plan::QueuePlanner;
use super::state::{Draw, Phase, QuizState, Scored, StudyState};
use super::view::{Advance, AnswerFeedback, QuestionView, SessionProgress, StudyCard};

/// Mastery gained when a near miss is accepted (undoes the -1 and adds +1).
const CLOSE_ENOUGH_MASTERY_DELTA: i8 = 2;

enum Session {
    Quiz(QuizState),
    Study(StudyState),
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives one quiz session at a time over the loaded content.
///
/// The engine owns all transient session state. Persistent effects go through
/// the `Ledger`; celebrations go through the `RewardBus`.
pub struct SessionEngine {
    ledger: Arc<dyn Ledger>,
    rewards: RewardBus,
    clock: Clock,
    rng: StdRng,
    matching: AnswerMatching,
    content: Option<Arc<QuizContent>>,
    /// Mastery per question index, refreshed at mode start.
    mastery: Vec<u8>,
    /// Shuffled order items of the current question.
    presented_order: Vec<String>,
    session: Option<Session>,
}

impl SessionEngine {
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            rewards: RewardBus::new(),
            clock: Clock::default(),
            rng: StdRng::from_os_rng(),
            matching: AnswerMatching::default(),
            content: None,
            mastery: Vec::new(),
            presented_order: Vec::new(),
            session: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Use a deterministic shuffle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardBus) -> Self {
        self.rewards = rewards;
        self
    }

    #[must_use]
    pub fn with_matching(mut self, matching: AnswerMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Switch short-answer matching. Takes effect on the next submit.
    pub fn set_matching(&mut self, matching: AnswerMatching) {
        self.matching = matching;
    }

    #[must_use]
    pub fn matching(&self) -> AnswerMatching {
        self.matching
    }

    /// Install freshly loaded content. Any running session ends.
    pub fn load_content(&mut self, content: QuizContent) {
        self.content = Some(Arc::new(content));
        self.session = None;
        self.mastery.clear();
    }

    /// Forget the content, e.g. after a failed reload. Mode starts are
    /// rejected until new content arrives.
    pub fn unload_content(&mut self) {
        self.content = None;
        self.session = None;
        self.mastery.clear();
    }

    #[must_use]
    pub fn content(&self) -> Option<&QuizContent> {
        self.content.as_deref()
    }

    /// Mode of the running session, if one was started.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self.session.as_ref()? {
            Session::Quiz(state) => Some(state.mode),
            Session::Study(_) => Some(Mode::Study),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(&self.session, Some(Session::Quiz(state)) if state.is_complete())
    }

    #[must_use]
    pub fn summary(&self) -> Option<&SessionSummary> {
        match self.session.as_ref()? {
            Session::Quiz(state) => state.summary(),
            Session::Study(_) => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        match self.session.as_ref()? {
            Session::Quiz(state) => Some(state.progress()),
            Session::Study(_) => None,
        }
    }

    /// The question waiting for an answer or already answered, if any.
    #[must_use]
    pub fn current(&self) -> Option<QuestionView> {
        let Some(Session::Quiz(state)) = &self.session else {
            return None;
        };
        if state.is_complete() {
            return None;
        }
        self.view(state, state.current?)
    }

    fn view(&self, state: &QuizState, index: usize) -> Option<QuestionView> {
        let question = self.content.as_ref()?.questions().get(index)?;
        Some(QuestionView {
            id: question.id().clone(),
            prompt: question.prompt().to_owned(),
            kind: question.kind().clone(),
            order_items: self.presented_order.clone(),
            mastery: self.mastery.get(index).copied().unwrap_or(0),
            number: state.q_index,
            total: state.total_qs,
            player: (state.mode == Mode::Challenge).then_some(state.player),
        })
    }

    fn require_content(&self) -> Result<Arc<QuizContent>, SessionError> {
        self.content.clone().ok_or(SessionError::NoContent)
    }

    fn quiz_mut(&mut self) -> Result<&mut QuizState, SessionError> {
        match self.session.as_mut() {
            None => Err(SessionError::NotStarted),
            Some(Session::Study(_)) => Err(SessionError::WrongMode(Mode::Study)),
            Some(Session::Quiz(state)) => Ok(state),
        }
    }

    fn study_mut(&mut self) -> Result<&mut StudyState, SessionError> {
        match self.session.as_mut() {
            None => Err(SessionError::NotStarted),
            Some(Session::Quiz(state)) => Err(SessionError::WrongMode(state.mode)),
            Some(Session::Study(study)) => Ok(study),
        }
    }

    //
    // ─── MODE START ────────────────────────────────────────────────────────────
    //

    /// Start `mode` from scratch, discarding any running session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoContent` if no quiz is loaded.
    pub async fn start_mode(&mut self, mode: Mode) -> Result<(), SessionError> {
        let content = self.require_content()?;
        let progress = self.ledger.snapshot().await;
        let record = progress.mastery();
        self.mastery = content
            .ids()
            .map(|id| record.get(content.file(), id))
            .collect();
        self.presented_order.clear();

        log::info!(
            "starting {mode} mode on {} ({} questions)",
            content.file(),
            content.len()
        );

        if !mode.is_quiz() {
            self.session = Some(Session::Study(StudyState::default()));
            return Ok(());
        }

        let queue = QueuePlanner::new(&content, record).build(mode, &mut self.rng);
        self.session = Some(Session::Quiz(QuizState::new(
            mode,
            queue,
            content.len(),
            self.clock.now(),
        )));
        self.draw_next().await?;
        Ok(())
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Evaluate an answer to the current question.
    ///
    /// `None` means the player submitted without input: choice questions
    /// reject it softly, order questions submit the arrangement as shown and
    /// short answers are checked as empty text.
    ///
    /// # Errors
    ///
    /// Returns `SoftRejection::NoSelection` for an empty choice, or a
    /// `SessionError` if there is no question waiting for an answer.
    pub async fn submit(&mut self, answer: Option<Answer>) -> Result<AnswerFeedback, SessionError> {
        let content = self.require_content()?;
        let matching = self.matching;
        let shown_order = self.presented_order.clone();
        let state = self.quiz_mut()?;
        let index = match (&state.phase, state.current) {
            (Phase::Complete(_), _) => return Err(SessionError::Completed),
            (Phase::Asking, Some(index)) => index,
            _ => return Err(SessionError::NoActiveQuestion),
        };
        let question = &content.questions()[index];

        let answer = match (answer, question.kind()) {
            (Some(answer), _) => answer,
            (None, kind) if kind.is_choice_based() => {
                return Err(SoftRejection::NoSelection.into());
            }
            (None, QuestionKind::Order { .. }) => Answer::Order(shown_order),
            (None, _) => Answer::Text(String::new()),
        };

        if check_answer(question, &answer, matching) {
            let scored = state.score_correct(index);
            state.phase = Phase::Answered {
                close_enough: false,
            };
            let (award, mastery) = self.reward_correct(&content, scored, false).await;
            let mut message = format!("Correct! +{} XP", award.earned);
            if scored.streak >= 3 {
                message.push_str(&format!(" ({} streak!)", scored.streak));
            }
            return Ok(AnswerFeedback {
                correct: true,
                xp_earned: award.earned,
                message,
                mastery,
                close_enough_available: false,
                summary: None,
            });
        }

        let run_over = state.score_wrong(index);
        let close_enough =
            !run_over && matches!(question.kind(), QuestionKind::ShortAnswer { .. });
        state.phase = Phase::Answered { close_enough };

        self.ledger.increment_wrong().await;
        let mastery = self
            .ledger
            .bump_mastery(content.file(), question.id(), false)
            .await;
        self.set_mastery(index, mastery);
        self.rewards.emit(&RewardEvent::Wrong);

        let summary = if run_over {
            Some(self.finish(CompletionReason::StreakOver).await?)
        } else {
            None
        };
        let cheer = encouragement(self.rng.random_range(0..ENCOURAGEMENTS.len()));

        Ok(AnswerFeedback {
            correct: false,
            xp_earned: 0,
            message: format!("{} {cheer}", question.wrong_feedback()),
            mastery,
            close_enough_available: close_enough,
            summary,
        })
    }

    /// Accept the last wrong short answer as correct.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CloseEnoughUnavailable` unless the current
    /// question is a short answer that was just missed and not yet overridden.
    pub async fn close_enough(&mut self) -> Result<AnswerFeedback, SessionError> {
        let content = self.require_content()?;
        let state = self.quiz_mut()?;
        let index = match (&state.phase, state.current) {
            (Phase::Complete(_), _) => return Err(SessionError::Completed),
            (Phase::Answered { close_enough: true }, Some(index)) => index,
            _ => return Err(SessionError::CloseEnoughUnavailable),
        };

        let scored = state.score_close_enough(index);
        state.phase = Phase::Answered {
            close_enough: false,
        };
        self.ledger.undo_wrong().await;
        let (award, mastery) = self.reward_correct(&content, scored, true).await;

        Ok(AnswerFeedback {
            correct: true,
            xp_earned: award.earned,
            message: format!("Accepted! +{} XP", award.earned),
            mastery,
            close_enough_available: false,
            summary: None,
        })
    }

    /// Ledger and reward effects shared by a correct answer and an accepted
    /// near miss.
    async fn reward_correct(
        &mut self,
        content: &QuizContent,
        scored: Scored,
        overridden: bool,
    ) -> (XpAward, u8) {
        let id = content.questions()[scored.index].id();
        let award = self.ledger.award_xp(BASE_XP, scored.streak).await;
        self.ledger.increment_correct().await;
        let mastery = if overridden {
            self.ledger
                .override_mastery(content.file(), id, CLOSE_ENOUGH_MASTERY_DELTA)
                .await
        } else {
            self.ledger.bump_mastery(content.file(), id, true).await
        };
        self.set_mastery(scored.index, mastery);

        self.rewards.emit(&RewardEvent::Correct {
            streak: scored.streak,
        });
        if scored.milestone {
            self.rewards.emit(&RewardEvent::StreakMilestone {
                streak: scored.streak,
            });
        }
        if let Some(level_up) = &award.level_up {
            self.rewards.emit(&RewardEvent::LevelUp {
                level: level_up.level,
                unlocked_theme: level_up.unlocked_theme.clone(),
            });
            if let Some(badge) = Badge::on_level(level_up.level) {
                self.grant_badge(badge).await;
            }
        }
        for badge in Badge::on_correct(scored.streak) {
            self.grant_badge(badge).await;
        }
        (award, mastery)
    }

    fn set_mastery(&mut self, index: usize, mastery: u8) {
        if let Some(slot) = self.mastery.get_mut(index) {
            *slot = mastery;
        }
    }

    async fn grant_badge(&mut self, badge: Badge) {
        if self.ledger.add_badge(badge.id()).await {
            log::info!("badge earned: {}", badge.title());
            self.rewards.emit(&RewardEvent::BadgeEarned(badge));
        }
    }

    //
    // ─── MOVING ON ─────────────────────────────────────────────────────────────
    //

    /// Move past an answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` while the current question still
    /// waits for an answer, or `SessionError::Completed` after the end.
    pub async fn next(&mut self) -> Result<Advance, SessionError> {
        match self.quiz_mut()?.phase {
            Phase::Complete(_) => return Err(SessionError::Completed),
            Phase::Asking => return Err(SessionError::NotAnswered),
            Phase::Answered { .. } => {}
        }
        self.draw_next().await
    }

    /// Set the current question aside for later and move on.
    ///
    /// # Errors
    ///
    /// Returns `SoftRejection::SkipNotAllowed` in streak mode, or a
    /// `SessionError` if no question is waiting for an answer.
    pub async fn skip(&mut self) -> Result<Advance, SessionError> {
        let state = self.quiz_mut()?;
        match state.phase {
            Phase::Complete(_) => return Err(SessionError::Completed),
            Phase::Answered { .. } => return Err(SessionError::NoActiveQuestion),
            Phase::Asking => {}
        }
        if state.mode == Mode::Streak {
            return Err(SoftRejection::SkipNotAllowed.into());
        }
        if let Some(index) = state.skip_current() {
            log::debug!("skipped question #{index}");
        }
        self.draw_next().await
    }

    async fn draw_next(&mut self) -> Result<Advance, SessionError> {
        let content = self.require_content()?;
        let draw = {
            let Some(Session::Quiz(state)) = self.session.as_mut() else {
                return Err(SessionError::NotStarted);
            };
            state.draw(&mut self.rng)
        };

        let (index, review) = match draw {
            Draw::Question(index) => (index, None),
            Draw::Review { index, count } => {
                log::info!("reviewing {count} skipped question(s)");
                (index, Some(count))
            }
            Draw::Exhausted => {
                let reason = if self.mode() == Some(Mode::Boss) {
                    CompletionReason::BossCleared
                } else {
                    CompletionReason::Exhausted
                };
                return Ok(Advance::Complete(self.finish(reason).await?));
            }
        };

        self.presented_order = match content.questions()[index].kind() {
            QuestionKind::Order { items, .. } => {
                let mut items = items.clone();
                items.shuffle(&mut self.rng);
                items
            }
            _ => Vec::new(),
        };
        log::debug!("drew question {}", content.questions()[index].id());

        let Some(Session::Quiz(state)) = &self.session else {
            return Err(SessionError::NotStarted);
        };
        let question = self
            .view(state, index)
            .ok_or(SessionError::NoActiveQuestion)?;
        Ok(match review {
            Some(count) => Advance::ReviewSkipped { count, question },
            None => Advance::Question(question),
        })
    }

    /// Close the session and hand out completion rewards.
    async fn finish(&mut self, reason: CompletionReason) -> Result<SessionSummary, SessionError> {
        let content = self.require_content()?;
        let completed_at = self.clock.now();
        let progress = self.ledger.snapshot().await;
        let state = self.quiz_mut()?;

        let summary = SessionSummary {
            mode: state.mode,
            reason,
            score: state.score,
            correct: state.correct,
            wrong: state.wrong,
            total_xp: progress.xp(),
            mastered: progress
                .mastery()
                .mastered_count(content.file(), content.ids()),
            total_questions: content.len(),
            boss: (state.mode == Mode::Boss).then_some((state.boss_correct, state.boss_attempts)),
            challenge: (state.mode == Mode::Challenge).then(|| {
                let (one, two) = state.challenge_scores;
                ChallengeResult {
                    player_one: one,
                    player_two: two,
                    outcome: ChallengeOutcome::from_scores(one, two),
                }
            }),
            started_at: state.started_at,
            completed_at,
        };
        state.phase = Phase::Complete(summary.clone());
        state.current = None;
        self.presented_order.clear();
        log::info!("session complete: {}", summary.headline());

        for badge in Badge::on_completion(&summary) {
            self.grant_badge(badge).await;
        }
        if earns_sticker(&summary) {
            let roll = self.rng.random_range(0..STICKERS.len());
            if let Some(sticker) = pick_sticker(progress.stickers(content.file()), roll)
                && self.ledger.add_sticker(content.file(), sticker).await
            {
                self.rewards
                    .emit(&RewardEvent::StickerEarned(sticker.to_owned()));
            }
        }
        Ok(summary)
    }

    //
    // ─── STUDY ─────────────────────────────────────────────────────────────────
    //

    /// The flashcard under the study cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` outside study mode, or
    /// `SessionError::NoActiveQuestion` when the quiz has no questions.
    pub fn study_card(&self) -> Result<StudyCard, SessionError> {
        let study = match &self.session {
            None => return Err(SessionError::NotStarted),
            Some(Session::Quiz(state)) => return Err(SessionError::WrongMode(state.mode)),
            Some(Session::Study(study)) => *study,
        };
        let content = self.content.as_ref().ok_or(SessionError::NoContent)?;
        let question = content
            .questions()
            .get(study.index)
            .ok_or(SessionError::NoActiveQuestion)?;
        Ok(StudyCard {
            id: question.id().clone(),
            label: question.kind().label(),
            prompt: question.prompt().to_owned(),
            answer: question.answer_text(),
            revealed: study.revealed,
            mastery: self.mastery.get(study.index).copied().unwrap_or(0),
            index: study.index,
            total: content.len(),
        })
    }

    /// # Errors
    ///
    /// See [`SessionEngine::study_card`].
    pub fn study_next(&mut self) -> Result<StudyCard, SessionError> {
        let total = self.content.as_ref().map_or(0, |c| c.len());
        self.study_mut()?.next(total);
        self.study_card()
    }

    /// # Errors
    ///
    /// See [`SessionEngine::study_card`].
    pub fn study_prev(&mut self) -> Result<StudyCard, SessionError> {
        self.study_mut()?.prev();
        self.study_card()
    }

    /// Show or hide the answer on the current card.
    ///
    /// # Errors
    ///
    /// See [`SessionEngine::study_card`].
    pub fn toggle_reveal(&mut self) -> Result<StudyCard, SessionError> {
        self.study_mut()?.toggle();
        self.study_card()
    }

    /// Leave study mode and start practice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` outside study mode.
    pub async fn finish_study(&mut self) -> Result<(), SessionError> {
        self.study_mut()?;
        self.start_mode(Mode::Practice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{Player, Progress, Question, QuestionId, QuizFile};
    use quiz_core::time::fixed_clock;
    use std::sync::Mutex;

    use crate::rewards::RewardLog;

    /// Ledger that keeps progress in memory and never fails.
    #[derive(Default)]
    struct StubLedger {
        progress: Mutex<Progress>,
    }

    impl StubLedger {
        fn with(f: impl FnOnce(&mut Progress)) -> Arc<Self> {
            let mut progress = Progress::default();
            f(&mut progress);
            Arc::new(Self {
                progress: Mutex::new(progress),
            })
        }

        fn progress(&self) -> Progress {
            self.progress.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Ledger for StubLedger {
        async fn award_xp(&self, base: u32, streak: u32) -> XpAward {
            self.progress.lock().unwrap().award_xp(base, streak)
        }

        async fn bump_mastery(&self, quiz: &QuizFile, id: &QuestionId, correct: bool) -> u8 {
            self.progress.lock().unwrap().mastery_mut().bump(quiz, id, correct)
        }

        async fn override_mastery(&self, quiz: &QuizFile, id: &QuestionId, delta: i8) -> u8 {
            self.progress
                .lock()
                .unwrap()
                .mastery_mut()
                .apply_delta(quiz, id, delta)
        }

        async fn increment_correct(&self) {
            self.progress.lock().unwrap().record_correct();
        }

        async fn increment_wrong(&self) {
            self.progress.lock().unwrap().record_wrong();
        }

        async fn undo_wrong(&self) {
            self.progress.lock().unwrap().undo_wrong();
        }

        async fn add_badge(&self, id: &str) -> bool {
            self.progress.lock().unwrap().add_badge(id)
        }

        async fn add_sticker(&self, quiz: &QuizFile, sticker: &str) -> bool {
            self.progress.lock().unwrap().add_sticker(quiz, sticker)
        }

        async fn snapshot(&self) -> Progress {
            self.progress()
        }
    }

    fn quiz_file() -> QuizFile {
        QuizFile::new("current.json")
    }

    fn question(id: &str, kind: QuestionKind) -> Question {
        Question::new(QuestionId::new(id), format!("prompt {id}"), kind)
    }

    fn true_false(id: &str) -> Question {
        question(id, QuestionKind::TrueFalse { answer: true })
    }

    fn short(id: &str, answer: &str) -> Question {
        question(
            id,
            QuestionKind::ShortAnswer {
                answer: answer.into(),
            },
        )
    }

    fn mixed_content() -> QuizContent {
        QuizContent::new(
            quiz_file(),
            Some("Biology".into()),
            None,
            vec![
                true_false("tf"),
                question(
                    "mc",
                    QuestionKind::MultipleChoice {
                        choices: vec!["Paris".into(), "Rome".into()],
                        answer: "Paris".into(),
                    },
                ),
                short("sa", "mitochondria"),
                question(
                    "ord",
                    QuestionKind::Order {
                        items: vec!["b".into(), "a".into(), "c".into()],
                        answer_order: vec!["a".into(), "b".into(), "c".into()],
                    },
                ),
            ],
        )
    }

    fn content_of(questions: Vec<Question>) -> QuizContent {
        QuizContent::new(quiz_file(), None, None, questions)
    }

    fn engine(content: QuizContent, ledger: Arc<StubLedger>) -> (SessionEngine, RewardLog) {
        let log = RewardLog::new();
        let mut engine = SessionEngine::new(ledger)
            .with_clock(fixed_clock())
            .with_seed(42)
            .with_rewards(RewardBus::new().with_hook(Arc::new(log.clone())));
        engine.load_content(content);
        (engine, log)
    }

    fn right(view: &QuestionView) -> Answer {
        match &view.kind {
            QuestionKind::MultipleChoice { answer, .. } => Answer::Choice(answer.clone()),
            QuestionKind::TrueFalse { answer } => Answer::Bool(*answer),
            QuestionKind::ShortAnswer { answer } => Answer::Text(answer.clone()),
            QuestionKind::Order { answer_order, .. } => Answer::Order(answer_order.clone()),
        }
    }

    fn wrong(view: &QuestionView) -> Answer {
        match &view.kind {
            QuestionKind::MultipleChoice { choices, answer } => {
                let other = choices.iter().find(|c| *c != answer).unwrap();
                Answer::Choice(other.clone())
            }
            QuestionKind::TrueFalse { answer } => Answer::Bool(!answer),
            QuestionKind::ShortAnswer { .. } => Answer::Text("zzz".into()),
            QuestionKind::Order { answer_order, .. } => {
                Answer::Order(answer_order.iter().rev().cloned().collect())
            }
        }
    }

    #[tokio::test]
    async fn mode_start_needs_content() {
        let mut engine = SessionEngine::new(Arc::new(StubLedger::default()));
        let err = engine.start_mode(Mode::Practice).await.unwrap_err();
        assert_eq!(err, SessionError::NoContent);
        assert_eq!(engine.mode(), None);

        engine.load_content(mixed_content());
        engine.unload_content();
        let err = engine.start_mode(Mode::Boss).await.unwrap_err();
        assert_eq!(err, SessionError::NoContent);
    }

    #[tokio::test]
    async fn perfect_practice_run_completes_with_rewards() {
        let ledger = Arc::new(StubLedger::default());
        let (mut engine, log) = engine(mixed_content(), Arc::clone(&ledger));
        engine.start_mode(Mode::Practice).await.unwrap();

        let mut seen = Vec::new();
        let summary = loop {
            let view = engine.current().unwrap();
            seen.push(view.id.clone());
            if let QuestionKind::Order { items, .. } = &view.kind {
                let mut shown = view.order_items.clone();
                shown.sort();
                let mut expected = items.clone();
                expected.sort();
                assert_eq!(shown, expected);
            }
            let feedback = engine.submit(Some(right(&view))).await.unwrap();
            assert!(feedback.correct);
            match engine.next().await.unwrap() {
                Advance::Question(_) => {}
                Advance::Complete(summary) => break summary,
                Advance::ReviewSkipped { .. } => panic!("nothing was skipped"),
            }
        };

        seen.sort();
        assert_eq!(seen.len(), 4);
        assert_eq!(summary.reason, CompletionReason::Exhausted);
        assert_eq!((summary.correct, summary.wrong, summary.score), (4, 0, 40));
        assert_eq!(summary.total_xp, 10 + 15 + 20 + 25);
        assert_eq!(summary.headline(), "Practice complete!");

        let progress = ledger.progress();
        assert_eq!(progress.total_correct(), 4);
        assert_eq!(progress.stickers(&quiz_file()).len(), 1);
        assert!(progress.has_badge(Badge::FirstCorrect.id()));

        let events = log.drain();
        let milestones: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RewardEvent::StreakMilestone { .. }))
            .collect();
        assert_eq!(milestones, [&RewardEvent::StreakMilestone { streak: 3 }]);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, RewardEvent::StickerEarned(_)))
        );
        assert!(engine.is_complete());
        assert_eq!(engine.current(), None);
    }

    #[tokio::test]
    async fn streak_run_ends_on_second_miss() {
        let ledger = Arc::new(StubLedger::default());
        let (mut engine, _log) = engine(mixed_content(), Arc::clone(&ledger));
        engine.start_mode(Mode::Streak).await.unwrap();

        let view = engine.current().unwrap();
        let first = engine.submit(Some(wrong(&view))).await.unwrap();
        assert!(first.summary.is_none());
        engine.next().await.unwrap();

        let view = engine.current().unwrap();
        let second = engine.submit(Some(wrong(&view))).await.unwrap();
        let summary = second.summary.unwrap();
        assert_eq!(summary.reason, CompletionReason::StreakOver);
        assert_eq!(summary.headline(), "Streak over! Final score: 0.");
        assert!(!second.close_enough_available);

        assert_eq!(engine.next().await.unwrap_err(), SessionError::Completed);
        assert_eq!(engine.close_enough().await.unwrap_err(), SessionError::Completed);
        assert_eq!(ledger.progress().total_wrong(), 2);
    }

    #[tokio::test]
    async fn single_miss_never_ends_a_streak_run() {
        let (mut engine, _log) = engine(mixed_content(), Arc::new(StubLedger::default()));
        engine.start_mode(Mode::Streak).await.unwrap();

        let view = engine.current().unwrap();
        engine.submit(Some(wrong(&view))).await.unwrap();
        let mut advance = engine.next().await.unwrap();
        while let Advance::Question(view) = advance {
            engine.submit(Some(right(&view))).await.unwrap();
            advance = engine.next().await.unwrap();
        }
        let Advance::Complete(summary) = advance else {
            panic!("expected completion");
        };
        assert_eq!(summary.reason, CompletionReason::Exhausted);
        assert_eq!(engine.progress().unwrap().misses, 1);
    }

    #[tokio::test]
    async fn soft_rejections_leave_state_untouched() {
        let (mut engine, _log) =
            engine(content_of(vec![true_false("a"), true_false("b")]), Arc::new(StubLedger::default()));
        engine.start_mode(Mode::Streak).await.unwrap();
        let before = engine.current().unwrap();

        let err = engine.skip().await.unwrap_err();
        assert_eq!(err, SessionError::Rejected(SoftRejection::SkipNotAllowed));
        assert!(err.is_soft());

        let err = engine.submit(None).await.unwrap_err();
        assert_eq!(err, SessionError::Rejected(SoftRejection::NoSelection));

        assert_eq!(engine.current().unwrap(), before);
        assert_eq!(engine.progress().unwrap().score, 0);
        assert_eq!(engine.next().await.unwrap_err(), SessionError::NotAnswered);
    }

    #[tokio::test]
    async fn close_enough_round_trip() {
        let quiz = quiz_file();
        let ledger = StubLedger::with(|p| {
            p.mastery_mut().apply_delta(&quiz, &QuestionId::new("sa"), 2);
        });
        let (mut engine, _log) =
            engine(content_of(vec![short("sa", "mitochondria")]), Arc::clone(&ledger));
        engine.start_mode(Mode::Practice).await.unwrap();

        let miss = engine
            .submit(Some(Answer::Text("mitocondria".into())))
            .await
            .unwrap();
        assert!(!miss.correct);
        assert!(miss.close_enough_available);
        assert!(miss.message.starts_with("The answer is: mitochondria. "));
        assert!(ENCOURAGEMENTS.iter().any(|line| miss.message.ends_with(line)));
        assert_eq!(miss.mastery, 1);

        let accepted = engine.close_enough().await.unwrap();
        assert!(accepted.correct);
        assert_eq!(accepted.xp_earned, 10);
        assert_eq!(accepted.mastery, 3);

        let progress = ledger.progress();
        assert_eq!(progress.total_correct(), 1);
        assert_eq!(progress.total_wrong(), 0);
        let status = engine.progress().unwrap();
        assert_eq!((status.score, status.streak), (10, 1));

        let err = engine.close_enough().await.unwrap_err();
        assert_eq!(err, SessionError::CloseEnoughUnavailable);
    }

    #[tokio::test]
    async fn close_enough_needs_a_missed_short_answer() {
        let (mut engine, _log) =
            engine(content_of(vec![true_false("a")]), Arc::new(StubLedger::default()));
        engine.start_mode(Mode::Practice).await.unwrap();
        assert_eq!(
            engine.close_enough().await.unwrap_err(),
            SessionError::CloseEnoughUnavailable
        );

        engine.submit(Some(Answer::Bool(false))).await.unwrap();
        assert_eq!(
            engine.close_enough().await.unwrap_err(),
            SessionError::CloseEnoughUnavailable
        );
    }

    #[tokio::test]
    async fn boss_battle_repeats_misses_until_cleared() {
        let ledger = Arc::new(StubLedger::default());
        let (mut engine, log) = engine(
            content_of(vec![true_false("a"), true_false("b")]),
            Arc::clone(&ledger),
        );
        engine.start_mode(Mode::Boss).await.unwrap();

        let first = engine.current().unwrap();
        engine.submit(Some(Answer::Bool(false))).await.unwrap();
        let Advance::Question(second) = engine.next().await.unwrap() else {
            panic!("queue should not be empty");
        };
        assert_ne!(second.id, first.id);
        engine.submit(Some(Answer::Bool(true))).await.unwrap();

        let Advance::Question(again) = engine.next().await.unwrap() else {
            panic!("missed question should come back");
        };
        assert_eq!(again.id, first.id);
        engine.submit(Some(Answer::Bool(true))).await.unwrap();

        let Advance::Complete(summary) = engine.next().await.unwrap() else {
            panic!("boss should be cleared");
        };
        assert_eq!(summary.reason, CompletionReason::BossCleared);
        assert_eq!(summary.boss, Some((2, 3)));
        assert_eq!(summary.headline(), "Boss Battle complete!");
        assert!(ledger.progress().has_badge(Badge::BossSlayer.id()));
        assert!(
            log.drain()
                .iter()
                .any(|e| matches!(e, RewardEvent::StickerEarned(_)))
        );
    }

    #[tokio::test]
    async fn boss_skip_defers_into_the_missed_pool() {
        let (mut engine, _log) =
            engine(content_of(vec![true_false("a")]), Arc::new(StubLedger::default()));
        engine.start_mode(Mode::Boss).await.unwrap();
        let first = engine.current().unwrap();

        let Advance::Question(again) = engine.skip().await.unwrap() else {
            panic!("skipped boss question should come back");
        };
        assert_eq!(again.id, first.id);
    }

    #[tokio::test]
    async fn skipped_practice_questions_are_reviewed() {
        let (mut engine, _log) = engine(
            content_of(vec![true_false("a"), true_false("b"), true_false("c")]),
            Arc::new(StubLedger::default()),
        );
        engine.start_mode(Mode::Practice).await.unwrap();
        let skipped = engine.current().unwrap();

        let mut advance = engine.skip().await.unwrap();
        let mut answered = 0;
        let reviewed = loop {
            match advance {
                Advance::Question(view) => {
                    engine.submit(Some(right(&view))).await.unwrap();
                    answered += 1;
                    advance = engine.next().await.unwrap();
                }
                Advance::ReviewSkipped { count, question } => break (count, question),
                Advance::Complete(_) => panic!("skipped question was dropped"),
            }
        };
        assert_eq!(answered, 2);
        assert_eq!(reviewed.0, 1);
        assert_eq!(reviewed.1.id, skipped.id);
        assert_eq!((reviewed.1.number, reviewed.1.total), (1, 1));
        assert!(engine.progress().unwrap().reviewing_skipped);

        let Advance::Complete(summary) = engine.skip().await.unwrap() else {
            panic!("a second review pass should not start");
        };
        assert_eq!(summary.correct, 2);
    }

    #[tokio::test]
    async fn challenge_alternates_players_and_reports_winner() {
        let ledger = Arc::new(StubLedger::default());
        let (mut engine, _log) = engine(
            content_of(vec![true_false("a"), true_false("b")]),
            Arc::clone(&ledger),
        );
        engine.start_mode(Mode::Challenge).await.unwrap();

        let view = engine.current().unwrap();
        assert_eq!(view.player, Some(Player::One));
        engine.submit(Some(Answer::Bool(true))).await.unwrap();

        let Advance::Question(view) = engine.next().await.unwrap() else {
            panic!("two questions expected");
        };
        assert_eq!(view.player, Some(Player::Two));
        engine.submit(Some(Answer::Bool(false))).await.unwrap();

        let Advance::Complete(summary) = engine.next().await.unwrap() else {
            panic!("challenge should be over");
        };
        let result = summary.challenge.unwrap();
        assert_eq!((result.player_one, result.player_two), (10, 0));
        assert_eq!(result.outcome, ChallengeOutcome::Winner(Player::One));
        assert!(ledger.progress().has_badge(Badge::ChallengePlayed.id()));
    }

    #[tokio::test]
    async fn level_up_is_announced_with_its_theme() {
        let ledger = StubLedger::with(|p| {
            p.award_xp(95, 1);
        });
        let (mut engine, log) = engine(content_of(vec![true_false("a")]), ledger);
        engine.start_mode(Mode::Practice).await.unwrap();
        engine.submit(Some(Answer::Bool(true))).await.unwrap();

        assert!(log.drain().contains(&RewardEvent::LevelUp {
            level: 2,
            unlocked_theme: Some("ocean".into()),
        }));
    }

    #[tokio::test]
    async fn study_mode_browses_without_scoring() {
        let ledger = Arc::new(StubLedger::default());
        let (mut engine, _log) = engine(mixed_content(), Arc::clone(&ledger));
        engine.start_mode(Mode::Study).await.unwrap();
        assert_eq!(engine.mode(), Some(Mode::Study));
        assert_eq!(engine.current(), None);

        let card = engine.study_card().unwrap();
        assert!(card.is_first());
        assert!(!card.revealed);
        assert_eq!(card.answer, "True");
        assert_eq!(card.position_label(), "Card 1 of 4");

        assert!(engine.toggle_reveal().unwrap().revealed);
        let card = engine.study_next().unwrap();
        assert_eq!((card.index, card.revealed), (1, false));
        assert_eq!(engine.study_prev().unwrap().index, 0);

        let err = engine.submit(Some(Answer::Bool(true))).await.unwrap_err();
        assert_eq!(err, SessionError::WrongMode(Mode::Study));

        engine.finish_study().await.unwrap();
        assert_eq!(engine.mode(), Some(Mode::Practice));
        assert!(engine.current().is_some());
        assert_eq!(ledger.progress().total_correct(), 0);
    }

    #[tokio::test]
    async fn empty_order_input_submits_the_shown_arrangement() {
        let order = question(
            "ord",
            QuestionKind::Order {
                items: vec!["a".into(), "b".into()],
                answer_order: vec!["a".into(), "b".into()],
            },
        );
        let mut graded = (0, 0);
        for seed in 0..32 {
            let mut engine = SessionEngine::new(Arc::new(StubLedger::default()))
                .with_clock(fixed_clock())
                .with_seed(seed);
            engine.load_content(content_of(vec![order.clone()]));
            engine.start_mode(Mode::Practice).await.unwrap();

            let shown = engine.current().unwrap().order_items;
            let feedback = engine.submit(None).await.unwrap();
            if shown == ["a", "b"] {
                assert!(feedback.correct, "seed {seed}");
                assert_eq!(feedback.mastery, 1);
                graded.0 += 1;
            } else {
                assert!(!feedback.correct, "seed {seed}");
                graded.1 += 1;
            }
        }
        assert!(graded.0 > 0 && graded.1 > 0, "{graded:?}");
    }

    #[tokio::test]
    async fn empty_quiz_runs_earn_no_completion_rewards() {
        for mode in [Mode::Boss, Mode::Challenge, Mode::Practice, Mode::Streak] {
            let ledger = Arc::new(StubLedger::default());
            let (mut engine, log) = engine(content_of(Vec::new()), Arc::clone(&ledger));
            engine.start_mode(mode).await.unwrap();

            assert!(engine.is_complete(), "{mode}");
            let progress = ledger.progress();
            assert!(progress.earned_badges().is_empty(), "{mode}");
            assert!(progress.stickers(&quiz_file()).is_empty(), "{mode}");
            assert!(log.drain().is_empty(), "{mode}");
        }
    }
}
