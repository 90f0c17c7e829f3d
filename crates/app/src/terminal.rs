use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quiz_core::levels::{LevelProgress, theme_name};
use quiz_core::matching::AnswerMatching;
use quiz_core::model::{Mode, Progress, QuestionKind, QuizFile, SessionSummary};
use services::{Advance, AnswerFeedback, QuestionView, RewardEvent, RewardLog, SessionEngine};

use crate::input::{
    AfterAnswerInput, QuestionInput, StudyInput, parse_after_answer, parse_question_input,
    parse_study,
};

type AppResult<T> = Result<T, Box<dyn Error>>;

/// Line-oriented front end over stdin/stdout.
pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prompt and read one line. `None` at end of input.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;
        self.lines.next_line().await
    }

    /// Run `mode` until it completes or the player quits.
    pub async fn play(
        &mut self,
        engine: &mut SessionEngine,
        rewards: &RewardLog,
        mode: Mode,
    ) -> AppResult<()> {
        engine.start_mode(mode).await?;
        if mode == Mode::Study && !self.study(engine).await? {
            return Ok(());
        }
        self.quiz(engine, rewards).await
    }

    /// Returns `true` when the player finished studying and wants practice.
    async fn study(&mut self, engine: &mut SessionEngine) -> AppResult<bool> {
        if engine.content().is_none_or(|c| c.is_empty()) {
            println!("This quiz has no questions.");
            return Ok(false);
        }
        let mut card = engine.study_card()?;
        loop {
            println!();
            println!("{}  [{}]  {}", card.position_label(), card.label, card.stars());
            println!("{}", card.prompt);
            if card.revealed {
                println!("  = {}", card.answer);
            }
            let keys = if card.is_last() {
                "[Enter] flip  [p]rev  [d]one  [q]uit"
            } else {
                "[Enter] flip  [n]ext  [p]rev  [d]one  [q]uit"
            };
            let Some(line) = self.read_line(&format!("{keys} > ")).await? else {
                return Ok(false);
            };
            card = match parse_study(&line) {
                Ok(StudyInput::Reveal) => engine.toggle_reveal()?,
                Ok(StudyInput::Next) => engine.study_next()?,
                Ok(StudyInput::Prev) => engine.study_prev()?,
                Ok(StudyInput::Done) => {
                    engine.finish_study().await?;
                    return Ok(true);
                }
                Ok(StudyInput::Quit) => return Ok(false),
                Err(err) => {
                    println!("{err}");
                    card
                }
            };
        }
    }

    async fn quiz(&mut self, engine: &mut SessionEngine, rewards: &RewardLog) -> AppResult<()> {
        loop {
            print_rewards(rewards);
            if let Some(summary) = engine.summary() {
                print_summary(summary);
                return Ok(());
            }
            let Some(view) = engine.current() else {
                return Ok(());
            };
            if let Some(progress) = engine.progress() {
                println!();
                println!("{}", progress.status_line());
            }
            print_question(&view);

            let Some(line) = self.read_line("> ").await? else {
                return Ok(());
            };
            let input = match parse_question_input(&line, &view.kind, &view.order_items) {
                Ok(input) => input,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };

            match input {
                QuestionInput::Quit => return Ok(()),
                QuestionInput::ToggleLenient => {
                    let next = match engine.matching() {
                        AnswerMatching::Strict => AnswerMatching::Lenient,
                        AnswerMatching::Lenient => AnswerMatching::Strict,
                    };
                    engine.set_matching(next);
                    println!("Short answers are now checked {}.", matching_label(next));
                }
                QuestionInput::Skip => match engine.skip().await {
                    Ok(advance) => {
                        println!("Question skipped - you'll see it again later!");
                        announce(&advance);
                    }
                    Err(err) if err.is_soft() => println!("{err}"),
                    Err(err) => return Err(err.into()),
                },
                QuestionInput::Answer(answer) => {
                    let feedback = match engine.submit(answer).await {
                        Ok(feedback) => feedback,
                        Err(err) if err.is_soft() => {
                            println!("{err}");
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    };
                    print_feedback(&feedback);
                    print_rewards(rewards);
                    if feedback.summary.is_some() {
                        continue;
                    }
                    if !self.after_answer(engine, rewards, &feedback).await? {
                        return Ok(());
                    }
                    let advance = engine.next().await?;
                    announce(&advance);
                }
            }
        }
    }

    /// Wait for the player to move on. Returns `false` if they quit.
    async fn after_answer(
        &mut self,
        engine: &mut SessionEngine,
        rewards: &RewardLog,
        feedback: &AnswerFeedback,
    ) -> AppResult<bool> {
        let prompt = if feedback.close_enough_available {
            "[Enter] next  [ok] that was close enough > "
        } else {
            "[Enter] next > "
        };
        let Some(line) = self.read_line(prompt).await? else {
            return Ok(false);
        };
        match parse_after_answer(&line) {
            AfterAnswerInput::Continue => Ok(true),
            AfterAnswerInput::Quit => Ok(false),
            AfterAnswerInput::CloseEnough => {
                match engine.close_enough().await {
                    Ok(accepted) => print_feedback(&accepted),
                    Err(err) => println!("{err}"),
                }
                print_rewards(rewards);
                Ok(true)
            }
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

fn matching_label(matching: AnswerMatching) -> &'static str {
    match matching {
        AnswerMatching::Strict => "strictly",
        AnswerMatching::Lenient => "leniently",
    }
}

fn print_question(view: &QuestionView) {
    if let Some(player) = view.player {
        println!("Player {}'s turn", player.number());
    }
    println!(
        "Q{}/{}  [{}]  {}",
        view.number,
        view.total,
        view.kind.label(),
        view.stars()
    );
    if view.starred() {
        println!("(mastered)");
    }
    println!("{}", view.prompt);
    match &view.kind {
        QuestionKind::MultipleChoice { choices, .. } => {
            for (idx, choice) in choices.iter().enumerate() {
                println!("  {}) {choice}", idx + 1);
            }
        }
        QuestionKind::TrueFalse { .. } => println!("  (t)rue or (f)alse"),
        QuestionKind::ShortAnswer { .. } => println!("  type your answer"),
        QuestionKind::Order { .. } => {
            for (idx, item) in view.order_items.iter().enumerate() {
                println!("  {}) {item}", idx + 1);
            }
            println!("  list the numbers in the right order, e.g. 2 1 3 (Enter keeps this order)");
        }
    }
}

fn print_feedback(feedback: &AnswerFeedback) {
    println!("{}", feedback.message);
}

fn announce(advance: &Advance) {
    if let Advance::ReviewSkipped { count, .. } = advance {
        let plural = if *count == 1 { "" } else { "s" };
        println!("Now reviewing {count} skipped question{plural}!");
    }
}

fn print_rewards(rewards: &RewardLog) {
    for event in rewards.drain() {
        match event {
            RewardEvent::StreakMilestone { streak } => println!("{streak} in a row!"),
            RewardEvent::LevelUp {
                level,
                unlocked_theme,
            } => {
                println!("Level up! You reached level {level}.");
                if let Some(theme) = unlocked_theme {
                    let name = theme_name(&theme).unwrap_or(theme.as_str());
                    println!("New theme unlocked: {name}");
                }
            }
            RewardEvent::BadgeEarned(badge) => println!("Badge earned: {}", badge.title()),
            RewardEvent::StickerEarned(sticker) => println!("New sticker: {sticker}"),
            RewardEvent::Correct { .. } | RewardEvent::Wrong => {}
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("{}", summary.headline());
    println!("Session score: {}", summary.score);
    println!("Correct: {}  Wrong: {}", summary.correct, summary.wrong);
    if let Some((mastered, attempts)) = summary.boss {
        println!("Boss: {mastered} mastered in {attempts} attempts");
    }
    println!("Total XP: {}", summary.total_xp);
    println!(
        "Questions mastered: {}/{}",
        summary.mastered, summary.total_questions
    );
    let elapsed = summary.completed_at - summary.started_at;
    println!("Time: {}m {}s", elapsed.num_minutes(), elapsed.num_seconds() % 60);
}

/// Progress overview for the `status` command.
pub fn print_status(progress: &Progress, quiz: &QuizFile) {
    let level = LevelProgress::for_xp(progress.xp());
    println!("Level {} ({})  {} XP", level.level, level.title, level.xp);
    match level.xp_to_next {
        Some(to_next) => println!("{}% of the way, {to_next} XP to the next level", level.percent),
        None => println!("Max level reached"),
    }
    println!(
        "Answered: {} correct, {} wrong",
        progress.total_correct(),
        progress.total_wrong()
    );

    let themes: Vec<String> = progress
        .unlocked_themes()
        .iter()
        .map(|id| {
            let name = theme_name(id).unwrap_or(id.as_str());
            if id == progress.current_theme() {
                format!("{name} (current)")
            } else {
                name.to_owned()
            }
        })
        .collect();
    println!("Themes: {}", themes.join(", "));

    if progress.earned_badges().is_empty() {
        println!("Badges: none yet");
    } else {
        println!("Badges: {}", progress.earned_badges().join(", "));
    }
    println!("Voice: {}", if progress.voice_enabled() { "on" } else { "off" });
    let stickers = progress.stickers(quiz);
    if !stickers.is_empty() {
        println!("Stickers for {quiz}: {}", stickers.join(" "));
    }
}
