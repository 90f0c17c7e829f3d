mod input;
mod terminal;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::matching::AnswerMatching;
use quiz_core::model::{Mode, ParseModeError, QuizFile};
use services::{Clock, Ledger, QuizServices, RewardBus, RewardLog};

use crate::terminal::{Terminal, print_status};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidMode(ParseModeError),
    InvalidSeed { raw: String },
    MissingTheme,
    InvalidVoice { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMode(err) => write!(f, "invalid --mode value: {err}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::MissingTheme => write!(f, "theme requires a theme id"),
            ArgsError::InvalidVoice { raw } => write!(f, "voice takes on or off (got {raw:?})"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play   [--mode <mode>] [--quiz <file>] [--lenient] [--seed <n>]");
    eprintln!("  cargo run -p app -- status [--quiz <file>]");
    eprintln!("  cargo run -p app -- theme <id>");
    eprintln!("  cargo run -p app -- voice <on|off>");
    eprintln!("  cargo run -p app -- reset --yes");
    eprintln!();
    eprintln!("Shared options:");
    eprintln!("  --db <sqlite_url>       (default sqlite://quiz.sqlite3)");
    eprintln!("  --content-dir <dir>     (default content)");
    eprintln!();
    eprintln!("Modes: practice, streak, boss, study, challenge");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CONTENT_DIR, QUIZ_FILE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Status,
    Theme,
    Voice,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "status" => Some(Self::Status),
            "theme" => Some(Self::Theme),
            "voice" => Some(Self::Voice),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    content_dir: PathBuf,
    quiz: Option<QuizFile>,
    mode: Mode,
    matching: AnswerMatching,
    seed: Option<u64>,
    confirmed: bool,
    theme: Option<String>,
    voice: Option<bool>,
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut content_dir = std::env::var("QUIZ_CONTENT_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("content"), PathBuf::from);
        let mut quiz = std::env::var("QUIZ_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(QuizFile::new);
        let mut mode = Mode::Practice;
        let mut matching = AnswerMatching::Strict;
        let mut seed = None;
        let mut confirmed = false;
        let mut theme = None;
        let mut voice = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content-dir" => {
                    content_dir = PathBuf::from(require_value(args, "--content-dir")?);
                }
                "--quiz" => quiz = Some(QuizFile::new(require_value(args, "--quiz")?)),
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = value.parse().map_err(ArgsError::InvalidMode)?;
                }
                "--lenient" => matching = AnswerMatching::Lenient,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--yes" | "-y" if command == Command::Reset => confirmed = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if command == Command::Theme && theme.is_none() && !arg.starts_with('-') => {
                    theme = Some(arg);
                }
                _ if command == Command::Voice && voice.is_none() => {
                    voice = Some(match arg.as_str() {
                        "on" => true,
                        "off" => false,
                        _ => return Err(ArgsError::InvalidVoice { raw: arg }),
                    });
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if command == Command::Theme && theme.is_none() {
            return Err(ArgsError::MissingTheme);
        }
        if command == Command::Voice && voice.is_none() {
            return Err(ArgsError::InvalidVoice { raw: String::new() });
        }

        Ok(Self {
            db_url,
            content_dir,
            quiz,
            mode,
            matching,
            seed,
            confirmed,
            theme,
            voice,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    log::debug!("parsed arguments: {parsed:?}");

    // Open + migrate SQLite at startup so the services stay storage-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        QuizServices::new_sqlite(&parsed.db_url, parsed.content_dir.clone(), Clock::default())
            .await?;

    match cmd {
        Command::Play => {
            let rewards = RewardLog::new();
            let mut engine = services
                .engine()
                .with_matching(parsed.matching)
                .with_rewards(RewardBus::new().with_hook(Arc::new(rewards.clone())));
            if let Some(seed) = parsed.seed {
                engine = engine.with_seed(seed);
            }

            let file = services.resolve_quiz(parsed.quiz);
            services.open_quiz(&mut engine, &file).await?;
            if let Some(content) = engine.content() {
                println!("{}", content.title());
                if let Some(date) = content.test_date() {
                    println!("Test date: {date}");
                }
            }

            Terminal::new().play(&mut engine, &rewards, parsed.mode).await
        }
        Command::Status => {
            let file = services.resolve_quiz(parsed.quiz);
            let progress = services.ledger().snapshot().await;
            print_status(&progress, &file);
            Ok(())
        }
        Command::Theme => {
            let theme = parsed.theme.ok_or(ArgsError::MissingTheme)?;
            services.ledger().set_theme(&theme).await?;
            println!("Theme set to {theme}.");
            Ok(())
        }
        Command::Voice => {
            let enabled = parsed.voice.unwrap_or_default();
            services.ledger().set_voice_enabled(enabled).await;
            println!("Voice {}.", if enabled { "on" } else { "off" });
            Ok(())
        }
        Command::Reset => {
            services.ledger().reset(parsed.confirmed).await?;
            println!("All progress has been reset.");
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(command: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(command, &mut iter)
    }

    #[test]
    fn play_flags_are_parsed() {
        let args = parse(
            Command::Play,
            &["--mode", "Boss", "--lenient", "--seed", "7", "--quiz", "bio.json"],
        )
        .unwrap();
        assert_eq!(args.mode, Mode::Boss);
        assert_eq!(args.matching, AnswerMatching::Lenient);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.quiz, Some(QuizFile::new("bio.json")));
        assert!(!args.confirmed);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(Command::Play, &["--mode", "speedrun"]),
            Err(ArgsError::InvalidMode(_))
        ));
        assert!(matches!(
            parse(Command::Play, &["--seed", "-1"]),
            Err(ArgsError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse(Command::Play, &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn yes_only_counts_for_reset() {
        assert!(parse(Command::Reset, &["--yes"]).unwrap().confirmed);
        assert!(matches!(
            parse(Command::Play, &["--yes"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn theme_takes_one_id() {
        let args = parse(Command::Theme, &["ocean"]).unwrap();
        assert_eq!(args.theme.as_deref(), Some("ocean"));
        assert!(matches!(
            parse(Command::Theme, &[]),
            Err(ArgsError::MissingTheme)
        ));
        assert!(matches!(
            parse(Command::Theme, &["ocean", "forest"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn voice_takes_on_or_off() {
        assert_eq!(parse(Command::Voice, &["on"]).unwrap().voice, Some(true));
        assert_eq!(parse(Command::Voice, &["off"]).unwrap().voice, Some(false));
        assert!(matches!(
            parse(Command::Voice, &["loud"]),
            Err(ArgsError::InvalidVoice { .. })
        ));
        assert!(matches!(
            parse(Command::Voice, &[]),
            Err(ArgsError::InvalidVoice { .. })
        ));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        let url = normalize_sqlite_url("sqlite:quiz.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("quiz.sqlite3"));
    }
}
