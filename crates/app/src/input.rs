use std::fmt;

use quiz_core::model::{Answer, QuestionKind};

/// A line typed while a question is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionInput {
    Answer(Option<Answer>),
    Skip,
    ToggleLenient,
    Quit,
}

/// A line typed after feedback is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterAnswerInput {
    Continue,
    CloseEnough,
    Quit,
}

/// A line typed in study mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyInput {
    Reveal,
    Next,
    Prev,
    Done,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    NotTrueFalse(String),
    NoSuchChoice(String),
    BadOrder { expected: usize },
    UnknownCommand(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NotTrueFalse(raw) => write!(f, "type t or f (got {raw:?})"),
            InputError::NoSuchChoice(raw) => write!(f, "no choice matches {raw:?}"),
            InputError::BadOrder { expected } => {
                write!(f, "list each of the {expected} item numbers once, e.g. 2 1 3")
            }
            InputError::UnknownCommand(raw) => write!(f, "unknown command: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Interpret a line typed for a question of `kind`.
///
/// `order_items` are the order items in the order they were shown.
///
/// # Errors
///
/// Returns `InputError` when the line fits neither a command nor the kind.
pub fn parse_question_input(
    line: &str,
    kind: &QuestionKind,
    order_items: &[String],
) -> Result<QuestionInput, InputError> {
    let trimmed = line.trim();
    match trimmed {
        ":skip" | ":s" => return Ok(QuestionInput::Skip),
        ":lenient" | ":l" => return Ok(QuestionInput::ToggleLenient),
        ":quit" | ":q" => return Ok(QuestionInput::Quit),
        cmd if cmd.starts_with(':') => return Err(InputError::UnknownCommand(cmd.to_owned())),
        _ => {}
    }

    let answer = match kind {
        QuestionKind::TrueFalse { .. } => parse_bool(trimmed)?.map(Answer::Bool),
        QuestionKind::MultipleChoice { choices, .. } => {
            parse_choice(trimmed, choices)?.map(Answer::Choice)
        }
        QuestionKind::ShortAnswer { .. } => Some(Answer::Text(line.to_owned())),
        QuestionKind::Order { .. } => {
            if trimmed.is_empty() {
                None
            } else {
                Some(Answer::Order(parse_order(trimmed, order_items)?))
            }
        }
    };
    Ok(QuestionInput::Answer(answer))
}

fn parse_bool(raw: &str) -> Result<Option<bool>, InputError> {
    match raw.to_lowercase().as_str() {
        "" => Ok(None),
        "t" | "true" | "y" | "yes" => Ok(Some(true)),
        "f" | "false" | "n" | "no" => Ok(Some(false)),
        _ => Err(InputError::NotTrueFalse(raw.to_owned())),
    }
}

/// A 1-based choice number or the choice text itself.
fn parse_choice(raw: &str, choices: &[String]) -> Result<Option<String>, InputError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|idx| choices.get(idx))
            .cloned()
            .map(Some)
            .ok_or_else(|| InputError::NoSuchChoice(raw.to_owned()));
    }
    choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(raw))
        .cloned()
        .map(Some)
        .ok_or_else(|| InputError::NoSuchChoice(raw.to_owned()))
}

/// Item numbers separated by spaces or commas, each used exactly once.
fn parse_order(raw: &str, items: &[String]) -> Result<Vec<String>, InputError> {
    let bad = || InputError::BadOrder {
        expected: items.len(),
    };
    let mut used = vec![false; items.len()];
    let mut ordered = Vec::with_capacity(items.len());
    for token in raw.split([' ', ',']).filter(|t| !t.is_empty()) {
        let idx = token
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|&idx| idx < items.len())
            .ok_or_else(bad)?;
        if std::mem::replace(&mut used[idx], true) {
            return Err(bad());
        }
        ordered.push(items[idx].clone());
    }
    if ordered.len() != items.len() {
        return Err(bad());
    }
    Ok(ordered)
}

pub fn parse_after_answer(line: &str) -> AfterAnswerInput {
    match line.trim() {
        ":ok" | "ok" => AfterAnswerInput::CloseEnough,
        ":quit" | ":q" => AfterAnswerInput::Quit,
        _ => AfterAnswerInput::Continue,
    }
}

/// # Errors
///
/// Returns `InputError::UnknownCommand` for anything but the study keys.
pub fn parse_study(line: &str) -> Result<StudyInput, InputError> {
    match line.trim().to_lowercase().as_str() {
        "" | "r" => Ok(StudyInput::Reveal),
        "n" => Ok(StudyInput::Next),
        "p" => Ok(StudyInput::Prev),
        "d" | "done" => Ok(StudyInput::Done),
        "q" | ":q" | ":quit" => Ok(StudyInput::Quit),
        other => Err(InputError::UnknownCommand(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn commands_win_over_answers() {
        let kind = QuestionKind::ShortAnswer {
            answer: "x".into(),
        };
        assert_eq!(
            parse_question_input(" :skip ", &kind, &[]).unwrap(),
            QuestionInput::Skip
        );
        assert!(matches!(
            parse_question_input(":nope", &kind, &[]),
            Err(InputError::UnknownCommand(_))
        ));
    }

    #[test]
    fn empty_choice_is_no_selection() {
        let kind = QuestionKind::TrueFalse { answer: true };
        assert_eq!(
            parse_question_input("  ", &kind, &[]).unwrap(),
            QuestionInput::Answer(None)
        );
        assert_eq!(
            parse_question_input("Yes", &kind, &[]).unwrap(),
            QuestionInput::Answer(Some(Answer::Bool(true)))
        );
    }

    #[test]
    fn choices_by_number_or_text() {
        let choices = strings(&["Paris", "Rome"]);
        assert_eq!(parse_choice("2", &choices).unwrap(), Some("Rome".into()));
        assert_eq!(parse_choice("paris", &choices).unwrap(), Some("Paris".into()));
        assert!(parse_choice("3", &choices).is_err());
        assert!(parse_choice("0", &choices).is_err());
    }

    #[test]
    fn order_uses_shown_positions_once() {
        let shown = strings(&["organ", "cell", "tissue"]);
        assert_eq!(
            parse_order("2, 3 1", &shown).unwrap(),
            strings(&["cell", "tissue", "organ"])
        );
        assert!(parse_order("2 2 1", &shown).is_err());
        assert!(parse_order("2 3", &shown).is_err());
        assert!(parse_order("2 3 4", &shown).is_err());
    }

    #[test]
    fn study_keys() {
        assert_eq!(parse_study("").unwrap(), StudyInput::Reveal);
        assert_eq!(parse_study("N").unwrap(), StudyInput::Next);
        assert!(parse_study("x").is_err());
        assert_eq!(parse_after_answer("ok"), AfterAnswerInput::CloseEnough);
        assert_eq!(parse_after_answer(""), AfterAnswerInput::Continue);
    }
}
