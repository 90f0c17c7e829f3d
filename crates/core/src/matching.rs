//! Answer normalization and correctness checks.

use std::collections::HashSet;

use crate::model::{Answer, Question, QuestionKind};

/// Words ignored when deciding whether a short answer has its core words.
const FILLER_WORDS: [&str; 10] = ["a", "an", "the", "is", "are", "was", "were", "of", "to", "and"];

/// Share of answer tokens the player must hit.
const TOKEN_OVERLAP_THRESHOLD: f64 = 0.70;
/// Share of non-filler answer tokens the player must hit.
const CORE_OVERLAP_THRESHOLD: f64 = 0.90;

/// How short answers are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMatching {
    /// Normalized string equality.
    #[default]
    Strict,
    /// Tolerates filler words, punctuation and partial phrasing.
    Lenient,
}

/// Trim, lowercase, fold curly quotes and collapse whitespace.
#[must_use]
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `normalize`, then hyphens to spaces and every other non-alphanumeric dropped.
fn clean(s: &str) -> String {
    let stripped: String = normalize(s)
        .chars()
        .map(|c| if c == '-' { ' ' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[allow(clippy::cast_precision_loss)]
fn ratio(hits: usize, total: usize) -> f64 {
    hits as f64 / total.max(1) as f64
}

/// Forgiving short-answer comparison.
///
/// Accepts equal cleaned strings, either one containing the other, or enough
/// token overlap: 70% of all answer tokens or 90% of its non-filler tokens.
#[must_use]
pub fn lenient_match(user: &str, answer: &str) -> bool {
    let user = clean(user);
    let answer = clean(answer);
    if user.is_empty() || answer.is_empty() {
        return false;
    }
    if user == answer || user.contains(&answer) || answer.contains(&user) {
        return true;
    }

    let user_tokens: HashSet<&str> = user.split(' ').collect();
    let answer_tokens: HashSet<&str> = answer.split(' ').collect();
    let core_tokens: HashSet<&str> = answer_tokens
        .iter()
        .copied()
        .filter(|t| !FILLER_WORDS.contains(t))
        .collect();

    let intersecting = user_tokens
        .iter()
        .filter(|t| answer_tokens.contains(*t) || core_tokens.contains(*t))
        .count();
    let core_matches = core_tokens
        .iter()
        .filter(|t| user_tokens.contains(*t))
        .count();

    ratio(intersecting, answer_tokens.len()) >= TOKEN_OVERLAP_THRESHOLD
        || ratio(core_matches, core_tokens.len()) >= CORE_OVERLAP_THRESHOLD
}

/// Whether `answer` is correct for `question`.
///
/// An answer of the wrong shape for the question kind is simply wrong.
#[must_use]
pub fn check_answer(question: &Question, answer: &Answer, matching: AnswerMatching) -> bool {
    match (question.kind(), answer) {
        (QuestionKind::MultipleChoice { answer: expected, .. }, Answer::Choice(given)) => {
            given == expected
        }
        (QuestionKind::TrueFalse { answer: expected }, Answer::Bool(given)) => given == expected,
        (QuestionKind::ShortAnswer { answer: expected }, Answer::Text(given)) => match matching {
            AnswerMatching::Strict => normalize(given) == normalize(expected),
            AnswerMatching::Lenient => lenient_match(given, expected),
        },
        (QuestionKind::Order { answer_order, .. }, Answer::Order(given)) => {
            given.len() == answer_order.len()
                && given
                    .iter()
                    .zip(answer_order)
                    .all(|(g, e)| normalize(g) == normalize(e))
        }
        _ => false,
    }
}
