//! Quiz file parsing and validation.
//!
//! A quiz file is `{ "title"?, "testDate"?, "questions": [...] }`. Every
//! question is checked before anything is accepted; a file with any bad
//! question loads nothing.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::matching::normalize;
use crate::model::{Question, QuestionId, QuestionKind, QuizFile};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A shape problem with one question.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionIssue {
    /// `position` is 1-based.
    MissingId { position: usize },
    MissingType { id: String },
    MissingPrompt { id: String },
    UnsupportedType { id: String, kind: String },
    NeedsChoices { id: String },
    NeedsStringAnswer { id: String },
    NeedsBoolAnswer { id: String },
    NeedsItems { id: String },
    NeedsAnswerOrder { id: String },
    DuplicateId { id: String },
}

impl fmt::Display for QuestionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionIssue::MissingId { position } => {
                write!(f, "Question #{position} missing 'id'.")
            }
            QuestionIssue::MissingType { id } => write!(f, "Question '{id}' missing 'type'."),
            QuestionIssue::MissingPrompt { id } => write!(f, "Question '{id}' missing 'prompt'."),
            QuestionIssue::UnsupportedType { id, kind } => {
                write!(f, "Question '{id}' has unsupported type '{kind}'.")
            }
            QuestionIssue::NeedsChoices { id } => {
                write!(f, "Question '{id}' needs 'choices' (2+ distinct strings).")
            }
            QuestionIssue::NeedsStringAnswer { id } => {
                write!(f, "Question '{id}' needs string 'answer'.")
            }
            QuestionIssue::NeedsBoolAnswer { id } => {
                write!(f, "Question '{id}' needs boolean 'answer'.")
            }
            QuestionIssue::NeedsItems { id } => write!(f, "Question '{id}' needs 'items' (2+)."),
            QuestionIssue::NeedsAnswerOrder { id } => write!(
                f,
                "Question '{id}' needs 'answerOrder' listing the same 'items' in order."
            ),
            QuestionIssue::DuplicateId { id } => write!(f, "Question id '{id}' is used twice."),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("{file} is not valid JSON: {message}")]
    Json { file: QuizFile, message: String },

    #[error("{file} must be a JSON object.")]
    NotAnObject { file: QuizFile },

    #[error("{file} must have a 'questions' array.")]
    MissingQuestions { file: QuizFile },

    /// Issues are in file order; the first one is the reported one.
    #[error("{file}: {}", describe_issues(.issues))]
    Invalid {
        file: QuizFile,
        issues: Vec<QuestionIssue>,
    },
}

impl ContentError {
    /// All question issues found, empty for document-level errors.
    #[must_use]
    pub fn issues(&self) -> &[QuestionIssue] {
        match self {
            ContentError::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}

fn describe_issues(issues: &[QuestionIssue]) -> String {
    match issues {
        [] => "invalid questions".to_owned(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more problems)", rest.len()),
    }
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// The validated question bank of one quiz file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizContent {
    file: QuizFile,
    title: Option<String>,
    test_date: Option<String>,
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl QuizContent {
    /// Parse and validate a quiz document.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the JSON is malformed, the document shape is
    /// wrong, or any question fails its shape checks.
    pub fn from_json_str(file: QuizFile, json: &str) -> Result<Self, ContentError> {
        let value: Value = serde_json::from_str(json).map_err(|err| ContentError::Json {
            file: file.clone(),
            message: err.to_string(),
        })?;
        Self::from_value(file, &value)
    }

    /// Validate an already-parsed quiz document.
    ///
    /// # Errors
    ///
    /// See [`QuizContent::from_json_str`].
    pub fn from_value(file: QuizFile, value: &Value) -> Result<Self, ContentError> {
        let Some(doc) = value.as_object() else {
            return Err(ContentError::NotAnObject { file });
        };
        let Some(raw_questions) = doc.get("questions").and_then(Value::as_array) else {
            return Err(ContentError::MissingQuestions { file });
        };

        let mut questions = Vec::with_capacity(raw_questions.len());
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (idx, raw) in raw_questions.iter().enumerate() {
            match parse_question(idx + 1, raw) {
                Ok(question) => {
                    if seen.insert(question.id().clone()) {
                        questions.push(question);
                    } else {
                        issues.push(QuestionIssue::DuplicateId {
                            id: question.id().to_string(),
                        });
                    }
                }
                Err(issue) => issues.push(issue),
            }
        }

        if !issues.is_empty() {
            return Err(ContentError::Invalid { file, issues });
        }

        Ok(Self::new(
            file,
            optional_string(doc, "title"),
            optional_string(doc, "testDate"),
            questions,
        ))
    }

    /// Build content from questions that are already valid.
    #[must_use]
    pub fn new(
        file: QuizFile,
        title: Option<String>,
        test_date: Option<String>,
        questions: Vec<Question>,
    ) -> Self {
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.id().clone(), idx))
            .collect();
        Self {
            file,
            title,
            test_date,
            questions,
            by_id,
        }
    }

    #[must_use]
    pub fn file(&self) -> &QuizFile {
        &self.file
    }

    /// Title from the file, or a generic one.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Study Quiz")
    }

    #[must_use]
    pub fn test_date(&self) -> Option<&str> {
        self.test_date.as_deref()
    }

    /// Questions in file order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&idx| &self.questions[idx])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.questions.iter().map(Question::id)
    }
}

//
// ─── QUESTION PARSING ──────────────────────────────────────────────────────────
//

fn optional_string(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(raw: Option<&Value>) -> Option<Vec<String>> {
    raw?.as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

fn parse_question(position: usize, raw: &Value) -> Result<Question, QuestionIssue> {
    let obj = raw.as_object();
    let field = |key: &str| obj.and_then(|o| o.get(key));

    let id = field("id")
        .and_then(parse_id)
        .ok_or(QuestionIssue::MissingId { position })?;
    let kind = field("type")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QuestionIssue::MissingType { id: id.clone() })?;
    let prompt = field("prompt")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| QuestionIssue::MissingPrompt { id: id.clone() })?;

    let string_answer = || {
        field("answer")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| QuestionIssue::NeedsStringAnswer { id: id.clone() })
    };

    let kind = match kind {
        "multiple_choice" => {
            let choices = string_list(field("choices"))
                .filter(|choices| {
                    choices.iter().map(|c| normalize(c)).collect::<HashSet<_>>().len() >= 2
                })
                .ok_or_else(|| QuestionIssue::NeedsChoices { id: id.clone() })?;
            QuestionKind::MultipleChoice {
                choices,
                answer: string_answer()?,
            }
        }
        "true_false" => QuestionKind::TrueFalse {
            answer: field("answer")
                .and_then(Value::as_bool)
                .ok_or_else(|| QuestionIssue::NeedsBoolAnswer { id: id.clone() })?,
        },
        "short_answer" => QuestionKind::ShortAnswer {
            answer: string_answer()?,
        },
        "order" => {
            let items = string_list(field("items"))
                .filter(|items| items.len() >= 2)
                .ok_or_else(|| QuestionIssue::NeedsItems { id: id.clone() })?;
            let answer_order = string_list(field("answerOrder"))
                .filter(|order| is_permutation(&items, order))
                .ok_or_else(|| QuestionIssue::NeedsAnswerOrder { id: id.clone() })?;
            QuestionKind::Order {
                items,
                answer_order,
            }
        }
        other => {
            return Err(QuestionIssue::UnsupportedType {
                id,
                kind: other.to_owned(),
            });
        }
    };

    Ok(Question::new(QuestionId::new(id), prompt, kind))
}

fn is_permutation(items: &[String], order: &[String]) -> bool {
    if items.len() != order.len() {
        return false;
    }
    let mut a: Vec<String> = items.iter().map(|s| normalize(s)).collect();
    let mut b: Vec<String> = order.iter().map(|s| normalize(s)).collect();
    a.sort();
    b.sort();
    a == b
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
