use crate::model::ids::QuestionId;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Type-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Pick one of `choices`; `answer` is compared by value.
    MultipleChoice { choices: Vec<String>, answer: String },
    TrueFalse { answer: bool },
    /// Free text, checked strictly or leniently.
    ShortAnswer { answer: String },
    /// Arrange `items` into `answer_order`.
    Order {
        items: Vec<String>,
        answer_order: Vec<String>,
    },
}

impl QuestionKind {
    /// Friendly label shown on study cards.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "Multiple Choice",
            QuestionKind::TrueFalse { .. } => "True or False",
            QuestionKind::ShortAnswer { .. } => "Fill in the Blank",
            QuestionKind::Order { .. } => "Put in Order",
        }
    }

    /// Whether the answer comes from a fixed selection rather than typing.
    #[must_use]
    pub fn is_choice_based(&self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice { .. } | QuestionKind::TrueFalse { .. }
        )
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    kind: QuestionKind,
}

impl Question {
    /// Build a question from already-validated parts.
    ///
    /// Content files go through `QuizContent::from_json_str`, which enforces
    /// the shape rules; this constructor does not repeat them.
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    /// The expected answer rendered for display.
    #[must_use]
    pub fn answer_text(&self) -> String {
        match &self.kind {
            QuestionKind::MultipleChoice { answer, .. } | QuestionKind::ShortAnswer { answer } => {
                answer.clone()
            }
            QuestionKind::TrueFalse { answer: true } => "True".to_owned(),
            QuestionKind::TrueFalse { answer: false } => "False".to_owned(),
            QuestionKind::Order { answer_order, .. } => answer_order.join(" → "),
        }
    }

    /// Feedback line shown after a wrong answer.
    #[must_use]
    pub fn wrong_feedback(&self) -> String {
        match &self.kind {
            QuestionKind::Order { .. } => format!("Correct order: {}.", self.answer_text()),
            _ => format!("The answer is: {}.", self.answer_text()),
        }
    }
}

//
// ─── SUBMITTED ANSWER ──────────────────────────────────────────────────────────
//

/// A typed answer coming back from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Selected choice of a multiple-choice question.
    Choice(String),
    Bool(bool),
    Text(String),
    /// Items in the order the player arranged them.
    Order(Vec<String>),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
