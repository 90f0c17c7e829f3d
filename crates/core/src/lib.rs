#![forbid(unsafe_code)]

pub mod achievements;
pub mod content;
pub mod levels;
pub mod matching;
pub mod model;
pub mod time;

pub use content::{ContentError, QuestionIssue, QuizContent};
pub use time::Clock;
