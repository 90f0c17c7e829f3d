mod ids;
pub mod mastery;
mod progress;
mod question;
mod session;

pub use ids::{QuestionId, QuizFile};
pub use mastery::{MAX_MASTERY, MasteryRecord};
pub use progress::{LevelUp, Progress, ProgressError, XpAward};
pub use question::{Answer, Question, QuestionKind};
pub use session::{
    ChallengeOutcome, ChallengeResult, CompletionReason, Mode, ParseModeError, Player,
    SessionSummary,
};
