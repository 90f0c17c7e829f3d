mod engine;
mod plan;
mod state;
mod view;

pub use engine::SessionEngine;
pub use plan::{CHALLENGE_LENGTH, QueuePlanner};
pub use state::POINTS_PER_CORRECT;
pub use view::{Advance, AnswerFeedback, QuestionView, SessionProgress, StudyCard};
