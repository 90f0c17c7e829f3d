#![forbid(unsafe_code)]

pub mod app_services;
pub mod content_service;
pub mod error;
pub mod ledger;
pub mod rewards;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::{DEFAULT_QUIZ_FILE, QuizServices};
pub use content_service::ContentService;
pub use error::{AppServicesError, ContentServiceError, LedgerError, SessionError, SoftRejection};
pub use ledger::{Ledger, ProgressLedger};
pub use rewards::{RewardBus, RewardEvent, RewardHook, RewardLog};
pub use sessions::{
    Advance, AnswerFeedback, QuestionView, SessionEngine, SessionProgress, StudyCard,
};
