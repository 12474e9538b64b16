#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod question_source;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use auth_service::{AuthService, UserSession};
pub use error::{AppServicesError, AuthError, QuestionSourceError, SessionError};
pub use question_source::{
    HttpQuestionSource, QuestionRequest, QuestionSource, QuestionSourceConfig,
    StaticQuestionSource,
};

pub use sessions::{
    DriveOutcome, HistoryListItem, HistoryService, QuizLoopService, QuizSession, SessionCommand,
    SessionEvent, SessionStep, SubjectStatsItem, drive_session,
};
