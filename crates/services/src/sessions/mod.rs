mod driver;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use driver::{DriveOutcome, SessionCommand, SessionEvent, drive_session};
pub use service::{QuizSession, SessionStep};
pub use view::{HistoryListItem, HistoryService, SubjectStatsItem};
pub use workflow::QuizLoopService;
