mod history;
mod ids;
mod question;
mod selection;
mod session;
mod settings;

pub use history::{HistoryEntry, HistoryError, SubjectStats, subject_stats};
pub use ids::{HistoryEntryId, ParseIdError, Username};
pub use question::{Question, QuestionError, QuestionRecord};
pub use selection::{Catalog, Difficulty, QuizSelection, SelectionError, SubjectEntry};
pub use session::{SessionPhase, SessionProgress, SessionState, SessionTally};
pub use settings::{SessionSettings, SettingsError};
