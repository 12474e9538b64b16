use clap::{Args, Parser, Subcommand};

use quiz_core::model::{Catalog, QuizSelection, SessionSettings};

/// Timed multiple-choice quizzes in the terminal.
#[derive(Debug, Parser)]
#[command(name = "quiz", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// `SQLite` database for history and the saved session
    #[arg(
        long = "db",
        global = true,
        env = "QUIZ_DB_URL",
        default_value = "sqlite://quiz.sqlite3"
    )]
    pub db_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Take a quiz
    Play(PlayArgs),
    /// Show past results and per-subject stats
    History(HistoryArgs),
    /// List subjects, topics, and difficulties
    Catalog,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    #[arg(short, long, env = "QUIZ_USER")]
    pub user: String,

    #[arg(short, long, required_unless_present = "resume")]
    pub subject: Option<String>,

    #[arg(short, long, required_unless_present = "resume")]
    pub topic: Option<String>,

    #[arg(short, long, default_value = "Medium")]
    pub difficulty: String,

    /// Base URL of the question generator
    #[arg(long, env = "QUIZ_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Seconds allowed per question
    #[arg(long, default_value_t = SessionSettings::DEFAULT_TIME_LIMIT_SECS)]
    pub time_limit: u32,

    /// Number of questions to request
    #[arg(long, default_value_t = SessionSettings::DEFAULT_QUESTION_COUNT)]
    pub questions: u32,

    /// Continue the saved session instead of starting a new one
    #[arg(long)]
    pub resume: bool,
}

impl PlayArgs {
    /// Validated session settings from the timing flags.
    ///
    /// # Errors
    ///
    /// Returns `quiz_core::Error::Settings` for out-of-range values.
    pub fn settings(&self) -> Result<SessionSettings, quiz_core::Error> {
        Ok(SessionSettings::new(self.time_limit, self.questions)?)
    }

    /// Catalog selection from the subject flags, if both were given.
    ///
    /// # Errors
    ///
    /// Returns `quiz_core::Error::Selection` when the catalog rejects a name.
    pub fn selection(&self) -> Result<Option<QuizSelection>, quiz_core::Error> {
        let (Some(subject), Some(topic)) = (&self.subject, &self.topic) else {
            return Ok(None);
        };
        Ok(Some(Catalog.select(subject, topic, &self.difficulty)?))
    }
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(short, long, env = "QUIZ_USER")]
    pub user: String,

    /// Number of recent attempts to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use quiz_core::model::Difficulty;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_builds_a_normalized_selection() {
        let cli = parse(&[
            "quiz", "play", "--user", "ada", "--subject", "science", "--topic", "physics", "-d",
            "hard",
        ]);
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        let selection = args.selection().unwrap().unwrap();
        assert_eq!(selection.subject, "Science");
        assert_eq!(selection.topic, "Physics");
        assert_eq!(selection.difficulty, Difficulty::Hard);
        assert_eq!(args.settings().unwrap(), SessionSettings::default());
    }

    #[test]
    fn resume_does_not_need_a_subject() {
        let cli = parse(&["quiz", "play", "--user", "ada", "--resume"]);
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert!(args.resume);
        assert!(args.selection().unwrap().is_none());
    }

    #[test]
    fn play_without_subject_or_resume_is_rejected() {
        assert!(Cli::try_parse_from(["quiz", "play", "--user", "ada"]).is_err());
    }

    #[test]
    fn unknown_topic_is_a_selection_error() {
        let cli = parse(&[
            "quiz", "play", "--user", "ada", "--subject", "History", "--topic", "Future",
        ]);
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert!(matches!(
            args.selection().unwrap_err(),
            quiz_core::Error::Selection(_)
        ));
    }

    #[test]
    fn zero_time_limit_is_a_settings_error() {
        let cli = parse(&[
            "quiz", "play", "--user", "ada", "--resume", "--time-limit", "0",
        ]);
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert!(matches!(
            args.settings().unwrap_err(),
            quiz_core::Error::Settings(_)
        ));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["quiz", "-v", "-q", "catalog"]).is_err());
    }
}
