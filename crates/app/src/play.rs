use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, bail};
use quiz_core::EngineError;
use quiz_core::model::{SessionPhase, SessionState, SessionTally};
use quiz_core::time::format_seconds;
use services::{
    AppServices, DriveOutcome, QuizSession, SessionCommand, SessionEvent, SessionStep,
    drive_session,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::PlayArgs;

const TICK: Duration = Duration::from_secs(1);

/// Map one line of player input to a driver command.
///
/// Options are numbered from 1 on screen.
pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "n" | "next" => Some(SessionCommand::Next),
        "q" | "quit" => Some(SessionCommand::Quit),
        "x" | "abandon" => Some(SessionCommand::Abandon),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(SessionCommand::Answer),
    }
}

pub async fn run(app: &AppServices, args: &PlayArgs) -> anyhow::Result<()> {
    let user = app.auth().login(&args.user)?;
    let quiz_loop = app.quiz_loop();

    let resumed = if args.resume {
        let found = quiz_loop.resume_session(&user).await?;
        if found.is_none() {
            println!("No saved quiz for {}.", user.username);
        }
        found
    } else {
        None
    };

    let mut session = match resumed {
        Some(session) => session,
        None => {
            let Some(selection) = args.selection()? else {
                bail!("--subject and --topic are required to start a new quiz");
            };
            println!(
                "Fetching {} {} questions on {}...",
                args.questions, selection.difficulty, selection.generator_topic()
            );
            quiz_loop
                .start_session(&user, selection, &mut rand::rng())
                .await
                .context("could not start the quiz")?
        }
    };

    print_header(&session);
    let mut renderer = Renderer::default();
    renderer.show(session.engine().state(), session.engine().remaining_seconds());

    let (commands_tx, commands_rx) = mpsc::channel(16);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    spawn_input(commands_tx);

    let render = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            renderer.handle(&event);
        }
    });

    let outcome = drive_session(&quiz_loop, &mut session, commands_rx, events_tx, TICK).await?;
    if let Err(err) = render.await {
        debug!(error = %err, "render task ended abnormally");
    }

    match outcome {
        DriveOutcome::Finished { tally, history_id } => {
            print_tally(&tally);
            if let Some(id) = history_id {
                info!(%id, "result saved");
            }
        }
        DriveOutcome::Suspended => {
            println!(
                "\nQuiz saved. Continue later with `quiz play --user {} --resume`.",
                user.username
            );
        }
        DriveOutcome::Abandoned => println!("\nQuiz abandoned."),
    }
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_input(commands: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!(
                    "Type an option number, n for next, q to save and quit, x to abandon."
                ),
            }
        }
    });
}

fn print_header(session: &QuizSession) {
    let selection = session.selection();
    let progress = session.engine().state().progress();
    println!(
        "\n{} / {} ({}), {} questions, {} per question",
        selection.subject,
        selection.topic,
        selection.difficulty,
        progress.total,
        format_seconds(session.engine().time_limit_secs()),
    );
    println!("Answer with the option number. n = next, q = save and quit, x = abandon.");
}

fn print_tally(tally: &SessionTally) {
    println!("\n==== Result ====");
    println!("Score:      {}/{}", tally.correct, tally.total_questions);
    println!("Wrong:      {}", tally.wrong);
    println!("Accuracy:   {:.0}%", tally.accuracy_percent());
    println!("Time used:  {}", format_seconds(tally.total_seconds_used));
    println!("Per answer: {:.1}s", tally.average_seconds_per_question());
}

/// Turns session snapshots into terminal output.
#[derive(Debug, Default)]
struct Renderer {
    shown_index: Option<usize>,
    shown_phase: Option<SessionPhase>,
}

impl Renderer {
    fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Updated(step) => self.update(step),
            SessionEvent::Rejected(err) => match err {
                EngineError::AlreadyAnswered => {
                    println!("\nAlready answered. Press n for the next question.");
                }
                EngineError::InvalidOptionIndex { len, .. } => {
                    println!("\nChoose an option between 1 and {len}.");
                }
                EngineError::SessionFinished => {}
                other => println!("\n{other}"),
            },
        }
    }

    fn update(&mut self, step: &SessionStep) {
        if step.timed_out {
            println!("\nTime's up!");
        }
        if step.tally.is_some() {
            return;
        }
        self.show(&step.state, step.remaining_seconds);
    }

    fn show(&mut self, state: &SessionState, remaining: u32) {
        let index = state.active_index();
        let phase = state.phase();

        if self.shown_index != Some(index) {
            self.shown_index = Some(index);
            self.shown_phase = Some(phase);
            print_question(state);
            print_countdown(remaining);
            return;
        }

        if self.shown_phase != Some(phase) {
            self.shown_phase = Some(phase);
            if phase == SessionPhase::AnswerRecorded {
                print_feedback(state);
            }
            return;
        }

        if phase == SessionPhase::AwaitingAnswer {
            print_countdown(remaining);
        }
    }
}

fn print_question(state: &SessionState) {
    let Some(question) = state.current_question() else {
        return;
    };
    let progress = state.progress();
    println!(
        "\nQuestion {}/{}: {}",
        state.active_index() + 1,
        progress.total,
        question.text()
    );
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn print_feedback(state: &SessionState) {
    let Some(question) = state.current_question() else {
        return;
    };
    match state.selection_is_correct() {
        Some(true) => println!("\nCorrect! Press n to continue."),
        Some(false) => println!(
            "\nWrong. The answer was: {}. Press n to continue.",
            question.correct_answer()
        ),
        None => {}
    }
}

fn print_countdown(remaining: u32) {
    if let Err(err) = write_countdown(&mut std::io::stdout(), remaining) {
        debug!(error = %err, "countdown not written");
    }
}

/// Redraw the countdown in place on the current line.
fn write_countdown<W: Write>(out: &mut W, remaining: u32) -> std::io::Result<()> {
    write!(out, "\r  time left {} ", format_seconds(remaining))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_one_based() {
        assert_eq!(parse_command("1"), Some(SessionCommand::Answer(0)));
        assert_eq!(parse_command(" 4 \n"), Some(SessionCommand::Answer(3)));
        assert_eq!(parse_command("0"), None);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn countdown_redraws_the_current_line() {
        let mut out = Vec::new();
        write_countdown(&mut out, 65).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\r  time left 1:05 ");
    }

    #[test]
    fn countdown_reports_flush_failures() {
        let err = write_countdown(&mut BrokenPipe, 5).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn letters_map_to_navigation() {
        assert_eq!(parse_command("n"), Some(SessionCommand::Next));
        assert_eq!(parse_command("NEXT"), Some(SessionCommand::Next));
        assert_eq!(parse_command("q"), Some(SessionCommand::Quit));
        assert_eq!(parse_command("abandon"), Some(SessionCommand::Abandon));
        assert_eq!(parse_command("maybe"), None);
        assert_eq!(parse_command(""), None);
    }
}
