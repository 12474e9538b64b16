use std::time::Duration;

use quiz_core::EngineError;
use quiz_core::model::{HistoryEntryId, SessionTally};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::service::{QuizSession, SessionStep};
use super::workflow::QuizLoopService;
use crate::error::SessionError;

/// Input from the host while a session is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Choose the option at this zero-based index.
    Answer(usize),
    /// Move on to the next question.
    Next,
    /// Stop driving but keep the cached session for a later resume.
    Quit,
    /// Stop driving and throw the attempt away.
    Abandon,
}

/// Published after every tick or command that was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Updated(SessionStep),
    /// A command the engine refused, e.g. a second answer for one question.
    Rejected(EngineError),
}

/// How a driven session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveOutcome {
    Finished {
        tally: SessionTally,
        history_id: Option<HistoryEntryId>,
    },
    /// The host went away or asked to quit. The cache still holds the attempt.
    Suspended,
    Abandoned,
}

/// Run the countdown and host commands for `session` on the current task.
///
/// Ticks and commands are applied one at a time, so the engine never sees
/// concurrent mutation. The countdown restarts whenever the active question
/// changes. The interval is dropped as soon as the session finishes or the
/// host stops driving it.
///
/// # Errors
///
/// Returns `SessionError` when persisting a step fails. Engine rejections
/// are reported as `SessionEvent::Rejected` and do not stop the loop.
pub async fn drive_session(
    service: &QuizLoopService,
    session: &mut QuizSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    period: Duration,
) -> Result<DriveOutcome, SessionError> {
    if let Some(tally) = session.tally() {
        return Ok(DriveOutcome::Finished {
            tally,
            history_id: session.history_id(),
        });
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let shown_index = session.engine().state().active_index();
        let step = tokio::select! {
            _ = ticker.tick() => {
                if !session.engine().timer_running() {
                    continue;
                }
                service.tick(session).await?
            }
            command = commands.recv() => match command {
                None | Some(SessionCommand::Quit) => {
                    info!(user = %session.owner(), "session suspended");
                    return Ok(DriveOutcome::Suspended);
                }
                Some(SessionCommand::Abandon) => {
                    service.abandon(session).await?;
                    return Ok(DriveOutcome::Abandoned);
                }
                Some(SessionCommand::Answer(index)) => {
                    match rejectable(service.answer(session, index).await)? {
                        Ok(step) => step,
                        Err(err) => {
                            publish(&events, SessionEvent::Rejected(err));
                            continue;
                        }
                    }
                }
                Some(SessionCommand::Next) => {
                    match rejectable(service.advance(session).await)? {
                        Ok(step) => step,
                        Err(err) => {
                            publish(&events, SessionEvent::Rejected(err));
                            continue;
                        }
                    }
                }
            },
        };

        let finished = step.tally.map(|tally| (tally, step.history_id));
        if step.state.active_index() != shown_index {
            // Each question gets a full period before its first tick.
            ticker.reset();
        }
        publish(&events, SessionEvent::Updated(step));

        if let Some((tally, history_id)) = finished {
            return Ok(DriveOutcome::Finished { tally, history_id });
        }
    }
}

/// Split engine rejections from failures that should end the loop.
fn rejectable(
    result: Result<SessionStep, SessionError>,
) -> Result<Result<SessionStep, EngineError>, SessionError> {
    match result {
        Ok(step) => Ok(Ok(step)),
        Err(SessionError::Engine(err)) => Ok(Err(err)),
        Err(other) => Err(other),
    }
}

fn publish(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        debug!("session event receiver dropped");
    }
}
