//! The round state machine shared by every game.
//!
//! A session moves `Idle -> Active -> Feedback -> Active ... -> Complete`, with
//! `Paused` reachable from `Active` and `Feedback`, and `exit` dropping back to
//! `Idle` from any live state. Every entry point checks the current status
//! first, so actions that arrive after a transition already happened (a late
//! clock expiry, a double submit) are ignored instead of applied twice.

use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, Countdown, Expiry};
use crate::problem::ProblemSource;
use crate::profile::{DifficultyProfile, ProfileError};
use crate::session::{Outcome, RoundRecord, Session, SessionSnapshot, Status};
use crate::summary::SessionSummary;

/// Receives a snapshot after every state transition
pub trait PresentationSink {
    fn on_transition(&mut self, snapshot: &SessionSnapshot);
}

/// Sink for callers that poll `snapshot()` instead
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_transition(&mut self, _snapshot: &SessionSnapshot) {}
}

impl PresentationSink for Vec<SessionSnapshot> {
    fn on_transition(&mut self, snapshot: &SessionSnapshot) {
        self.push(snapshot.clone());
    }
}

pub struct RoundStateMachine<S: ProblemSource, C = Countdown, P = NullSink> {
    source: S,
    clock: C,
    sink: P,
    session: Option<Session<S::Challenge>>,
}

impl<S: ProblemSource> RoundStateMachine<S> {
    pub fn new(source: S) -> Self {
        Self::with_parts(source, Countdown::new(), NullSink)
    }
}

impl<S: ProblemSource, P: PresentationSink> RoundStateMachine<S, Countdown, P> {
    pub fn with_sink(source: S, sink: P) -> Self {
        Self::with_parts(source, Countdown::new(), sink)
    }
}

impl<S, C, P> RoundStateMachine<S, C, P>
where
    S: ProblemSource,
    C: Clock,
    P: PresentationSink,
{
    pub fn with_parts(source: S, clock: C, sink: P) -> Self {
        Self {
            source,
            clock,
            sink,
            session: None,
        }
    }

    /// Start a fresh session, discarding any current one. An invalid profile
    /// is rejected before anything changes.
    #[instrument(skip_all, fields(game = self.source.game_id(), difficulty = %profile.difficulty))]
    pub fn start(&mut self, profile: DifficultyProfile) -> Result<(), ProfileError> {
        profile.validate()?;

        self.clock.cancel();
        let first = self.source.next(&profile);
        self.clock.start(profile.time_budget)?;
        self.session = Some(Session::new(profile, first));

        info!("session started");
        self.notify();
        Ok(())
    }

    /// Judge `answer` against the live challenge. `None` unless a round is active.
    pub fn submit(&mut self, answer: &S::Answer) -> Option<Outcome> {
        let status = self.status();
        if status != Status::Active {
            debug!(%status, "submit ignored");
            return None;
        }
        let session = self.session.as_mut()?;
        let challenge = session.challenge.as_ref()?;
        let correct = self.source.validate(challenge, answer);

        self.clock.cancel();
        let remaining = self.clock.remaining();
        let record = if correct {
            session.record_correct(remaining)
        } else {
            session.record_miss(Outcome::Incorrect, remaining)
        };

        self.log_round(&record);
        self.notify();
        Some(record.outcome)
    }

    /// Parse raw input with the source and submit it. `Err` carries input that
    /// is not a valid answer; it never reaches `validate`.
    pub fn submit_input<'a>(&mut self, input: &'a str) -> Result<Option<Outcome>, &'a str> {
        match self.source.parse_answer(input) {
            Some(answer) => Ok(self.submit(&answer)),
            None => Err(input),
        }
    }

    /// Advance the clock by `elapsed` and apply its expiry, if any
    pub fn tick(&mut self, elapsed: Duration) -> Option<Outcome> {
        let expiry = self.clock.tick(elapsed)?;
        self.clock_expired(expiry)
    }

    /// Handle a countdown expiry. Stale expiries (from an earlier countdown,
    /// or arriving after the round was already decided) are ignored.
    pub fn clock_expired(&mut self, expiry: Expiry) -> Option<Outcome> {
        if expiry.generation != self.clock.generation() {
            debug!(
                stale = expiry.generation.0,
                current = self.clock.generation().0,
                "stale expiry ignored"
            );
            return None;
        }
        if self.status() != Status::Active {
            debug!("expiry ignored outside an active round");
            return None;
        }
        let session = self.session.as_mut()?;

        self.clock.cancel();
        let record = session.record_miss(Outcome::TimedOut, Duration::ZERO);

        self.log_round(&record);
        self.notify();
        Some(record.outcome)
    }

    /// Move on from feedback to the next round, or to `Complete` after the last one
    pub fn advance(&mut self) -> Option<Status> {
        let session = self.session.as_mut().filter(|s| s.status == Status::Feedback)?;

        if session.has_more_rounds() {
            let next = self.source.next(&session.profile);
            session.begin_round(next);
            if let Err(err) = self.clock.start(session.profile.time_budget) {
                warn!(%err, "round clock did not start");
            }
        } else {
            session.status = Status::Complete;
            info!(
                score = session.score,
                best_streak = session.best_streak,
                rounds = session.round_index,
                "session complete"
            );
        }

        let status = session.status;
        self.notify();
        Some(status)
    }

    /// Suspend an active round or the feedback screen; the clock keeps its time
    pub fn pause(&mut self) -> bool {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| matches!(s.status, Status::Active | Status::Feedback))
        else {
            return false;
        };
        session.paused_from = Some(session.status);
        session.status = Status::Paused;
        self.clock.pause();
        self.notify();
        true
    }

    /// Return to whatever was paused; no-op when not paused
    pub fn resume(&mut self) -> bool {
        let Some(session) = self.session.as_mut().filter(|s| s.status == Status::Paused) else {
            return false;
        };
        session.status = session.paused_from.take().unwrap_or(Status::Active);
        if session.status == Status::Active {
            self.clock.resume();
        }
        self.notify();
        true
    }

    /// Abandon the session. Returns its last snapshot so callers can still
    /// read the score; nothing is kept afterwards.
    pub fn exit(&mut self) -> Option<SessionSnapshot> {
        let live = self
            .session
            .as_ref()
            .is_some_and(|s| matches!(s.status, Status::Active | Status::Feedback | Status::Paused));
        if !live {
            return None;
        }
        self.clock.cancel();
        let last = self.snapshot();
        self.session = None;

        info!(score = last.score, round = last.round_index, "session exited");
        self.notify();
        Some(last)
    }

    /// Spend one hint on the active round, applying the hint penalty
    pub fn use_hint(&mut self) -> Option<String> {
        let session = self
            .session
            .as_mut()
            .filter(|s| s.status == Status::Active && s.hints_remaining > 0)?;
        let challenge = session.challenge.as_ref()?;
        let hint = self.source.hint(challenge, session.hints_this_round)?;
        if !session.spend_hint() {
            return None;
        }
        debug!(hints_remaining = session.hints_remaining, "hint used");
        self.notify();
        Some(hint)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.session {
            Some(session) => SessionSnapshot::from_session(session, self.clock.remaining()),
            None => SessionSnapshot::idle(),
        }
    }

    pub fn status(&self) -> Status {
        self.session.as_ref().map_or(Status::Idle, |s| s.status)
    }

    pub fn challenge(&self) -> Option<&S::Challenge> {
        self.session.as_ref()?.challenge.as_ref()
    }

    /// The correct answer, once the round has been decided
    pub fn revealed_answer(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let decided = match session.status {
            Status::Feedback | Status::Complete => true,
            Status::Paused => session.paused_from == Some(Status::Feedback),
            Status::Idle | Status::Active => false,
        };
        if !decided {
            return None;
        }
        session.challenge.as_ref().map(|c| self.source.reveal(c))
    }

    pub fn profile(&self) -> Option<&DifficultyProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn records(&self) -> &[RoundRecord] {
        self.session
            .as_ref()
            .map(|s| s.records.as_slice())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        let session = self.session.as_ref()?;
        Some(SessionSummary::from_records(
            &session.records,
            session.score,
            session.best_streak,
        ))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        self.sink.on_transition(&snapshot);
    }

    fn log_round(&self, record: &RoundRecord) {
        debug!(
            round = record.round,
            outcome = %record.outcome,
            points = record.points,
            score = record.score_after,
            "round decided"
        );
    }
}
