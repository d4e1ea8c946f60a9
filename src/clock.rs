use std::time::Duration;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    #[error("countdown duration must be positive")]
    InvalidDuration,
}

/// Identifies one countdown; bumped on every `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

/// Fired once when a countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub generation: Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
    Expired,
}

/// Cancellable countdown driven by the host loop's ticks
pub trait Clock {
    /// Begin a fresh countdown, superseding any previous one
    fn start(&mut self, duration: Duration) -> Result<Generation, ClockError>;
    fn pause(&mut self);
    /// No-op unless paused
    fn resume(&mut self);
    /// Stops the countdown and suppresses its expiry; idempotent
    fn cancel(&mut self);
    /// Advance by `elapsed` wall time, yielding the expiry at most once per `start`
    fn tick(&mut self, elapsed: Duration) -> Option<Expiry>;
    fn remaining(&self) -> Duration;
    fn generation(&self) -> Generation;
    fn state(&self) -> ClockState;
}

#[derive(Debug, Clone)]
pub struct Countdown {
    state: ClockState,
    remaining: Duration,
    generation: Generation,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            remaining: Duration::ZERO,
            generation: Generation::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Countdown {
    fn start(&mut self, duration: Duration) -> Result<Generation, ClockError> {
        if duration.is_zero() {
            return Err(ClockError::InvalidDuration);
        }
        self.generation = Generation(self.generation.0 + 1);
        self.remaining = duration;
        self.state = ClockState::Running;
        trace!(generation = self.generation.0, ?duration, "countdown started");
        Ok(self.generation)
    }

    fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
        }
    }

    fn cancel(&mut self) {
        // remaining is kept so the host can still show when the answer landed
        if matches!(self.state, ClockState::Running | ClockState::Paused) {
            self.state = ClockState::Stopped;
        }
    }

    fn tick(&mut self, elapsed: Duration) -> Option<Expiry> {
        if self.state != ClockState::Running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.state = ClockState::Expired;
            trace!(generation = self.generation.0, "countdown expired");
            return Some(Expiry {
                generation: self.generation,
            });
        }
        None
    }

    fn remaining(&self) -> Duration {
        self.remaining
    }

    fn generation(&self) -> Generation {
        self.generation
    }

    fn state(&self) -> ClockState {
        self.state
    }
}
