use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::profile::DifficultyProfile;
use crate::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Status {
    Idle,
    Active,
    Feedback,
    Paused,
    Complete,
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Outcome {
    Correct,
    Incorrect,
    #[strum(serialize = "Timed out")]
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub outcome: Outcome,
    /// score change caused by the answer itself (hint penalties excluded)
    pub points: i64,
    pub score_after: u64,
    pub response_time: Duration,
    pub hints_used: u32,
}

/// State of one play-through; owned by the round state machine
#[derive(Debug, Clone)]
pub struct Session<C> {
    pub profile: DifficultyProfile,
    pub status: Status,
    /// status to return to on resume
    pub paused_from: Option<Status>,
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub round_index: u32,
    pub hints_remaining: u32,
    pub hints_this_round: u32,
    pub challenge: Option<C>,
    pub records: Vec<RoundRecord>,
}

impl<C> Session<C> {
    pub fn new(profile: DifficultyProfile, first: C) -> Self {
        let hints_remaining = profile.hint_budget;
        Self {
            profile,
            status: Status::Active,
            paused_from: None,
            score: 0,
            streak: 0,
            best_streak: 0,
            round_index: 1,
            hints_remaining,
            hints_this_round: 0,
            challenge: Some(first),
            records: Vec::new(),
        }
    }

    pub fn has_more_rounds(&self) -> bool {
        self.profile
            .max_rounds
            .map_or(true, |max| self.round_index < max)
    }

    /// Close the active round as correct and return its record
    pub fn record_correct(&mut self, remaining: Duration) -> RoundRecord {
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        let points = scoring::correct_points(
            &self.profile.scoring,
            remaining,
            self.profile.time_budget,
            self.streak,
        );
        self.score += points;
        self.finish_round(Outcome::Correct, points as i64, remaining)
    }

    /// Close the active round as a miss (wrong answer or timeout)
    pub fn record_miss(&mut self, outcome: Outcome, remaining: Duration) -> RoundRecord {
        let penalty = match outcome {
            Outcome::TimedOut => self.profile.scoring.timeout_penalty,
            _ => self.profile.scoring.penalty,
        };
        let before = self.score;
        self.score = scoring::apply_penalty(self.score, penalty);
        self.streak = 0;
        self.finish_round(outcome, self.score as i64 - before as i64, remaining)
    }

    fn finish_round(&mut self, outcome: Outcome, points: i64, remaining: Duration) -> RoundRecord {
        let record = RoundRecord {
            round: self.round_index,
            outcome,
            points,
            score_after: self.score,
            response_time: self.profile.time_budget.saturating_sub(remaining),
            hints_used: self.hints_this_round,
        };
        self.records.push(record);
        self.status = Status::Feedback;
        record
    }

    /// Begin the next round with `challenge`
    pub fn begin_round(&mut self, challenge: C) {
        self.round_index += 1;
        self.hints_this_round = 0;
        self.challenge = Some(challenge);
        self.status = Status::Active;
    }

    /// Spend one hint; returns false when the budget is exhausted
    pub fn spend_hint(&mut self) -> bool {
        if self.hints_remaining == 0 {
            return false;
        }
        self.hints_remaining -= 1;
        self.hints_this_round += 1;
        self.score = scoring::apply_penalty(self.score, self.profile.scoring.hint_penalty);
        true
    }
}

/// What the presentation layer sees after every transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: Status,
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub round_index: u32,
    pub max_rounds: Option<u32>,
    pub time_remaining: Duration,
    pub time_budget: Duration,
    pub hints_remaining: u32,
    pub last_round: Option<RoundRecord>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            score: 0,
            streak: 0,
            best_streak: 0,
            round_index: 0,
            max_rounds: None,
            time_remaining: Duration::ZERO,
            time_budget: Duration::ZERO,
            hints_remaining: 0,
            last_round: None,
        }
    }

    pub fn from_session<C>(session: &Session<C>, time_remaining: Duration) -> Self {
        Self {
            status: session.status,
            score: session.score,
            streak: session.streak,
            best_streak: session.best_streak,
            round_index: session.round_index,
            max_rounds: session.profile.max_rounds,
            time_remaining,
            time_budget: session.profile.time_budget,
            hints_remaining: session.hints_remaining,
            last_round: session.records.last().copied(),
        }
    }

    /// Fraction of the round's time still left, 0.0..=1.0
    pub fn time_ratio(&self) -> f64 {
        if self.time_budget.is_zero() {
            return 0.0;
        }
        (self.time_remaining.as_secs_f64() / self.time_budget.as_secs_f64()).clamp(0.0, 1.0)
    }
}
