use itertools::Itertools;

use crate::progression::ScorePoint;
use crate::session::{Outcome, RoundRecord};
use crate::util::{mean, percent, std_dev};

/// Results of a session, computed from its round records
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub rounds: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub timed_out: usize,
    pub hints_used: u32,
    /// whole-number percentage of correct rounds
    pub accuracy: f64,
    pub mean_response_ms: f64,
    pub response_std_dev_ms: f64,
    pub score: u64,
    pub best_streak: u32,
    pub progression: Vec<ScorePoint>,
}

impl SessionSummary {
    pub fn from_records(records: &[RoundRecord], score: u64, best_streak: u32) -> Self {
        let counts = records.iter().counts_by(|r| r.outcome);
        let count = |outcome: Outcome| counts.get(&outcome).copied().unwrap_or(0);
        let correct = count(Outcome::Correct);

        // timeouts would only drag the mean towards the budget
        let response_ms: Vec<f64> = records
            .iter()
            .filter(|r| r.outcome != Outcome::TimedOut)
            .map(|r| r.response_time.as_secs_f64() * 1000.0)
            .collect();

        let mut progression = vec![ScorePoint::new(0, 0)];
        progression.extend(
            records
                .iter()
                .map(|r| ScorePoint::new(r.round, r.score_after)),
        );

        Self {
            rounds: records.len(),
            correct,
            incorrect: count(Outcome::Incorrect),
            timed_out: count(Outcome::TimedOut),
            hints_used: records.iter().map(|r| r.hints_used).sum(),
            accuracy: percent(correct, records.len()),
            mean_response_ms: mean(&response_ms).unwrap_or(0.0).round(),
            response_std_dev_ms: std_dev(&response_ms).unwrap_or(0.0),
            score,
            best_streak,
            progression,
        }
    }
}
