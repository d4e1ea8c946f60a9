use std::fmt;

use crate::profile::DifficultyProfile;

/// Upper bound for retry-until-different generation loops
pub const MAX_ATTEMPTS: usize = 32;

/// Pluggable generator and validator of game-specific challenges
pub trait ProblemSource {
    type Challenge: Clone + fmt::Debug + fmt::Display;
    type Answer;

    /// Stable identifier used in best-score keys and the history log
    fn game_id(&self) -> &'static str;

    /// Produce the next challenge. Must not repeat the previous one when an
    /// alternative exists.
    fn next(&mut self, profile: &DifficultyProfile) -> Self::Challenge;

    /// Total over every answer `parse_answer` can produce
    fn validate(&self, challenge: &Self::Challenge, answer: &Self::Answer) -> bool;

    /// `None` for input that is not a syntactically valid answer
    fn parse_answer(&self, input: &str) -> Option<Self::Answer>;

    /// The correct answer, shown while the round is in feedback
    fn reveal(&self, challenge: &Self::Challenge) -> String;

    /// Hint number `level` (0-based) for the challenge, if the game has one
    fn hint(&self, _challenge: &Self::Challenge, _level: u32) -> Option<String> {
        None
    }
}

/// Retry `generate` until it differs from `previous`, at most `MAX_ATTEMPTS`
/// times, then hand the last candidate to `fallback` to force a difference.
pub fn generate_distinct<T, G, F>(previous: Option<&T>, mut generate: G, fallback: F) -> T
where
    T: PartialEq,
    G: FnMut() -> T,
    F: FnOnce(T) -> T,
{
    let Some(previous) = previous else {
        return generate();
    };
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate();
        if candidate != *previous {
            return candidate;
        }
    }
    fallback(generate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_used_without_previous() {
        let mut calls = 0;
        let value = generate_distinct(
            None,
            || {
                calls += 1;
                7
            },
            |v| v + 1,
        );
        assert_eq!(value, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_until_different() {
        let mut seq = [3, 3, 3, 4].into_iter();
        let value = generate_distinct(Some(&3), || seq.next().unwrap_or(9), |v| v);
        assert_eq!(value, 4);
    }

    #[test]
    fn falls_back_after_bounded_attempts() {
        let mut calls = 0;
        let value = generate_distinct(
            Some(&1),
            || {
                calls += 1;
                1
            },
            |v| v + 1,
        );
        assert_eq!(value, 2);
        assert_eq!(calls, MAX_ATTEMPTS + 1);
    }
}
