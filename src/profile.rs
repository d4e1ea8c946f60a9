use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::clock::ClockError;

/// Difficulty level a profile was built from; also part of the best-score key
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Games shipped with the crate
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameKind {
    Arithmetic,
    Words,
}

/// Scoring constants applied by the round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// points for any correct answer
    pub base: u32,
    /// maximum bonus, paid in full for an instant answer
    pub time_bonus: u32,
    /// consecutive correct answers needed before the streak bonus kicks in
    pub streak_threshold: u32,
    pub streak_bonus_step: u32,
    pub streak_bonus_cap: u32,
    pub penalty: u32,
    pub timeout_penalty: u32,
    pub hint_penalty: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base: 10,
            time_bonus: 0,
            streak_threshold: 3,
            streak_bonus_step: 5,
            streak_bonus_cap: 25,
            penalty: 0,
            timeout_penalty: 0,
            hint_penalty: 0,
        }
    }
}

/// Parameters handed to problem sources; each game reads the fields it cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParams {
    pub max_operand: u32,
    pub min_word_len: usize,
    pub max_word_len: usize,
}

impl Default for ContentParams {
    fn default() -> Self {
        Self {
            max_operand: 10,
            min_word_len: 3,
            max_word_len: 5,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("time budget per round must be positive")]
    NonPositiveTimeBudget,

    #[error("a session needs at least one round")]
    ZeroRounds,

    #[error("streak threshold must be positive when a streak bonus is configured")]
    ZeroStreakThreshold,

    #[error("invalid content parameters: {0}")]
    InvalidContent(String),

    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Immutable configuration selected before a session starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub difficulty: Difficulty,
    pub time_budget: Duration,
    /// `None` keeps serving rounds until the player exits
    pub max_rounds: Option<u32>,
    pub hint_budget: u32,
    pub scoring: ScoringRules,
    pub content: ContentParams,
}

impl DifficultyProfile {
    pub fn new(difficulty: Difficulty, time_budget: Duration) -> Self {
        Self {
            difficulty,
            time_budget,
            max_rounds: None,
            hint_budget: 0,
            scoring: ScoringRules::default(),
            content: ContentParams::default(),
        }
    }

    /// Built-in tuning for each difficulty level
    pub fn preset(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                difficulty,
                time_budget: Duration::from_secs(20),
                max_rounds: Some(10),
                hint_budget: 3,
                scoring: ScoringRules {
                    base: 10,
                    time_bonus: 5,
                    streak_threshold: 3,
                    streak_bonus_step: 5,
                    streak_bonus_cap: 20,
                    penalty: 0,
                    timeout_penalty: 0,
                    hint_penalty: 2,
                },
                content: ContentParams {
                    max_operand: 10,
                    min_word_len: 3,
                    max_word_len: 4,
                },
            },
            Difficulty::Medium => Self {
                difficulty,
                time_budget: Duration::from_secs(12),
                max_rounds: Some(15),
                hint_budget: 2,
                scoring: ScoringRules {
                    base: 10,
                    time_bonus: 10,
                    streak_threshold: 3,
                    streak_bonus_step: 5,
                    streak_bonus_cap: 25,
                    penalty: 5,
                    timeout_penalty: 0,
                    hint_penalty: 3,
                },
                content: ContentParams {
                    max_operand: 20,
                    min_word_len: 5,
                    max_word_len: 6,
                },
            },
            Difficulty::Hard => Self {
                difficulty,
                time_budget: Duration::from_secs(8),
                max_rounds: Some(20),
                hint_budget: 1,
                scoring: ScoringRules {
                    base: 15,
                    time_bonus: 15,
                    streak_threshold: 3,
                    streak_bonus_step: 10,
                    streak_bonus_cap: 40,
                    penalty: 10,
                    timeout_penalty: 5,
                    hint_penalty: 5,
                },
                content: ContentParams {
                    max_operand: 50,
                    min_word_len: 7,
                    max_word_len: 9,
                },
            },
        }
    }

    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_hint_budget(mut self, hint_budget: u32) -> Self {
        self.hint_budget = hint_budget;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringRules) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_content(mut self, content: ContentParams) -> Self {
        self.content = content;
        self
    }

    /// Rejects profiles no session could be played with
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.time_budget.is_zero() {
            return Err(ProfileError::NonPositiveTimeBudget);
        }
        if self.max_rounds == Some(0) {
            return Err(ProfileError::ZeroRounds);
        }
        if self.scoring.streak_threshold == 0 && self.scoring.streak_bonus_step > 0 {
            return Err(ProfileError::ZeroStreakThreshold);
        }
        if self.content.max_operand == 0 {
            return Err(ProfileError::InvalidContent(
                "max_operand must be positive".to_string(),
            ));
        }
        if self.content.min_word_len == 0 || self.content.min_word_len > self.content.max_word_len
        {
            return Err(ProfileError::InvalidContent(format!(
                "word length range {}..={} is empty",
                self.content.min_word_len, self.content.max_word_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn presets_are_valid() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let profile = DifficultyProfile::preset(difficulty);
            assert_eq!(profile.difficulty, difficulty);
            assert!(profile.validate().is_ok(), "{difficulty} preset rejected");
        }
    }

    #[test]
    fn harder_presets_give_less_time() {
        let easy = DifficultyProfile::preset(Difficulty::Easy);
        let hard = DifficultyProfile::preset(Difficulty::Hard);
        assert!(hard.time_budget < easy.time_budget);
    }

    #[test]
    fn zero_time_budget_is_rejected() {
        let profile = DifficultyProfile::new(Difficulty::Easy, Duration::ZERO);
        assert_matches!(profile.validate(), Err(ProfileError::NonPositiveTimeBudget));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let profile =
            DifficultyProfile::new(Difficulty::Easy, Duration::from_secs(5)).with_max_rounds(Some(0));
        assert_matches!(profile.validate(), Err(ProfileError::ZeroRounds));
    }

    #[test]
    fn zero_streak_threshold_only_matters_with_a_bonus() {
        let mut scoring = ScoringRules {
            streak_threshold: 0,
            ..ScoringRules::default()
        };
        let profile =
            DifficultyProfile::new(Difficulty::Easy, Duration::from_secs(5)).with_scoring(scoring);
        assert_matches!(profile.validate(), Err(ProfileError::ZeroStreakThreshold));

        scoring.streak_bonus_step = 0;
        let profile = profile.with_scoring(scoring);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn empty_word_range_is_rejected() {
        let profile = DifficultyProfile::new(Difficulty::Easy, Duration::from_secs(5)).with_content(
            ContentParams {
                max_operand: 10,
                min_word_len: 6,
                max_word_len: 4,
            },
        );
        assert_matches!(profile.validate(), Err(ProfileError::InvalidContent(_)));
    }

    #[test]
    fn difficulty_displays_lowercase() {
        assert_eq!(Difficulty::Medium.to_string(), "medium");
        assert_eq!(GameKind::Words.to_string(), "words");
    }
}
