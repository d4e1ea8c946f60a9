use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::problem::{generate_distinct, ProblemSource, MAX_ATTEMPTS};
use crate::profile::DifficultyProfile;

static WORD_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("word list {0} not found")]
    NotFound(String),

    #[error("word list {0} is not valid UTF-8")]
    Encoding(String),

    #[error("word list {name} is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("word list {0} is empty")]
    Empty(String),
}

/// Embedded word list, stored as `src/words/<name>.json`
#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub words: Vec<String>,
}

impl WordList {
    pub fn load(name: &str) -> Result<Self, SourceError> {
        let file = WORD_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| SourceError::NotFound(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| SourceError::Encoding(name.to_string()))?;
        let list: WordList =
            serde_json::from_str(contents).map_err(|source| SourceError::Malformed {
                name: name.to_string(),
                source,
            })?;
        Self::from_words(list.name, list.words)
    }

    /// Normalises to lowercase, drops blanks and duplicates
    pub fn from_words(name: String, words: Vec<String>) -> Result<Self, SourceError> {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .unique()
            .collect();
        if words.is_empty() {
            return Err(SourceError::Empty(name));
        }
        Ok(Self { name, words })
    }

    /// Words whose letter count lies in `min..=max`, or the whole list when none do
    pub fn within(&self, min: usize, max: usize) -> Vec<&str> {
        let matching: Vec<&str> = self
            .words
            .iter()
            .map(String::as_str)
            .filter(|w| (min..=max).contains(&w.chars().count()))
            .collect();
        if matching.is_empty() {
            warn!(list = %self.name, min, max, "no words in length range, using whole list");
            return self.words.iter().map(String::as_str).collect();
        }
        matching
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrambleChallenge {
    pub word: String,
    pub scrambled: String,
}

impl fmt::Display for ScrambleChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spaced = self.scrambled.chars().map(|c| c.to_ascii_uppercase()).join(" ");
        write!(f, "{spaced}")
    }
}

/// Unscramble a shuffled word
pub struct WordScrambleSource {
    list: WordList,
    rng: StdRng,
    previous: Option<String>,
}

impl WordScrambleSource {
    pub fn new(list: WordList) -> Self {
        Self::with_rng(list, StdRng::from_entropy())
    }

    pub fn seeded(list: WordList, seed: u64) -> Self {
        Self::with_rng(list, StdRng::seed_from_u64(seed))
    }

    /// Loads the embedded english list
    pub fn english() -> Result<Self, SourceError> {
        Ok(Self::new(WordList::load("english")?))
    }

    fn with_rng(list: WordList, rng: StdRng) -> Self {
        Self {
            list,
            rng,
            previous: None,
        }
    }

    pub fn word_list(&self) -> &WordList {
        &self.list
    }
}

/// Shuffles the letters of `word` so the result differs from it whenever the
/// word has at least two distinct letters
pub fn scramble(rng: &mut StdRng, word: &str) -> String {
    let letters: Vec<char> = word.chars().collect();
    if letters.iter().all_equal() {
        return word.to_string();
    }
    for _ in 0..MAX_ATTEMPTS {
        let mut shuffled = letters.clone();
        shuffled.shuffle(rng);
        let candidate: String = shuffled.into_iter().collect();
        if candidate != word {
            return candidate;
        }
    }
    // rotating a word that is not a single repeated letter always changes it
    let mut rotated = letters;
    rotated.rotate_left(1);
    rotated.into_iter().collect()
}

impl ProblemSource for WordScrambleSource {
    type Challenge = ScrambleChallenge;
    type Answer = String;

    fn game_id(&self) -> &'static str {
        "words"
    }

    fn next(&mut self, profile: &DifficultyProfile) -> ScrambleChallenge {
        let candidates = self
            .list
            .within(profile.content.min_word_len, profile.content.max_word_len);
        let rng = &mut self.rng;
        let previous = self.previous.as_deref();

        let word = generate_distinct(
            previous.as_ref(),
            || candidates.choose(rng).copied().unwrap_or_default(),
            |w| {
                // next word in the list; only equal to `w` when no alternative exists
                let idx = candidates.iter().position(|c| *c == w).unwrap_or(0);
                candidates[(idx + 1) % candidates.len()]
            },
        )
        .to_string();

        let scrambled = scramble(&mut self.rng, &word);
        self.previous = Some(word.clone());
        ScrambleChallenge { word, scrambled }
    }

    fn validate(&self, challenge: &ScrambleChallenge, answer: &String) -> bool {
        answer.trim().to_lowercase() == challenge.word
    }

    fn parse_answer(&self, input: &str) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        Some(trimmed.to_string())
    }

    fn reveal(&self, challenge: &ScrambleChallenge) -> String {
        challenge.word.clone()
    }

    fn hint(&self, challenge: &ScrambleChallenge, level: u32) -> Option<String> {
        let len = challenge.word.chars().count();
        let shown = level as usize + 1;
        if shown >= len {
            return None;
        }
        let prefix: String = challenge.word.chars().take(shown).collect();
        Some(format!("starts with \"{prefix}\" ({len} letters)"))
    }
}
