use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::profile::{Difficulty, DifficultyProfile, GameKind};

/// Stored defaults; every field can be overridden on the command line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub game: GameKind,
    pub difficulty: Difficulty,
    /// overrides the preset's round count
    pub rounds: Option<u32>,
    /// overrides the preset's per-round time budget
    pub seconds: Option<u64>,
    /// overrides the preset's hint budget
    pub hints: Option<u32>,
    pub save_scores: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameKind::Arithmetic,
            difficulty: Difficulty::Medium,
            rounds: None,
            seconds: None,
            hints: None,
            save_scores: true,
        }
    }
}

impl Config {
    /// The difficulty preset with this config's overrides applied
    pub fn to_profile(&self) -> DifficultyProfile {
        let mut profile = DifficultyProfile::preset(self.difficulty);
        if let Some(rounds) = self.rounds {
            profile = profile.with_max_rounds(Some(rounds));
        }
        if let Some(secs) = self.seconds {
            profile = profile.with_time_budget(Duration::from_secs(secs));
        }
        if let Some(hints) = self.hints {
            profile = profile.with_hint_budget(hints);
        }
        profile
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("quizzle_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
