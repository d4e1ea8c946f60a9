use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::profile::Difficulty;
use crate::summary::SessionSummary;

/// One line of `history.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub game: String,
    pub difficulty: Difficulty,
    pub rounds: usize,
    pub score: u64,
    pub best_streak: u32,
    pub accuracy: f64,
    pub mean_response_ms: f64,
    pub hints_used: u32,
}

impl HistoryEntry {
    pub fn new(game_id: &str, difficulty: Difficulty, summary: &SessionSummary) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            game: game_id.to_string(),
            difficulty,
            rounds: summary.rounds,
            score: summary.score,
            best_streak: summary.best_streak,
            accuracy: summary.accuracy,
            mean_response_ms: summary.mean_response_ms,
            hints_used: summary.hints_used,
        }
    }
}

/// Append-only CSV log of completed sessions
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn open_default() -> Result<Self, StoreError> {
        AppDirs::history_path()
            .map(Self::with_path)
            .ok_or(StoreError::NoDataDir)
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // header only for a fresh file
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    /// All entries, oldest first; an absent log is empty
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for entry in reader.deserialize() {
            entries.push(entry?);
        }
        Ok(entries)
    }
}
