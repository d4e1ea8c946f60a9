use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::profile::Difficulty;

/// Key for one (game, difficulty) pair, e.g. `arithmetic_hard`
pub fn cache_key(game_id: &str, difficulty: Difficulty) -> String {
    format!("{game_id}_{difficulty}")
}

/// Personal-best cache with a write-on-improve policy
pub trait BestScoreStore {
    /// `None` when nothing has been recorded yet
    fn best(&self, game_id: &str, difficulty: Difficulty) -> Result<Option<u64>, StoreError>;

    /// Store `score` only if it beats the stored one; returns whether it did
    fn record(
        &mut self,
        game_id: &str,
        difficulty: Difficulty,
        score: u64,
    ) -> Result<bool, StoreError>;
}

/// SQLite-backed best scores
#[derive(Debug)]
pub struct SqliteBestScores {
    conn: Connection,
}

impl SqliteBestScores {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().ok_or(StoreError::NoDataDir)?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS best_scores (
                key TEXT PRIMARY KEY,
                score INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    /// Every stored entry, highest score first
    pub fn all(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, score FROM best_scores ORDER BY score DESC, key ASC")?;
        let rows = stmt.query_map([], |row| {
            let score: i64 = row.get(1)?;
            Ok((row.get::<_, String>(0)?, score.max(0) as u64))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

impl BestScoreStore for SqliteBestScores {
    fn best(&self, game_id: &str, difficulty: Difficulty) -> Result<Option<u64>, StoreError> {
        let score: Option<i64> = self
            .conn
            .query_row(
                "SELECT score FROM best_scores WHERE key = ?1",
                [cache_key(game_id, difficulty)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score.map(|s| s.max(0) as u64))
    }

    fn record(
        &mut self,
        game_id: &str,
        difficulty: Difficulty,
        score: u64,
    ) -> Result<bool, StoreError> {
        let key = cache_key(game_id, difficulty);
        let changed = self.conn.execute(
            r#"
            INSERT INTO best_scores (key, score, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE
                SET score = excluded.score, updated_at = excluded.updated_at
                WHERE excluded.score > best_scores.score
            "#,
            params![
                key,
                i64::try_from(score).unwrap_or(i64::MAX),
                Local::now().to_rfc3339()
            ],
        )?;
        debug!(%key, score, improved = changed > 0, "best score recorded");
        Ok(changed > 0)
    }
}

/// In-process best scores, for tests and `--no-save` runs
#[derive(Debug, Default, Clone)]
pub struct MemoryBestScores {
    entries: HashMap<String, u64>,
}

impl BestScoreStore for MemoryBestScores {
    fn best(&self, game_id: &str, difficulty: Difficulty) -> Result<Option<u64>, StoreError> {
        Ok(self.entries.get(&cache_key(game_id, difficulty)).copied())
    }

    fn record(
        &mut self,
        game_id: &str,
        difficulty: Difficulty,
        score: u64,
    ) -> Result<bool, StoreError> {
        let entry = self.entries.entry(cache_key(game_id, difficulty));
        match entry {
            std::collections::hash_map::Entry::Occupied(mut stored) => {
                if score > *stored.get() {
                    stored.insert(score);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(score);
                Ok(true)
            }
        }
    }
}
