//! Device-local persistence for the free-play counter and the leaderboard.
//!
//! Backends are fallible key/value stores. [`Persistence`] sits on top and is
//! best-effort: read failures fall back to defaults and write failures are
//! logged, so storage trouble never becomes a session error.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::models::LeaderboardEntry;

pub const PLAY_COUNT_KEY: &str = "catHideouts_gamesPlayed";
pub const LEADERBOARD_KEY: &str = "catHideouts_leaderboard";

pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Persistence {
    backend: Arc<dyn KeyValueBackend>,
}

impl Persistence {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn play_count(&self) -> u32 {
        self.read_or_default(PLAY_COUNT_KEY)
    }

    pub fn set_play_count(&self, count: u32) {
        self.write_logged(PLAY_COUNT_KEY, &count);
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.read_or_default(LEADERBOARD_KEY)
    }

    pub fn set_leaderboard(&self, entries: &[LeaderboardEntry]) {
        self.write_logged(LEADERBOARD_KEY, entries);
    }

    pub fn append_leaderboard_entry(&self, entry: LeaderboardEntry) {
        let mut entries = self.leaderboard();
        entries.push(entry);
        self.set_leaderboard(&entries);
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(err) => {
                warn!("Falling back to default for {key}: {err:#}");
                T::default()
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("stored value for {key} is not valid JSON"))?;
        Ok(Some(value))
    }

    fn write_logged<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .context("failed to serialize value")
            .and_then(|raw| self.backend.write(key, &raw));
        if let Err(err) = result {
            warn!("Failed to persist {key}: {err:#}");
        }
    }
}
