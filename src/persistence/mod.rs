//! High-score persistence. A single RON file holding the best score seen;
//! writes only ever raise it.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access score file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse score file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to encode score file: {0}")]
    Encode(#[from] ron::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SaveData {
    high_score: i32,
}

#[derive(Resource, Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored high score. A missing or unreadable file reads as zero.
    pub fn read(&self) -> i32 {
        self.try_read().unwrap_or_else(|err| {
            warn!("ignoring unreadable score file {}: {err}", self.path.display());
            0
        })
    }

    fn try_read(&self) -> Result<i32, PersistError> {
        if !self.path.exists() {
            return Ok(0);
        }
        let text = fs::read_to_string(&self.path)?;
        let data: SaveData = ron::from_str(&text)?;
        Ok(data.high_score)
    }

    /// Persist `candidate` if it beats the stored score. Returns whichever
    /// score is now on disk.
    pub fn set_max(&self, candidate: i32) -> Result<i32, PersistError> {
        let current = self.try_read().unwrap_or(0);
        if candidate <= current {
            return Ok(current);
        }
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let text = ron::to_string(&SaveData { high_score: candidate })?;
        fs::write(&self.path, text)?;
        Ok(candidate)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
