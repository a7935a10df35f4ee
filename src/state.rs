//! # State Management Module
//!
//! Questo modulo mantiene un resume log per ogni directory target, così un
//! batch interrotto può ripartire senza riottimizzare i file già scritti.
//!
//! ## Strategia di persistence:
//! - Un file JSON per directory target (basato su hash del path)
//! - Salvataggio in `<state_dir>/processed_<hash>.json` (default `~/.svgo-batch`)
//! - Per ogni file scritto: SHA-256 del contenuto ottimizzato, chiave = path canonico
//! - Salvataggio ogni `SAVE_EVERY` file e a fine batch (`flush`)
//! - Un file il cui contenuto attuale ha lo stesso hash è "già ottimizzato"
//! - Cleanup automatico di entry per file che non esistono più
//!
//! ## Esempio struttura state file:
//! ```json
//! {
//!   "processed_files": {
//!     "/home/me/Clouds/cloud.svg": {
//!       "path": "/home/me/Clouds/cloud.svg",
//!       "content_hash": "9f86d081884c7d65...",
//!       "original_size": 2048,
//!       "optimized_size": 1024,
//!       "reduction_percent": 50.0,
//!       "processed_at": 1642680000
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::OptimizeError;

/// Records buffered in memory before the log is rewritten
const SAVE_EVERY: usize = 32;

/// Information about a file written by a previous run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub content_hash: String,
    pub original_size: u64,
    pub optimized_size: u64,
    pub reduction_percent: f64,
    pub processed_at: u64,
}

impl ProcessedFile {
    pub fn new(path: PathBuf, optimized_content: &str, original_size: u64) -> Self {
        let optimized_size = optimized_content.len() as u64;
        let reduction_percent = if original_size > 0 {
            (1.0 - (optimized_size as f64 / original_size as f64)) * 100.0
        } else {
            0.0
        };

        Self {
            path,
            content_hash: content_hash(optimized_content),
            original_size,
            optimized_size,
            reduction_percent,
            processed_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

/// Hex SHA-256 of a document
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// State file to track processed files
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StateFile {
    pub processed_files: HashMap<String, ProcessedFile>,
}

/// Manages the state of processed files
pub struct StateManager {
    state_file_path: PathBuf,
    state: StateFile,
    unsaved: usize,
}

impl StateManager {
    /// Create a state manager for `target_dir`, storing under `state_dir`
    /// (or `~/.svgo-batch` when `None`).
    pub async fn new(target_dir: &Path, state_dir: Option<&Path>) -> Result<Self, OptimizeError> {
        let state_dir = match state_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| OptimizeError::State("Could not find home directory".to_string()))?
                .join(".svgo-batch"),
        };

        fs::create_dir_all(&state_dir).await?;

        // Create unique state file based on target directory hash
        let mut hasher = Sha256::new();
        hasher.update(target_dir.to_string_lossy().as_bytes());
        let hash = hex::encode(hasher.finalize())[..16].to_string();

        let state_file_path = state_dir.join(format!("processed_{}.json", hash));

        let state = if state_file_path.exists() {
            let content = fs::read_to_string(&state_file_path).await?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt state file {}: {}", state_file_path.display(), e);
                StateFile::default()
            })
        } else {
            StateFile::default()
        };

        Ok(Self {
            state_file_path,
            state,
            unsaved: 0,
        })
    }

    pub fn state_file_path(&self) -> &Path {
        &self.state_file_path
    }

    /// True if `content` is exactly what we last wrote to `path`
    pub async fn is_already_optimized(&self, path: &Path, content: &str) -> bool {
        let key = entry_path(path).await;
        self.state
            .processed_files
            .get(key.to_string_lossy().as_ref())
            .map(|entry| entry.content_hash == content_hash(content))
            .unwrap_or(false)
    }

    /// Record a written file. The log is persisted every `SAVE_EVERY`
    /// records; call `flush` once the batch is done.
    pub async fn mark_processed(&mut self, mut processed: ProcessedFile) -> Result<(), OptimizeError> {
        processed.path = entry_path(&processed.path).await;
        let key = processed.path.to_string_lossy().to_string();
        self.state.processed_files.insert(key, processed);
        self.unsaved += 1;

        if self.unsaved >= SAVE_EVERY {
            self.save().await?;
        }
        Ok(())
    }

    /// Persist any records not yet written to disk
    pub async fn flush(&mut self) -> Result<(), OptimizeError> {
        if self.unsaved > 0 {
            self.save().await?;
        }
        Ok(())
    }

    /// Drop entries for files that no longer exist
    pub async fn cleanup(&mut self) -> Result<(), OptimizeError> {
        let before = self.state.processed_files.len();
        self.state
            .processed_files
            .retain(|_, entry| entry.path.exists());
        let removed = before - self.state.processed_files.len();

        if removed > 0 {
            debug!("Removed {} stale state entries", removed);
            self.save().await?;
        }
        Ok(())
    }

    /// Totals across every recorded file: (files, bytes saved, average reduction)
    pub fn get_stats(&self) -> (usize, u64, f64) {
        let total_files = self.state.processed_files.len();
        let total_saved: u64 = self
            .state
            .processed_files
            .values()
            .map(|f| f.original_size.saturating_sub(f.optimized_size))
            .sum();
        let avg_reduction = if total_files > 0 {
            self.state
                .processed_files
                .values()
                .map(|f| f.reduction_percent)
                .sum::<f64>()
                / total_files as f64
        } else {
            0.0
        };

        (total_files, total_saved, avg_reduction)
    }

    async fn save(&mut self) -> Result<(), OptimizeError> {
        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.state_file_path, content)
            .await
            .map_err(|e| OptimizeError::State(format!("{}: {}", self.state_file_path.display(), e)))?;
        self.unsaved = 0;
        Ok(())
    }
}

/// Canonical form of a file path, so every spelling of it maps to one entry
async fn entry_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}
