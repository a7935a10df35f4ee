//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del driver (non della pipeline SVGO,
//! che è fissa e vive in `svgo_config`).
//!
//! ## Parametri di configurazione:
//! - `workers`: Numero di file elaborati in parallelo (default: 4)
//! - `dry_run`: Ottimizza senza scrivere i file (default: false)
//! - `recursive`: Visita anche le sottodirectory (default: false)
//! - `all_files`: Invia a SVGO anche file senza estensione `.svg` (default: false)
//! - `timeout_secs`: Timeout per singolo file (default: 120s)
//! - `json_output`: Eventi JSON su stdout invece della progress bar (default: false)
//! - `force`: Ignora il file di stato e riottimizza tutto (default: false)
//! - `state_dir`: Directory del file di stato (default: `~/.svgo-batch`)
//! - `svgo_path`: Path esplicito dell'eseguibile svgo (default: risolto automaticamente)
//!
//! ## Esempio:
//! ```rust
//! use svgo_batch::Config;
//!
//! let config = Config {
//!     workers: 8,
//!     dry_run: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok::<(), svgo_batch::OptimizeError>(())
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OptimizeError;

/// Name of the directory holding the SVG files, next to the crate checkout.
pub const DEFAULT_TARGET_DIR_NAME: &str = "Clouds";

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of files processed concurrently
    pub workers: usize,
    /// Optimize but don't write results back
    pub dry_run: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Submit every regular file, not only `*.svg`
    pub all_files: bool,
    /// Per-file timeout in seconds (None = no timeout)
    pub timeout_secs: Option<u64>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Re-optimize files the state log marks as already optimized
    pub force: bool,
    /// Where the state log lives (None = `~/.svgo-batch`)
    pub state_dir: Option<PathBuf>,
    /// Explicit svgo executable
    pub svgo_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 4,
            dry_run: false,
            recursive: false,
            all_files: false,
            timeout_secs: Some(120),
            json_output: false,
            force: false,
            state_dir: None,
            svgo_path: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.workers == 0 {
            return Err(OptimizeError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(OptimizeError::Validation(
                "Timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if let Some(ref svgo_path) = self.svgo_path {
            if !svgo_path.is_file() {
                return Err(OptimizeError::Validation(format!(
                    "svgo path is not a file: {}",
                    svgo_path.display()
                )));
            }
        }

        if let Some(ref state_dir) = self.state_dir {
            if state_dir.exists() && !state_dir.is_dir() {
                return Err(OptimizeError::Validation(format!(
                    "State path is not a directory: {}",
                    state_dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Directory used when none is given on the command line: two levels up
    /// from `src/`, then `Clouds`.
    pub fn default_target_dir() -> PathBuf {
        let source_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        let base = source_dir
            .parent()
            .and_then(Path::parent)
            .unwrap_or(&source_dir);
        base.join(DEFAULT_TARGET_DIR_NAME)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
