//! # JSON Output Module
//!
//! Output strutturato in JSON (una riga per evento su stdout) per chi guida il
//! batch da un altro processo.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch (directory, numero file, pipeline SVGO)
//! - `file_start`: Inizio elaborazione di un file
//! - `file_complete`: Fine elaborazione di un file (con eventuale errore)
//! - `progress`: Progresso corrente
//! - `complete`: Fine del batch con statistiche e lista dei fallimenti
//! - `error`: Errore fatale (es. directory non leggibile)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::optimizer::task_optimizer::FileOutcome;
use crate::progress::OptimizationStats;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        input_dir: PathBuf,
        total_files: usize,
        ignored_files: usize,
        workers: usize,
        dry_run: bool,
        plugins: Vec<String>,
    },

    FileStart {
        path: PathBuf,
        index: usize,
        total: usize,
    },

    FileComplete {
        path: PathBuf,
        original_size: u64,
        optimized_size: u64,
        reduction_percent: f64,
        skipped: bool,
        error: Option<String>,
    },

    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        files_optimized: usize,
        files_skipped: usize,
        errors: usize,
        bytes_saved: u64,
    },

    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_skipped: usize,
        files_ignored: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
        failures: Vec<JsonFailure>,
        historical_stats: HistoricalStats,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Statistiche storiche dal file di stato
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoricalStats {
    pub total_files_ever_processed: usize,
    pub total_bytes_saved_historically: u64,
    pub average_historical_reduction: f64,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn file_complete(outcome: &FileOutcome) -> Self {
        match outcome {
            FileOutcome::Optimized { path, info, .. } => JsonMessage::FileComplete {
                path: path.clone(),
                original_size: info.original_size,
                optimized_size: info.optimized_size,
                reduction_percent: info.reduction_percent,
                skipped: false,
                error: None,
            },
            FileOutcome::Skipped { path, size, .. } => JsonMessage::FileComplete {
                path: path.clone(),
                original_size: *size,
                optimized_size: *size,
                reduction_percent: 0.0,
                skipped: true,
                error: None,
            },
            FileOutcome::Failed { path, error } => JsonMessage::FileComplete {
                path: path.clone(),
                original_size: 0,
                optimized_size: 0,
                reduction_percent: 0.0,
                skipped: false,
                error: Some(error.clone()),
            },
        }
    }

    pub fn progress(current: usize, total: usize, stats: &OptimizationStats) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            100.0
        };

        JsonMessage::Progress {
            current,
            total,
            percentage,
            files_optimized: stats.files_optimized,
            files_skipped: stats.files_skipped,
            errors: stats.errors,
            bytes_saved: stats.total_bytes_saved,
        }
    }

    pub fn complete(
        stats: &OptimizationStats,
        duration_seconds: f64,
        failures: Vec<JsonFailure>,
        historical_stats: HistoricalStats,
    ) -> Self {
        JsonMessage::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_skipped: stats.files_skipped,
            files_ignored: stats.files_ignored,
            errors: stats.errors,
            total_bytes_saved: stats.total_bytes_saved,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
            failures,
            historical_stats,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        JsonMessage::Error {
            message: message.into(),
            details,
        }
    }
}
