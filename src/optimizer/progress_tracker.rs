//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso tra i task: aggiorna statistiche, progress
//! bar ed eventi JSON ogni volta che un file termina.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    json_output::JsonMessage,
    optimizer::task_optimizer::FileOutcome,
    progress::{OptimizationStats, ProgressManager},
};

#[derive(Default)]
struct Counters {
    completed: usize,
    stats: OptimizationStats,
}

/// Tracker progress unificato
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    json_output: bool,
    counters: Arc<Mutex<Counters>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden(total_files as u64)
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            total_files,
            json_output,
            counters: Arc::new(Mutex::new(Counters::default())),
            progress_manager,
        }
    }

    /// Tracker senza output visivo
    pub fn hidden(total_files: usize) -> Self {
        Self {
            total_files,
            json_output: false,
            counters: Arc::new(Mutex::new(Counters::default())),
            progress_manager: ProgressManager::hidden(total_files as u64),
        }
    }

    /// Gestisce completamento file con eventi JSON automatici
    pub async fn handle_file_completion(&self, outcome: &FileOutcome) {
        let mut counters = self.counters.lock().await;
        counters.completed += 1;

        let file_name = outcome
            .path()
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let message = match outcome {
            FileOutcome::Optimized { info, .. } => {
                counters
                    .stats
                    .add_optimized(info.original_size, info.optimized_size);
                format!("[OK] {}: {:.1}% saved", file_name, info.reduction_percent)
            }
            FileOutcome::Skipped { reason, .. } => {
                counters.stats.add_skipped();
                format!("[SKIP] {}: {}", file_name, reason)
            }
            FileOutcome::Failed { .. } => {
                counters.stats.add_error();
                format!("[ERROR] {}: error", file_name)
            }
        };

        if self.json_output {
            JsonMessage::file_complete(outcome).emit();
            JsonMessage::progress(counters.completed, self.total_files, &counters.stats).emit();
        }

        self.progress_manager.update(&message);
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Ottieni statistiche per report finale
    pub async fn get_stats(&self) -> OptimizationStats {
        self.counters.lock().await.stats.clone()
    }

    pub async fn completed(&self) -> usize {
        self.counters.lock().await.completed
    }
}
