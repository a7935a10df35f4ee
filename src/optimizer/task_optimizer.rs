//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di singoli file: lettura, SVGO, riscrittura.
//! Ogni errore viene catturato qui e diventa un `FileOutcome::Failed`, così
//! un file rotto non ferma il resto del batch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    engine::{OptimizationInfo, SvgEngine},
    error::OptimizeError,
    file_manager::FileManager,
    state::{ProcessedFile, StateManager},
};

/// Why a file was left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Content matches what a previous run wrote
    AlreadyOptimized,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyOptimized => write!(f, "already optimized"),
        }
    }
}

/// Result of processing one file. Every dispatched file produces exactly one.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Optimized {
        path: PathBuf,
        info: OptimizationInfo,
        /// False in dry-run mode
        written: bool,
    },
    Skipped {
        path: PathBuf,
        size: u64,
        reason: SkipReason,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Optimized { path, .. }
            | FileOutcome::Skipped { path, .. }
            | FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }

    fn failed(path: &Path, error: OptimizeError) -> Self {
        FileOutcome::Failed {
            path: path.to_path_buf(),
            error: error.to_string(),
        }
    }
}

/// Worker ottimizzato per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    config: Arc<Config>,
    engine: Arc<dyn SvgEngine>,
    state: Option<Arc<Mutex<StateManager>>>,
}

impl TaskOptimizer {
    pub fn new(
        config: Arc<Config>,
        engine: Arc<dyn SvgEngine>,
        state: Option<Arc<Mutex<StateManager>>>,
    ) -> Self {
        Self {
            config,
            engine,
            state,
        }
    }

    /// Processa un singolo file, applicando il timeout configurato
    pub async fn process_single_file(&self, file_path: PathBuf) -> FileOutcome {
        info!("{}", file_path.display());

        let work = self.optimize_file(&file_path);
        let result = match self.config.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), work).await {
                Ok(result) => result,
                Err(_) => Err(OptimizeError::Timeout(secs)),
            },
            None => work.await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to optimize {}: {}", file_path.display(), e);
                FileOutcome::failed(&file_path, e)
            }
        }
    }

    async fn optimize_file(&self, file_path: &Path) -> Result<FileOutcome, OptimizeError> {
        let input = FileManager::read_text(file_path).await?;

        if self.should_skip_file(file_path, &input).await {
            debug!("[SKIP] Already optimized: {}", file_path.display());
            return Ok(FileOutcome::Skipped {
                path: file_path.to_path_buf(),
                size: input.len() as u64,
                reason: SkipReason::AlreadyOptimized,
            });
        }

        let output = self.engine.optimize(input, file_path).await?;
        info!("{} {:?}", file_path.display(), output.info);

        if self.config.dry_run {
            debug!("Dry run: would rewrite {}", file_path.display());
            return Ok(FileOutcome::Optimized {
                path: file_path.to_path_buf(),
                info: output.info,
                written: false,
            });
        }

        FileManager::write_in_place(file_path, &output.data).await?;
        self.record(file_path, &output.data, output.info.original_size).await;

        Ok(FileOutcome::Optimized {
            path: file_path.to_path_buf(),
            info: output.info,
            written: true,
        })
    }

    /// Controlla se il contenuto corrisponde a quello scritto dall'ultimo run
    async fn should_skip_file(&self, file_path: &Path, content: &str) -> bool {
        if self.config.force {
            return false;
        }
        match self.state {
            Some(ref state) => state.lock().await.is_already_optimized(file_path, content).await,
            None => false,
        }
    }

    async fn record(&self, file_path: &Path, optimized: &str, original_size: u64) {
        let Some(ref state) = self.state else {
            return;
        };
        let processed = ProcessedFile::new(file_path.to_path_buf(), optimized, original_size);
        // The file is already written; a state failure only costs a re-run.
        if let Err(e) = state.lock().await.mark_processed(processed).await {
            warn!("Could not update state log for {}: {}", file_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{HangingEngine, RecordingEngine};
    use tempfile::TempDir;

    const CLOUD: &str = "<?xml version=\"1.0\"?>\n<!-- cloud -->\n<svg viewBox=\"0 0 10 10\">\n  <circle r=\"5\"/>\n</svg>\n";

    fn task(config: Config, engine: Arc<dyn SvgEngine>) -> TaskOptimizer {
        TaskOptimizer::new(Arc::new(config), engine, None)
    }

    #[tokio::test]
    async fn test_optimizes_and_rewrites_same_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cloud.svg");
        std::fs::write(&path, CLOUD).unwrap();

        let outcome = task(Config::default(), Arc::new(RecordingEngine::default()))
            .process_single_file(path.clone())
            .await;

        match outcome {
            FileOutcome::Optimized { path: p, info, written } => {
                assert_eq!(p, path);
                assert!(written);
                assert_eq!(info.original_size, CLOUD.len() as u64);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(!rewritten.contains("<?xml"));
        assert!(!rewritten.contains("<!--"));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cloud.svg");
        std::fs::write(&path, CLOUD).unwrap();

        let config = Config {
            dry_run: true,
            ..Default::default()
        };
        let outcome = task(config, Arc::new(RecordingEngine::default()))
            .process_single_file(path.clone())
            .await;

        assert!(matches!(outcome, FileOutcome::Optimized { written: false, .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CLOUD);
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        let outcome = task(Config::default(), Arc::new(RecordingEngine::default()))
            .process_single_file(path.clone())
            .await;

        match outcome {
            FileOutcome::Failed { error, .. } => assert!(error.contains("SVGO error")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not an image");
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.svg");

        let outcome = task(Config::default(), Arc::new(RecordingEngine::default()))
            .process_single_file(path)
            .await;

        match outcome {
            FileOutcome::Failed { error, .. } => assert!(error.starts_with("Cannot read")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("slow.svg");
        std::fs::write(&path, CLOUD).unwrap();

        let config = Config {
            timeout_secs: Some(5),
            ..Default::default()
        };
        let outcome = task(config, Arc::new(HangingEngine))
            .process_single_file(path)
            .await;

        match outcome {
            FileOutcome::Failed { error, .. } => assert!(error.contains("timed out after 5s")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_skips_already_optimized_content() {
        let temp_dir = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cloud.svg");
        std::fs::write(&path, CLOUD).unwrap();

        let state = StateManager::new(temp_dir.path(), Some(state_dir.path())).await.unwrap();
        let state = Some(Arc::new(Mutex::new(state)));
        let engine = Arc::new(RecordingEngine::default());
        let worker = TaskOptimizer::new(Arc::new(Config::default()), engine.clone(), state.clone());

        assert!(matches!(
            worker.process_single_file(path.clone()).await,
            FileOutcome::Optimized { .. }
        ));
        assert!(matches!(
            worker.process_single_file(path.clone()).await,
            FileOutcome::Skipped { reason: SkipReason::AlreadyOptimized, .. }
        ));
        assert_eq!(engine.calls().len(), 1);

        let forced = TaskOptimizer::new(
            Arc::new(Config {
                force: true,
                ..Default::default()
            }),
            engine.clone(),
            state,
        );
        assert!(matches!(
            forced.process_single_file(path).await,
            FileOutcome::Optimized { .. }
        ));
        assert_eq!(engine.calls().len(), 2);
    }
}
