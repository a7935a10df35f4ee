//! # Batch Optimizer Main Orchestrator
//!
//! Orchestratore principale: lista la directory, lancia un task per file
//! (limitati da un semaforo), aspetta tutti i task e aggrega gli esiti.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    engine::{SvgEngine, SvgoCli},
    error::OptimizeError,
    file_manager::{FileManager, Listing},
    json_output::{HistoricalStats, JsonFailure, JsonMessage},
    optimizer::{progress_tracker::ProgressTracker, task_optimizer::{FileOutcome, TaskOptimizer}},
    progress::OptimizationStats,
    state::StateManager,
    svgo_config::SvgoConfig,
    tool_resolver::ToolPathResolver,
};

/// Aggregated result of a batch run
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Entries the extension filter kept away from the engine
    pub ignored: Vec<PathBuf>,
    pub stats: OptimizationStats,
    pub duration_seconds: f64,
}

impl BatchReport {
    fn empty(ignored: Vec<PathBuf>, duration_seconds: f64) -> Self {
        let stats = OptimizationStats {
            files_ignored: ignored.len(),
            ..Default::default()
        };
        Self {
            outcomes: Vec::new(),
            ignored,
            stats,
            duration_seconds,
        }
    }

    /// (path, reason) for every file that failed
    pub fn failures(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Failed { path, error } => Some((path.as_path(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(FileOutcome::is_failure)
    }
}

/// Orchestratore principale
pub struct BatchOptimizer {
    config: Arc<Config>,
    svgo_config: Arc<SvgoConfig>,
    engine: Arc<dyn SvgEngine>,
}

impl BatchOptimizer {
    /// Crea nuova istanza con un motore qualsiasi
    pub fn new(
        config: Config,
        svgo_config: Arc<SvgoConfig>,
        engine: Arc<dyn SvgEngine>,
    ) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            svgo_config,
            engine,
        })
    }

    /// Crea nuova istanza che usa l'eseguibile `svgo`
    pub fn with_svgo(config: Config, svgo_config: Arc<SvgoConfig>) -> Result<Self, OptimizeError> {
        let program = ToolPathResolver::new(config.svgo_path.clone()).require()?;
        info!("Using svgo: {}", program.display());
        let engine = SvgoCli::new(program, svgo_config.clone())?;
        Self::new(config, svgo_config, Arc::new(engine))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Esegue il batch sulla directory target
    pub async fn run(&self, target_dir: &Path) -> Result<BatchReport, OptimizeError> {
        let start_time = Instant::now();

        // Listing completo prima di qualsiasi lavoro per file
        let Listing { candidates, ignored } =
            FileManager::list_entries(target_dir, self.config.recursive, self.config.all_files).await?;

        self.emit_start_message(target_dir, &candidates, &ignored);
        self.log_configuration(&candidates, &ignored);

        if candidates.is_empty() {
            return Ok(self.handle_empty_directory(ignored, start_time));
        }

        let state = self.open_state(target_dir).await;
        let progress_tracker = ProgressTracker::new(candidates.len(), self.config.json_output);

        let outcomes = self
            .process_files_concurrently(candidates, state.clone(), progress_tracker.clone())
            .await?;

        if let Some(ref state) = state {
            if let Err(e) = state.lock().await.flush().await {
                warn!("Could not save state log: {}", e);
            }
        }

        let mut stats = progress_tracker.get_stats().await;
        stats.files_ignored = ignored.len();
        progress_tracker.finish(&stats.format_summary());

        let report = BatchReport {
            outcomes,
            ignored,
            stats,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        };
        self.print_final_stats(&report, state.as_ref()).await;

        Ok(report)
    }

    /// Processa file con concorrenza limitata dal semaforo
    async fn process_files_concurrently(
        &self,
        files: Vec<PathBuf>,
        state: Option<Arc<Mutex<StateManager>>>,
        progress_tracker: ProgressTracker,
    ) -> Result<Vec<FileOutcome>, OptimizeError> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let task_optimizer = TaskOptimizer::new(self.config.clone(), self.engine.clone(), state);
        let total = files.len();
        let mut tasks = Vec::with_capacity(total);

        for (index, file_path) in files.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| OptimizeError::Engine(format!("worker pool closed: {}", e)))?;

            let worker = task_optimizer.clone();
            let progress = progress_tracker.clone();
            let json_output = self.config.json_output;
            let path = file_path.clone();

            let task = tokio::spawn(async move {
                let _permit = permit;

                if json_output {
                    JsonMessage::FileStart {
                        path: path.clone(),
                        index,
                        total,
                    }
                    .emit();
                }

                let outcome = worker.process_single_file(path).await;
                progress.handle_file_completion(&outcome).await;
                outcome
            });

            tasks.push((file_path, task));
        }

        // Aspetta tutti i task e raccoglie gli esiti
        let mut outcomes = Vec::with_capacity(total);
        for (file_path, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Task for {} panicked: {}", file_path.display(), e);
                    let outcome = FileOutcome::Failed {
                        path: file_path,
                        error: format!("task failed: {}", e),
                    };
                    progress_tracker.handle_file_completion(&outcome).await;
                    outcome
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Apre il resume log; se non disponibile il batch prosegue senza
    async fn open_state(&self, target_dir: &Path) -> Option<Arc<Mutex<StateManager>>> {
        let key = target_dir
            .canonicalize()
            .unwrap_or_else(|_| target_dir.to_path_buf());

        match StateManager::new(&key, self.config.state_dir.as_deref()).await {
            Ok(mut manager) => {
                if let Err(e) = manager.cleanup().await {
                    warn!("State cleanup failed: {}", e);
                }
                Some(Arc::new(Mutex::new(manager)))
            }
            Err(e) => {
                warn!("Running without state log: {}", e);
                None
            }
        }
    }

    /// Invia messaggio di inizio
    fn emit_start_message(&self, target_dir: &Path, files: &[PathBuf], ignored: &[PathBuf]) {
        if self.config.json_output {
            JsonMessage::Start {
                input_dir: target_dir.to_path_buf(),
                total_files: files.len(),
                ignored_files: ignored.len(),
                workers: self.config.workers,
                dry_run: self.config.dry_run,
                plugins: self.svgo_config.enabled_plugins().map(str::to_string).collect(),
            }
            .emit();
        } else {
            info!("Starting SVG optimization in: {}", target_dir.display());
        }
    }

    /// Logga configurazione (solo se non JSON mode)
    fn log_configuration(&self, files: &[PathBuf], ignored: &[PathBuf]) {
        if self.config.json_output {
            return;
        }

        info!(
            "Pipeline: {} of {} SVGO passes enabled",
            self.svgo_config.enabled_plugins().count(),
            self.svgo_config.plugins().len()
        );
        info!("Workers: {}", self.config.workers);
        if self.config.dry_run {
            info!("Dry run mode: No files will be modified");
        }
        if self.config.recursive {
            info!("Recursive mode: subdirectories included");
        }
        if !ignored.is_empty() {
            info!("Ignoring {} non-SVG files (use --all-files to include them)", ignored.len());
        }
        info!("Found {} SVG files to process", files.len());
    }

    /// Gestisce directory vuota
    fn handle_empty_directory(&self, ignored: Vec<PathBuf>, start_time: Instant) -> BatchReport {
        let report = BatchReport::empty(ignored, start_time.elapsed().as_secs_f64());
        if self.config.json_output {
            JsonMessage::complete(
                &report.stats,
                report.duration_seconds,
                Vec::new(),
                HistoricalStats::default(),
            )
            .emit();
        } else {
            info!("No SVG files found to process");
        }
        report
    }

    /// Stampa statistiche finali
    async fn print_final_stats(&self, report: &BatchReport, state: Option<&Arc<Mutex<StateManager>>>) {
        let (total_files, total_saved, avg_reduction) = match state {
            Some(state) => state.lock().await.get_stats(),
            None => (0, 0, 0.0),
        };
        let stats = &report.stats;

        if self.config.json_output {
            let failures = report
                .failures()
                .into_iter()
                .map(|(path, error)| JsonFailure {
                    path: path.to_path_buf(),
                    error: error.to_string(),
                })
                .collect();
            JsonMessage::complete(
                stats,
                report.duration_seconds,
                failures,
                HistoricalStats {
                    total_files_ever_processed: total_files,
                    total_bytes_saved_historically: total_saved,
                    average_historical_reduction: avg_reduction,
                },
            )
            .emit();
            return;
        }

        info!("=== Optimization Complete ===");
        info!("Files processed: {}", stats.files_processed);
        info!("Files optimized: {}", stats.files_optimized);
        info!("Files skipped: {}", stats.files_skipped);
        info!("Files ignored: {}", stats.files_ignored);
        info!("Errors: {}", stats.errors);
        info!("Bytes saved: {}", FileManager::format_size(stats.total_bytes_saved));
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Duration: {:.2}s", report.duration_seconds);
        for (path, reason) in report.failures() {
            error!("FAILED {}: {}", path.display(), reason);
        }
        if state.is_some() {
            info!("--- Historical Stats ---");
            info!("Total files ever optimized: {}", total_files);
            info!("Total bytes saved historically: {}", FileManager::format_size(total_saved));
            info!("Average historical reduction: {:.2}%", avg_reduction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingEngine;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const CLOUD: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- Generator: Sketch -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\">\n\n  <path d=\"M6 19h12a4 4 0 0 0 0-8\"/>\n</svg>\n";

    struct Fixture {
        target: TempDir,
        state: TempDir,
        engine: Arc<RecordingEngine>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                target: TempDir::new().unwrap(),
                state: TempDir::new().unwrap(),
                engine: Arc::new(RecordingEngine::default()),
            }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.target.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        fn optimizer(&self, config: Config) -> BatchOptimizer {
            let config = Config {
                state_dir: Some(self.state.path().to_path_buf()),
                ..config
            };
            BatchOptimizer::new(config, Arc::new(SvgoConfig::default()), self.engine.clone()).unwrap()
        }

        fn snapshot(&self) -> HashMap<String, String> {
            std::fs::read_dir(self.target.path())
                .unwrap()
                .map(|e| e.unwrap().path())
                .map(|p| {
                    (
                        p.file_name().unwrap().to_string_lossy().to_string(),
                        std::fs::read_to_string(&p).unwrap_or_default(),
                    )
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn test_single_file_is_rewritten_in_place() {
        let fixture = Fixture::new();
        let path = fixture.write("cloud.svg", CLOUD);

        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.has_failures());
        assert_eq!(report.stats.files_optimized, 1);
        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(!rewritten.contains("<?xml"));
        assert!(!rewritten.contains("Generator"));
        assert!(rewritten.contains("viewBox=\"0 0 24 24\""));
    }

    #[tokio::test]
    async fn test_empty_directory_makes_no_engine_calls() {
        let fixture = Fixture::new();

        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(report.stats.files_processed, 0);
        assert!(fixture.engine.calls().is_empty());
        assert!(fixture.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_listing_error() {
        let fixture = Fixture::new();
        let missing = fixture.target.path().join("Clouds");

        let err = fixture.optimizer(Config::default()).run(&missing).await.unwrap_err();

        assert!(matches!(err, OptimizeError::Listing { .. }));
        assert!(err.to_string().contains("Clouds"));
    }

    #[tokio::test]
    async fn test_paths_are_preserved() {
        let fixture = Fixture::new();
        for i in 0..12 {
            fixture.write(&format!("cloud-{}.svg", i), CLOUD);
        }
        fixture.write("readme.txt", "not svg");
        let mut before: Vec<_> = fixture.snapshot().into_keys().collect();
        before.sort();

        fixture
            .optimizer(Config {
                workers: 3,
                ..Default::default()
            })
            .run(fixture.target.path())
            .await
            .unwrap();

        let mut after: Vec<_> = fixture.snapshot().into_keys().collect();
        after.sort();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_results_do_not_depend_on_worker_count() {
        let contents = [
            CLOUD.to_string(),
            "<svg>\n<!-- a -->\n<g/>\n</svg>".to_string(),
            "<?xml version=\"1.0\"?><svg><rect/></svg>".to_string(),
        ];

        let mut results = Vec::new();
        for workers in [1, 8] {
            let fixture = Fixture::new();
            for (i, content) in contents.iter().enumerate() {
                fixture.write(&format!("{}.svg", i), content);
            }
            fixture
                .optimizer(Config {
                    workers,
                    ..Default::default()
                })
                .run(fixture.target.path())
                .await
                .unwrap();
            results.push(fixture.snapshot());
        }

        assert_eq!(results[0], results[1]);
        for (i, content) in contents.iter().enumerate() {
            assert_eq!(
                results[0][&format!("{}.svg", i)],
                RecordingEngine::transform(content).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_one_malformed_file_does_not_stop_the_batch() {
        let fixture = Fixture::new();
        for i in 0..4 {
            fixture.write(&format!("ok-{}.svg", i), CLOUD);
        }
        let broken = fixture.write("broken.svg", "this is not markup");

        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert_eq!(report.stats.files_optimized, 4);
        assert_eq!(report.stats.errors, 1);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, broken.as_path());
        assert_eq!(std::fs::read_to_string(&broken).unwrap(), "this is not markup");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_failure_does_not_stop_the_batch() {
        use std::os::unix::fs::PermissionsExt;

        let fixture = Fixture::new();
        for i in 0..3 {
            fixture.write(&format!("ok-{}.svg", i), CLOUD);
        }
        let locked = fixture.write("locked.svg", CLOUD);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o444)).unwrap();

        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert_eq!(report.stats.files_optimized, 3);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, locked.as_path());
        assert!(failures[0].1.starts_with("Cannot write"));
        assert_eq!(std::fs::read_to_string(&locked).unwrap(), CLOUD);
        assert!(!std::fs::read_to_string(fixture.target.path().join("ok-0.svg"))
            .unwrap()
            .contains("<?xml"));
    }

    #[tokio::test]
    async fn test_non_svg_files_are_ignored_unless_requested() {
        let fixture = Fixture::new();
        fixture.write("cloud.svg", CLOUD);
        let notes = fixture.write("notes.txt", "hello");

        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();
        assert_eq!(report.ignored, vec![notes.clone()]);
        assert_eq!(report.stats.files_ignored, 1);
        assert_eq!(fixture.engine.calls().len(), 1);

        let report = fixture
            .optimizer(Config {
                all_files: true,
                force: true,
                ..Default::default()
            })
            .run(fixture.target.path())
            .await
            .unwrap();
        assert!(report.ignored.is_empty());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].0, notes.as_path());
    }

    #[tokio::test]
    async fn test_second_run_skips_already_optimized_files() {
        let fixture = Fixture::new();
        fixture.write("cloud.svg", CLOUD);

        fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();
        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(report.stats.files_optimized, 0);
        assert_eq!(fixture.engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_state_log_ignores_directory_spelling() {
        let fixture = Fixture::new();
        fixture.write("cloud.svg", CLOUD);

        let dotted = fixture.target.path().join(".");
        fixture.optimizer(Config::default()).run(&dotted).await.unwrap();
        let report = fixture.optimizer(Config::default()).run(fixture.target.path()).await.unwrap();

        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(fixture.engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let fixture = Fixture::new();
        fixture.write("cloud.svg", CLOUD);
        let before = fixture.snapshot();

        let report = fixture
            .optimizer(Config {
                dry_run: true,
                ..Default::default()
            })
            .run(fixture.target.path())
            .await
            .unwrap();

        assert_eq!(report.stats.files_optimized, 1);
        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = BatchOptimizer::new(
            Config {
                workers: 0,
                ..Default::default()
            },
            Arc::new(SvgoConfig::default()),
            Arc::new(RecordingEngine::default()),
        );
        assert!(matches!(result, Err(OptimizeError::Validation(_))));
    }
}
