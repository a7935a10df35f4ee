//! # SVGO Batch - Main Entry Point
//!
//! Punto di ingresso principale dell'applicazione.
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, workers, dry-run, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica l'eventuale file di configurazione e applica gli override CLI
//! 4. Risolve l'eseguibile `svgo` e avvia il batch
//! 5. Esce con errore se almeno un file è fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! svgo-batch ../Clouds --workers 8 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use svgo_batch::json_output::JsonMessage;
use svgo_batch::{BatchOptimizer, BatchReport, Config, OptimizeError, SvgoConfig};

#[derive(Parser)]
#[command(name = "svgo-batch")]
#[command(about = "Optimize every SVG in a directory in place with a fixed SVGO pipeline")]
struct Args {
    /// Directory containing SVG files (default: ../Clouds next to this crate)
    directory: Option<PathBuf>,

    /// Number of files optimized concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Dry run - optimize but don't rewrite files
    #[arg(long)]
    dry_run: bool,

    /// Also process files in subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Submit every file to SVGO, not only *.svg
    #[arg(long)]
    all_files: bool,

    /// Per-file timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Output progress and status as JSON lines
    #[arg(long)]
    json: bool,

    /// Re-optimize every file. Without it, files left unchanged since a
    /// previous run rewrote them are skipped (see --state-dir)
    #[arg(short, long)]
    force: bool,

    /// Directory for the resume state log (default: ~/.svgo-batch)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Path to the svgo executable
    #[arg(long)]
    svgo: Option<PathBuf>,

    /// Load driver settings from a JSON file (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the SVGO configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        if let Some(ref state_dir) = self.state_dir {
            config.state_dir = Some(state_dir.clone());
        }
        if let Some(ref svgo) = self.svgo {
            config.svgo_path = Some(svgo.clone());
        }
        config.dry_run |= self.dry_run;
        config.recursive |= self.recursive;
        config.all_files |= self.all_files;
        config.json_output |= self.json;
        config.force |= self.force;
    }
}

async fn run(
    config: Config,
    svgo_config: Arc<SvgoConfig>,
    target_dir: &Path,
) -> Result<BatchReport, OptimizeError> {
    let optimizer = BatchOptimizer::with_svgo(config, svgo_config)?;
    optimizer.run(target_dir).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let svgo_config = Arc::new(SvgoConfig::default());
    if args.print_config {
        println!("{}", svgo_config.to_json_pretty()?);
        return Ok(());
    }

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    args.apply_to(&mut config);

    let target_dir = args
        .directory
        .clone()
        .unwrap_or_else(Config::default_target_dir);
    let json_output = config.json_output;

    let report = match run(config, svgo_config, &target_dir).await {
        Ok(report) => report,
        Err(e) => {
            if json_output {
                JsonMessage::error(e.to_string(), Some(target_dir.display().to_string())).emit();
            }
            return Err(e.into());
        }
    };

    if report.has_failures() {
        return Err(anyhow::anyhow!(
            "{} of {} files failed",
            report.stats.errors,
            report.outcomes.len()
        ));
    }

    info!("{}", report.stats.format_summary());
    Ok(())
}
