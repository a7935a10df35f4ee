//! # SVGO Batch Library
//!
//! Riscrive in-place ogni file SVG di una directory passando il contenuto a
//! SVGO con una pipeline fissa di plugin.
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione del driver e validazione parametri
//! - `svgo_config`: Pipeline SVGO fissa (lista ordinata di plugin)
//! - `engine`: Trait `SvgEngine` e implementazione via eseguibile `svgo`
//! - `tool_resolver`: Ricerca dell'eseguibile `svgo`
//! - `error`: Tipi di errore custom
//! - `file_manager`: Listing della directory e riscrittura atomica
//! - `state`: Resume log dei file già ottimizzati
//! - `optimizer`: Orchestratore e worker per file
//! - `progress` / `json_output`: Progress bar, statistiche, eventi JSON
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use std::sync::Arc;
//! use svgo_batch::{BatchOptimizer, Config, SvgoConfig};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let optimizer = BatchOptimizer::with_svgo(Config::default(), Arc::new(SvgoConfig::default()))?;
//! let report = optimizer.run(&Config::default_target_dir()).await?;
//! println!("{}", report.stats.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod state;
pub mod svgo_config;
pub mod tool_resolver;

pub use config::Config;
pub use engine::{EngineOutput, OptimizationInfo, SvgEngine, SvgoCli};
pub use error::OptimizeError;
pub use optimizer::{BatchOptimizer, BatchReport, FileOutcome};
pub use svgo_config::SvgoConfig;
