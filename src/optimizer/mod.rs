//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `batch_optimizer`: Orchestratore principale
//! - `task_optimizer`: Worker per singoli file
//! - `progress_tracker`: Gestione progress unificata

pub mod batch_optimizer;
pub mod progress_tracker;
pub mod task_optimizer;

pub use batch_optimizer::{BatchOptimizer, BatchReport};
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::{FileOutcome, SkipReason, TaskOptimizer};
