//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Listing`: La directory target non esiste o non è leggibile (fatale)
//! - `Read` / `Write`: Errori di I/O sul singolo file (isolati per file)
//! - `Engine`: SVGO ha rifiutato l'input (SVG malformato, costrutto non supportato)
//! - `Timeout`: Il singolo file ha superato il tempo massimo
//! - `MissingDependency`: Tool esterno mancante (svgo)
//! - `Validation`: Errori di validazione della configurazione
//! - `State`: Errori del file di stato (resume log)
//!
//! Gli errori per file non interrompono il batch: vengono convertiti in
//! `FileOutcome::Failed` dal `TaskOptimizer`.

use std::path::PathBuf;

/// Custom error types for batch SVG optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot list directory {}: {source}", .path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SVGO error: {0}")]
    Engine(String),

    #[error("Processing timed out after {0}s")]
    Timeout(u64),

    #[error("State file error: {0}")]
    State(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
