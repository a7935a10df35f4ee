//! # Optimization Engine Module
//!
//! Il motore di ottimizzazione è un collaboratore esterno e opaco: il driver
//! gli passa il testo SVG e riceve il testo ottimizzato più un record di info.
//!
//! - `SvgEngine`: trait che separa il driver dal motore concreto
//! - `svgo`: implementazione di produzione che lancia l'eseguibile `svgo`

pub mod svgo;

pub use svgo::SvgoCli;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::OptimizeError;

/// Metadata produced for every successful optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationInfo {
    pub original_size: u64,
    pub optimized_size: u64,
    pub reduction_percent: f64,
    pub duration_ms: u64,
}

impl OptimizationInfo {
    pub fn new(original_size: u64, optimized_size: u64, duration_ms: u64) -> Self {
        let reduction_percent = if original_size > 0 {
            (1.0 - (optimized_size as f64 / original_size as f64)) * 100.0
        } else {
            0.0
        };

        Self {
            original_size,
            optimized_size,
            reduction_percent,
            duration_ms,
        }
    }
}

/// Optimized text plus its info record
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub data: String,
    pub info: OptimizationInfo,
}

/// An SVG optimizer the batch driver can submit documents to.
///
/// `path` is informational (SVGO uses it for error messages and relative
/// references); the engine must not read or write it.
pub trait SvgEngine: Send + Sync {
    fn optimize<'a>(
        &'a self,
        input: String,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<EngineOutput, OptimizeError>>;
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingEngine;
    use super::*;

    #[test]
    fn test_info_reduction() {
        let info = OptimizationInfo::new(200, 150, 3);
        assert!((info.reduction_percent - 25.0).abs() < f64::EPSILON);

        let empty = OptimizationInfo::new(0, 0, 0);
        assert_eq!(empty.reduction_percent, 0.0);
    }

    #[test]
    fn test_recording_engine_strips_declaration_and_comments() {
        let input = "<?xml version=\"1.0\"?>\n<!-- cloud -->\n<svg viewBox=\"0 0 10 10\">\n  <rect width=\"10\" height=\"10\"/>\n</svg>\n";
        let output = RecordingEngine::transform(input).unwrap();
        assert!(!output.contains("<?xml"));
        assert!(!output.contains("<!--"));
        assert!(output.starts_with("<svg"));
        assert!(output.contains("<rect"));
    }

    #[test]
    fn test_recording_engine_rejects_non_svg() {
        assert!(matches!(
            RecordingEngine::transform("just some text"),
            Err(OptimizeError::Engine(_))
        ));
    }
}
