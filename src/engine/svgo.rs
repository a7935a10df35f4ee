//! # SVGO Command-Line Engine
//!
//! Lancia l'eseguibile `svgo` (1.x) come processo esterno:
//!
//! ```text
//! svgo --input - --output - --config '<json>'
//! ```
//!
//! Il testo SVG viaggia su stdin, il risultato torna su stdout, gli errori su
//! stderr. Un exit status diverso da zero, oppure un output vuoto per un input
//! non vuoto, è un errore del motore: mai ignorato.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{EngineOutput, OptimizationInfo, SvgEngine};
use crate::error::OptimizeError;
use crate::svgo_config::SvgoConfig;

/// Runs SVGO through its CLI with a fixed pipeline
pub struct SvgoCli {
    program: PathBuf,
    config: Arc<SvgoConfig>,
    /// Serialized once, reused for every file
    config_json: String,
}

impl SvgoCli {
    pub fn new(program: PathBuf, config: Arc<SvgoConfig>) -> Result<Self, OptimizeError> {
        let config_json = config.to_json()?;
        Ok(Self {
            program,
            config,
            config_json,
        })
    }

    /// Arguments passed to svgo for every document
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["--input", "-", "--output", "-", "--config"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(self.config_json.clone());
        if self.config.js2svg().pretty {
            args.push("--pretty".to_string());
            args.push(format!("--indent={}", self.config.js2svg().indent.len()));
        }
        args
    }

    async fn run(&self, input: String, path: &Path) -> Result<EngineOutput, OptimizeError> {
        let args = self.args();
        debug!("Running {} for {}", self.program.display(), path.display());

        let start_time = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OptimizeError::Engine(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OptimizeError::Engine("svgo stdin unavailable".to_string()))?;
        let payload = input.clone();
        // stdin is written while stdout drains; svgo may block on a full stdout pipe.
        let writer = tokio::spawn(async move {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        let write_result = writer
            .await
            .map_err(|e| OptimizeError::Engine(format!("stdin writer failed: {}", e)))?;
        let elapsed = start_time.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OptimizeError::Engine(format!(
                "{} ({}): {}",
                path.display(),
                output.status,
                stderr.trim()
            )));
        }
        write_result?;

        let data = String::from_utf8(output.stdout)
            .map_err(|e| OptimizeError::Engine(format!("svgo produced invalid UTF-8: {}", e)))?;

        if data.trim().is_empty() && !input.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OptimizeError::Engine(format!(
                "{}: empty output{}",
                path.display(),
                if stderr.trim().is_empty() {
                    String::new()
                } else {
                    format!(" ({})", stderr.trim())
                }
            )));
        }

        debug!("svgo finished {} in {:?}", path.display(), elapsed);
        let info = OptimizationInfo::new(
            input.len() as u64,
            data.len() as u64,
            elapsed.as_millis() as u64,
        );
        Ok(EngineOutput { data, info })
    }
}

impl SvgEngine for SvgoCli {
    fn optimize<'a>(
        &'a self,
        input: String,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<EngineOutput, OptimizeError>> {
        self.run(input, path).boxed()
    }
}
