//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file della directory target.
//!
//! ## Responsabilità:
//! - Listing della directory (solo voci dirette, oppure ricorsivo con `walkdir`)
//! - Filtro `.svg` (disattivabile con `all_files`)
//! - Lettura del contenuto come testo UTF-8
//! - Riscrittura in-place atomica (file temporaneo accanto al target reale + rename,
//!   segue i symlink e conserva i permessi)
//! - Utilità per dimensioni e percentuali
//!
//! ## Policy:
//! - Il listing termina completamente prima che inizi qualsiasi lavoro per file
//! - Le sottodirectory sono ignorate se `recursive` è falso
//! - I path sono sempre costruiti con `Path::join`

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::OptimizeError;

/// Result of listing the target directory
#[derive(Debug, Default)]
pub struct Listing {
    /// Files that will be submitted to the engine
    pub candidates: Vec<PathBuf>,
    /// Files left out by the extension filter
    pub ignored: Vec<PathBuf>,
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// List the entries of `dir`. Direct entries only unless `recursive`.
    pub async fn list_entries(
        dir: &Path,
        recursive: bool,
        all_files: bool,
    ) -> Result<Listing, OptimizeError> {
        let files = if recursive {
            Self::walk(dir).await?
        } else {
            Self::read_direct(dir).await?
        };

        let mut listing = Listing::default();
        for path in files {
            if all_files || Self::is_svg(&path) {
                listing.candidates.push(path);
            } else {
                debug!("Ignoring non-SVG file: {}", path.display());
                listing.ignored.push(path);
            }
        }
        listing.candidates.sort();
        listing.ignored.sort();
        Ok(listing)
    }

    async fn read_direct(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
        let listing_error = |source| OptimizeError::Listing {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(dir).await.map_err(listing_error)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            let path = dir.join(entry.file_name());
            let file_type = entry.file_type().await.map_err(listing_error)?;
            if file_type.is_dir() {
                debug!("Skipping subdirectory: {}", path.display());
                continue;
            }
            files.push(path);
        }
        Ok(files)
    }

    async fn walk(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
        let root = dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
                let entry = entry.map_err(|e| OptimizeError::Listing {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                })?;
                if !entry.file_type().is_dir() {
                    files.push(entry.into_path());
                }
            }
            Ok(files)
        })
        .await
        .map_err(|e| OptimizeError::Listing {
            path: dir.to_path_buf(),
            source: std::io::Error::other(e),
        })?
    }

    /// Check if a file has an `.svg` extension (case-insensitive)
    pub fn is_svg(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("svg"))
            .unwrap_or(false)
    }

    /// Read the full content as UTF-8 text
    pub async fn read_text(path: &Path) -> Result<String, OptimizeError> {
        fs::read_to_string(path).await.map_err(|source| OptimizeError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite `path` with `content`. Writes a temp file next to the real
    /// target, then renames it over the target so readers never see a
    /// half-written document. Symlinks are written through and the target's
    /// permission bits are kept.
    pub async fn write_in_place(path: &Path, content: &str) -> Result<(), OptimizeError> {
        let write_error = |source| OptimizeError::Write {
            path: path.to_path_buf(),
            source,
        };

        let target = fs::canonicalize(path).await.map_err(write_error)?;
        let permissions = fs::metadata(&target).await.map_err(write_error)?.permissions();
        if permissions.readonly() {
            return Err(write_error(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "file is read-only",
            )));
        }

        let file_name = target
            .file_name()
            .ok_or_else(|| write_error(std::io::Error::other("path has no file name")))?;
        let mut temp_name = std::ffi::OsString::from(".");
        temp_name.push(file_name);
        temp_name.push(".svgo-tmp");
        let temp_path = target.with_file_name(temp_name);

        let staged = async {
            fs::write(&temp_path, content).await?;
            fs::set_permissions(&temp_path, permissions).await?;
            fs::rename(&temp_path, &target).await?;
            Ok::<(), std::io::Error>(())
        };

        match staged.await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(write_error(e))
            }
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
