//! # Tool Path Resolver
//!
//! This module finds the `svgo` executable in different environments:
//! - Explicit path from the configuration
//! - `SVGO_PATH` environment variable
//! - A local `node_modules/.bin` install (project checkout)
//! - System-installed tool on `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::OptimizeError;

/// Base name of the optimization engine executable
pub const SVGO: &str = "svgo";

/// How many parent directories are searched for `node_modules/.bin`
const MAX_SEARCH_DEPTH: usize = 10;

/// Tool path resolver for the SVGO engine
pub struct ToolPathResolver {
    /// Explicit override, checked first
    explicit: Option<PathBuf>,
    /// Directory where the upward `node_modules` search starts
    search_root: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a new path resolver
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            search_root: env::current_dir().ok(),
        }
    }

    /// Start the `node_modules` search from a specific directory
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = Some(root.into());
        self
    }

    /// Resolve the path to the svgo executable
    pub fn resolve(&self) -> Option<PathBuf> {
        // Strategy 1: explicit configuration
        if let Some(ref path) = self.explicit {
            debug!("Checking configured svgo path: {:?}", path);
            if path.is_file() {
                return Some(path.clone());
            }
            warn!("Configured svgo path does not exist: {}", path.display());
        }

        // Strategy 2: SVGO_PATH environment variable (direct override)
        if let Some(path) = env::var_os("SVGO_PATH").map(PathBuf::from) {
            debug!("Checking SVGO_PATH environment variable: {:?}", path);
            if path.is_file() {
                return Some(path);
            }
        }

        // Strategy 3: local node_modules install, traversing up the directory tree
        if let Some(path) = self.search_root.as_deref().and_then(Self::find_in_node_modules) {
            debug!("Found svgo in node_modules: {:?}", path);
            return Some(path);
        }

        // Strategy 4: system PATH
        if let Some(path) = Self::find_in_system_path(SVGO) {
            debug!("Using system svgo: {:?}", path);
            return Some(path);
        }

        warn!("Tool not found: {}", SVGO);
        None
    }

    /// Resolve or fail with installation instructions
    pub fn require(&self) -> Result<PathBuf, OptimizeError> {
        self.resolve().ok_or_else(|| {
            OptimizeError::MissingDependency(format!(
                "'{}' not found. {}",
                SVGO,
                Self::install_instructions()
            ))
        })
    }

    fn find_in_node_modules(start: &Path) -> Option<PathBuf> {
        let mut search_dir = start.to_path_buf();
        for _ in 0..MAX_SEARCH_DEPTH {
            let candidate = search_dir
                .join("node_modules")
                .join(".bin")
                .join(Self::executable_name(SVGO));
            debug!("Checking node_modules path: {:?}", candidate);
            if candidate.is_file() {
                return Some(candidate);
            }

            match search_dir.parent() {
                Some(parent) => search_dir = parent.to_path_buf(),
                None => break,
            }
        }
        None
    }

    /// Find tool in system PATH
    fn find_in_system_path(tool_name: &str) -> Option<PathBuf> {
        let tool_with_ext = Self::executable_name(tool_name);
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(&tool_with_ext))
            .find(|path| path.is_file())
    }

    /// npm installs `.cmd` shims on Windows
    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.cmd", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    fn install_instructions() -> &'static str {
        "Install it with `npm install -g svgo@1`, set SVGO_PATH, or pass --svgo <path>."
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(None)
    }
}
