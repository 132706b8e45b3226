//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use shop_commerce::checkout::ReturnUrls;
use shop_commerce::prelude::{BackendApi, Cache};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, with environment overrides applied.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let mut config = load_config(config_path, &cwd)?;
        config.apply_env();

        Ok(Self { config, output, cwd })
    }

    /// Open the persistent client store.
    pub fn cache(&self) -> Result<Cache> {
        let dir = self.config.storage_dir();
        self.output.debug(&format!("store: {}", dir.display()));
        Cache::open_dir(&dir).with_context(|| format!("Failed to open store at {}", dir.display()))
    }

    /// Backend client for the configured host.
    pub fn api(&self) -> BackendApi {
        self.output.debug(&format!("backend: {}", self.config.backend.url));
        BackendApi::with_base_url(self.config.backend.url.trim_end_matches('/'))
    }

    /// Success and cancel URLs under the configured site origin.
    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls::for_origin(&self.config.site.origin)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Explicit config file, else the nearest one at or above `cwd`, else defaults.
///
/// A config file that exists but does not parse is an error.
pub fn load_config(config_path: Option<&str>, cwd: &Path) -> Result<CliConfig> {
    if let Some(path) = config_path {
        return CliConfig::load(path);
    }
    match find_config_path(cwd) {
        Some(path) => CliConfig::load(&path.to_string_lossy()),
        None => Ok(CliConfig::default()),
    }
}

/// Nearest config file at or above `start`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
