//! Global context for setup-otp operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//! Environment lookups (`RUNNER_TOOL_CACHE`, `RUNNER_TEMP`) happen once, when
//! the context is created, so the pipeline itself never reads process state.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::util::config::{load_config, Config};
use crate::util::process::logical_cpus;

/// Project directories for setup-otp
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "setup-otp", "setup-otp"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Invoking user's home directory
    home: PathBuf,

    /// Root of the artifact tool cache
    cache_dir: PathBuf,

    /// Scratch space for downloads and builds
    work_dir: PathBuf,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext from the environment and config files.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let home = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .context("failed to determine the home directory")?;

        let config = load_config(
            &home.join(".setup-otp").join("config.toml"),
            &cwd.join(".setup-otp").join("config.toml"),
        );

        let cache_dir = match (&config.cache.dir, std::env::var_os("RUNNER_TOOL_CACHE")) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) if !dir.is_empty() => PathBuf::from(dir),
            _ => PROJECT_DIRS
                .as_ref()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .unwrap_or_else(|| home.join(".setup-otp").join("cache")),
        };

        let work_dir = std::env::var_os("RUNNER_TEMP")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("setup-otp");

        Ok(GlobalContext {
            cwd,
            home,
            cache_dir,
            work_dir,
            config,
        })
    }

    /// Create a context rooted entirely at explicit paths.
    ///
    /// The cache and work directories live under `home`.
    pub fn with_home(home: PathBuf, config: Config) -> Self {
        let cache_dir = config
            .cache
            .dir
            .clone()
            .unwrap_or_else(|| home.join(".setup-otp").join("cache"));
        let work_dir = home.join(".setup-otp").join("work");

        GlobalContext {
            cwd: home.clone(),
            home,
            cache_dir,
            work_dir,
            config,
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory OTP is installed into (`~/.local/otp` unless configured).
    pub fn install_root(&self) -> PathBuf {
        self.config
            .install
            .root
            .clone()
            .unwrap_or_else(|| self.home.join(".local").join("otp"))
    }

    /// Root of the artifact tool cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Scratch directory for downloads and source trees.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Parallel make jobs.
    pub fn jobs(&self) -> usize {
        self.config.build.jobs.unwrap_or_else(logical_cpus)
    }
}
