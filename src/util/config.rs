//! Configuration file support for setup-otp.
//!
//! Two configuration file locations are read:
//! - Global: `~/.setup-otp/config.toml` - User-wide defaults
//! - Project: `.setup-otp/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Upstream list of OTP releases.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/erlang/otp/master/otp_versions.table";

/// Base URL for `OTP-<version>.tar.gz` source archives.
pub const DEFAULT_ARCHIVE_BASE_URL: &str = "https://github.com/erlang/otp/archive";

/// GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Tool-cache key the primary pipeline stores builds under.
pub const DEFAULT_CACHE_KEY: &str = "otp-release";

/// setup-otp configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream locations
    pub sources: SourcesConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Install settings
    pub install: InstallConfig,

    /// Tool cache settings
    pub cache: CacheConfig,

    /// Release publishing settings
    pub release: ReleaseConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Where versions and sources come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Version manifest URL
    pub catalog_url: Option<String>,

    /// Base URL that `OTP-<version>.tar.gz` is appended to
    pub archive_base_url: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of parallel make jobs (None = logical CPU count)
    pub jobs: Option<usize>,

    /// Extra arguments appended to `./configure`
    pub configure_args: Vec<String>,
}

/// Install-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Install root (None = ~/.local/otp)
    pub root: Option<PathBuf>,
}

/// Tool cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (None = $RUNNER_TOOL_CACHE, then the platform cache dir)
    pub dir: Option<PathBuf>,

    /// Cache key name for built releases
    pub key: Option<String>,
}

/// Release publishing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// REST API root for the release host
    pub api_url: Option<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Connect timeout in seconds
    pub timeout_secs: Option<u64>,

    /// User-Agent header override
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.sources.catalog_url.is_some() {
            self.sources.catalog_url = other.sources.catalog_url;
        }
        if other.sources.archive_base_url.is_some() {
            self.sources.archive_base_url = other.sources.archive_base_url;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if !other.build.configure_args.is_empty() {
            self.build.configure_args = other.build.configure_args;
        }

        if other.install.root.is_some() {
            self.install.root = other.install.root;
        }

        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }
        if other.cache.key.is_some() {
            self.cache.key = other.cache.key;
        }

        if other.release.api_url.is_some() {
            self.release.api_url = other.release.api_url;
        }

        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }
        if other.net.user_agent.is_some() {
            self.net.user_agent = other.net.user_agent;
        }
    }

    pub fn catalog_url(&self) -> &str {
        self.sources
            .catalog_url
            .as_deref()
            .unwrap_or(DEFAULT_CATALOG_URL)
    }

    pub fn archive_base_url(&self) -> &str {
        self.sources
            .archive_base_url
            .as_deref()
            .unwrap_or(DEFAULT_ARCHIVE_BASE_URL)
    }

    pub fn api_url(&self) -> &str {
        self.release.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn cache_key(&self) -> &str {
        self.cache.key.as_deref().unwrap_or(DEFAULT_CACHE_KEY)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.setup-otp/config.toml)
/// 2. Global config (~/.setup-otp/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
