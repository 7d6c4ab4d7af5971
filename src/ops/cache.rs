//! Artifact cache.
//!
//! Built artifacts are kept in a tool-cache directory tree keyed by tool name
//! and version:
//!
//! ```text
//! <root>/<tool>/<version>/<arch>/<file>
//! <root>/<tool>/<version>/<arch>.complete
//! ```
//!
//! The `.complete` marker is written last, so an entry interrupted mid-store
//! is never reported by [`ArtifactCache::lookup`]. Entries are trusted as-is
//! once complete.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{SetupError, SetupResult};
use crate::util::fs::{copy_file, ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::hash::sha256_file;

/// A stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Directory holding the artifact.
    pub dir: PathBuf,
    pub file_name: String,
    pub sha256: String,
    pub size: u64,
}

impl CacheEntry {
    /// Full path to the cached artifact.
    pub fn artifact(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Storage for built artifacts keyed by (tool, version).
pub trait ArtifactCache {
    /// Directory of a complete entry, if any.
    fn lookup(&self, tool: &str, version: &str) -> SetupResult<Option<PathBuf>>;

    /// Copy `file` into the entry for (tool, version) as `file_name`,
    /// replacing whatever was stored there.
    fn store(&self, file: &Path, file_name: &str, tool: &str, version: &str) -> SetupResult<CacheEntry>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMarker {
    file: String,
    sha256: String,
    size: u64,
}

/// Directory-backed [`ArtifactCache`] using the runner tool-cache layout.
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
    arch: String,
}

impl ToolCache {
    /// Cache rooted at `root` for the host architecture.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ToolCache::with_arch(root, std::env::consts::ARCH)
    }

    pub fn with_arch(root: impl Into<PathBuf>, arch: &str) -> Self {
        ToolCache {
            root: root.into(),
            arch: arch.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    fn entry_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version).join(&self.arch)
    }

    fn marker_path(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(format!("{}.complete", self.arch))
    }

    fn store_entry(&self, file: &Path, file_name: &str, tool: &str, version: &str) -> SetupResult<CacheEntry> {
        let dir = self.entry_dir(tool, version);
        let marker = self.marker_path(tool, version);

        if marker.exists() {
            std::fs::remove_file(&marker).map_err(|e| SetupError::io(&marker, e))?;
        }
        remove_dir_all_if_exists(&dir)?;
        ensure_dir(&dir)?;

        let size = copy_file(file, &dir.join(file_name))?;
        let sha256 = sha256_file(&dir.join(file_name))?;

        let contents = serde_json::to_string_pretty(&CompletionMarker {
            file: file_name.to_string(),
            sha256: sha256.clone(),
            size,
        })
        .map_err(|e| SetupError::Cache {
            reason: e.to_string(),
        })?;
        write_string(&marker, &contents)?;

        Ok(CacheEntry {
            dir,
            file_name: file_name.to_string(),
            sha256,
            size,
        })
    }
}

impl ArtifactCache for ToolCache {
    fn lookup(&self, tool: &str, version: &str) -> SetupResult<Option<PathBuf>> {
        let dir = self.entry_dir(tool, version);
        let marker = self.marker_path(tool, version);

        if !marker.is_file() || !dir.is_dir() {
            tracing::debug!("no cache entry for {}@{}", tool, version);
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&marker).map_err(|e| SetupError::io(&marker, e))?;
        match serde_json::from_str::<CompletionMarker>(&contents) {
            Ok(recorded) => {
                tracing::debug!(
                    "cache hit for {}@{}: {} (sha256 {})",
                    tool,
                    version,
                    recorded.file,
                    recorded.sha256
                );
                Ok(Some(dir))
            }
            Err(e) => {
                tracing::warn!("ignoring unreadable cache marker {}: {}", marker.display(), e);
                Ok(None)
            }
        }
    }

    fn store(&self, file: &Path, file_name: &str, tool: &str, version: &str) -> SetupResult<CacheEntry> {
        tracing::info!("Caching {} as {}@{}", file.display(), tool, version);

        self.store_entry(file, file_name, tool, version)
            .map_err(|e| match e {
                SetupError::Cache { .. } => e,
                other => SetupError::Cache {
                    reason: format!("failed to store {}@{}: {}", tool, version, other),
                },
            })
    }
}
