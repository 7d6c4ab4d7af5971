//! Source archive download and extraction.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::TempDir;

use crate::core::{ResolvedVersion, SetupError, SetupResult};
use crate::sources::http::HttpClient;
use crate::util::fs::{ensure_dir, list_subdirectories};

/// An extracted source tree.
///
/// The backing temporary directory is removed when this value drops.
#[derive(Debug)]
pub struct SourceTree {
    _extracted: TempDir,
    root: PathBuf,
}

impl SourceTree {
    /// The top-level source directory (`otp-OTP-<version>`).
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Downloads and unpacks upstream source archives.
pub struct SourceFetcher<'a> {
    http: &'a dyn HttpClient,
    base_url: String,
    work_dir: PathBuf,
}

impl<'a> SourceFetcher<'a> {
    /// Create a fetcher that downloads from `base_url` into `work_dir`.
    pub fn new(http: &'a dyn HttpClient, base_url: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        SourceFetcher {
            http,
            base_url: base_url.into(),
            work_dir: work_dir.into(),
        }
    }

    /// `<base>/OTP-<version>.tar.gz`
    pub fn archive_url(&self, version: &ResolvedVersion) -> String {
        format!("{}/{}.tar.gz", self.base_url.trim_end_matches('/'), version.tag())
    }

    /// Download the source archive for `version`.
    pub fn download(&self, version: &ResolvedVersion) -> SetupResult<PathBuf> {
        ensure_dir(&self.work_dir)?;

        let url = self.archive_url(version);
        let dest = self.work_dir.join(format!("{}.tar.gz", version.tag()));

        tracing::info!("Downloading {}", url);
        let bytes = self.http.download(&url, &dest)?;
        tracing::debug!("downloaded {} bytes to {}", bytes, dest.display());

        Ok(dest)
    }

    /// Unpack `archive` into a fresh temporary directory.
    pub fn extract(&self, archive: &Path) -> SetupResult<TempDir> {
        ensure_dir(&self.work_dir)?;

        let dest = tempfile::Builder::new()
            .prefix("otp-src-")
            .tempdir_in(&self.work_dir)
            .map_err(|e| SetupError::io(&self.work_dir, e))?;

        unpack_archive(archive, dest.path(), 0)?;
        Ok(dest)
    }

    /// Download, extract and locate the source tree for `version`.
    pub fn fetch(&self, version: &ResolvedVersion) -> SetupResult<SourceTree> {
        let archive = self.download(version)?;
        let extracted = self.extract(&archive)?;
        let root = locate_source_root(extracted.path(), version)?;

        // the archive is not needed once unpacked
        if let Err(e) = fs::remove_file(&archive) {
            tracing::debug!("could not remove {}: {}", archive.display(), e);
        }

        Ok(SourceTree {
            _extracted: extracted,
            root,
        })
    }
}

/// Find the `otp-OTP-<version>` directory inside an extracted archive.
///
/// It must be the only top-level directory.
pub fn locate_source_root(dir: &Path, version: &ResolvedVersion) -> SetupResult<PathBuf> {
    let expected = version.source_dir_name();
    let found = list_subdirectories(dir)?;

    if found.len() == 1 && found[0] == expected {
        return Ok(dir.join(&expected));
    }

    Err(SetupError::Structure {
        dir: dir.to_path_buf(),
        expected: format!("only the source directory `{}`", expected),
        found,
    })
}

/// Unpack a gzip-compressed tarball on disk into `dest`.
///
/// `strip_components` leading path components are removed from every
/// entry, as `tar --strip-components` does; a leading `.` counts as one.
pub fn unpack_archive(archive: &Path, dest: &Path, strip_components: usize) -> SetupResult<()> {
    let file = File::open(archive).map_err(|e| SetupError::io(archive, e))?;

    extract_tarball(BufReader::new(file), dest, strip_components).map_err(|reason| {
        SetupError::Extract {
            archive: archive.to_path_buf(),
            reason,
        }
    })
}

/// Extract a gzip-compressed tar stream into `dest`.
pub fn extract_tarball(reader: impl Read, dest: &Path, strip_components: usize) -> Result<(), String> {
    let mut archive = Archive::new(GzDecoder::new(reader));

    fs::create_dir_all(dest)
        .map_err(|e| format!("failed to create {}: {}", dest.display(), e))?;

    let entries = archive
        .entries()
        .map_err(|e| format!("failed to read tarball entries: {}", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| format!("failed to read tarball entry: {}", e))?;
        let entry_path = entry
            .path()
            .map_err(|e| format!("failed to get entry path: {}", e))?
            .into_owned();

        let relative = match strip_path(&entry_path, strip_components)? {
            Some(relative) => relative,
            None => continue,
        };
        let output_path = dest.join(&relative);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                fs::create_dir_all(&output_path)
                    .map_err(|e| format!("failed to create {}: {}", output_path.display(), e))?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::Symlink => {
                if output_path.symlink_metadata().is_ok() && !output_path.is_dir() {
                    let _ = fs::remove_file(&output_path);
                }
                entry
                    .unpack(&output_path)
                    .map_err(|e| format!("failed to extract {}: {}", entry_path.display(), e))?;
            }
            tar::EntryType::Link => {
                let target = entry
                    .link_name()
                    .map_err(|e| format!("bad link in {}: {}", entry_path.display(), e))?
                    .map(|target| target.into_owned());
                let target = match target.map(|t| strip_path(&t, strip_components)) {
                    Some(Ok(Some(target))) => dest.join(target),
                    _ => return Err(format!("hard link {} has no target", entry_path.display())),
                };
                if output_path.exists() {
                    let _ = fs::remove_file(&output_path);
                }
                fs::hard_link(&target, &output_path)
                    .or_else(|_| fs::copy(&target, &output_path).map(|_| ()))
                    .map_err(|e| format!("failed to link {}: {}", output_path.display(), e))?;
            }
            _ => {
                // pax headers, fifos, devices
                tracing::trace!("skipping {:?} entry {}", entry_type, entry_path.display());
            }
        }
    }

    Ok(())
}

/// Drop `n` leading components and reject paths escaping the destination.
///
/// Returns `None` for entries that vanish entirely after stripping.
fn strip_path(path: &Path, n: usize) -> Result<Option<PathBuf>, String> {
    let mut stripped = PathBuf::new();

    for component in path.components().skip(n) {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(format!(
                    "tarball entry escapes destination directory: {}",
                    path.display()
                ));
            }
        }
    }

    if stripped.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(stripped))
    }
}
