//! OTP version catalog parsing and resolution.
//!
//! The upstream `otp_versions.table` lists one release per line, e.g.
//!
//! ```text
//! OTP-23.1 : compiler-7.6.5 erts-11.1 ... # asn1-5.0.14 ...
//! OTP-23.0.4 : erts-11.0.4 # ...
//! ```
//!
//! Only the dotted version after `OTP-` matters here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::{SetupError, SetupResult};

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OTP-([.\d]+)").expect("valid version regex"));

/// Ordered list of published versions, as listed upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    versions: Vec<String>,
}

impl VersionCatalog {
    /// Create a catalog from already-parsed versions.
    pub fn new(versions: Vec<String>) -> Self {
        VersionCatalog { versions }
    }

    /// Parse a manifest document.
    ///
    /// Lines that do not start with `OTP-<digits and dots>` are skipped.
    /// Order is preserved and duplicates are kept.
    pub fn parse(document: &str) -> Self {
        let versions = document
            .trim()
            .lines()
            .filter_map(|line| {
                VERSION_LINE
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .collect();

        VersionCatalog { versions }
    }

    /// Find `specifier` by exact string match.
    pub fn resolve(&self, specifier: &str) -> SetupResult<ResolvedVersion> {
        self.versions
            .iter()
            .find(|v| v.as_str() == specifier)
            .map(|v| ResolvedVersion(v.clone()))
            .ok_or_else(|| SetupError::VersionNotFound {
                specifier: specifier.to_string(),
                candidates: self.versions.clone(),
            })
    }

    /// All versions in manifest order.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// A version confirmed to exist upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedVersion(String);

impl ResolvedVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Git tag used by upstream and by published releases (`OTP-23.1`).
    pub fn tag(&self) -> String {
        format!("OTP-{}", self.0)
    }

    /// Name of the single directory inside the upstream source archive.
    pub fn source_dir_name(&self) -> String {
        format!("otp-OTP-{}", self.0)
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl ResolvedVersion {
    pub(crate) fn for_tests(version: &str) -> Self {
        ResolvedVersion(version.to_string())
    }
}
