//! Test fixtures for common test scenarios.
//!
//! This module builds in-memory tarballs shaped like the upstream OTP source
//! archives and like packaged release artifacts, plus on-disk release
//! layouts.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};

use crate::builder::package::append_raw;

/// Shell script body used for fake toolchain executables.
pub const FAKE_SCRIPT: &[u8] = b"#!/bin/sh\nexit 0\n";

/// One entry of a fixture tarball.
#[derive(Debug, Clone)]
pub struct TarEntry {
    /// Entry name, stored verbatim (`./bin/erl`, `otp-OTP-23.1/configure`).
    pub name: String,
    pub kind: EntryType,
    pub data: Vec<u8>,
    pub mode: u32,
}

impl TarEntry {
    pub fn dir(name: &str) -> Self {
        TarEntry {
            name: name.to_string(),
            kind: EntryType::Directory,
            data: Vec::new(),
            mode: 0o755,
        }
    }

    pub fn file(name: &str, data: &[u8], mode: u32) -> Self {
        TarEntry {
            name: name.to_string(),
            kind: EntryType::Regular,
            data: data.to_vec(),
            mode,
        }
    }
}

/// Build a gzip-compressed tarball from `entries`.
pub fn tarball(entries: &[TarEntry]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = Builder::new(encoder);

    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry.kind);
        header.set_mode(entry.mode);
        header.set_size(entry.data.len() as u64);
        header.set_mtime(1_600_000_000);
        append_raw(&mut builder, &mut header, &entry.name, &entry.data[..]).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A GitHub-style source archive for `version`.
///
/// Besides the build scripts, the tree already holds
/// `release/<platform>/{bin/erl,Install}` so a mocked build leaves a
/// packageable layout behind.
pub fn otp_source_tarball(version: &str, platform: &str) -> Vec<u8> {
    let root = format!("otp-OTP-{}", version);
    tarball(&[
        TarEntry::dir(&format!("{}/", root)),
        TarEntry::file(&format!("{}/otp_build", root), FAKE_SCRIPT, 0o755),
        TarEntry::file(&format!("{}/configure", root), FAKE_SCRIPT, 0o755),
        TarEntry::file(&format!("{}/OTP_VERSION", root), format!("{}\n", version).as_bytes(), 0o644),
        TarEntry::dir(&format!("{}/release/", root)),
        TarEntry::dir(&format!("{}/release/{}/", root, platform)),
        TarEntry::dir(&format!("{}/release/{}/bin/", root, platform)),
        TarEntry::file(&format!("{}/release/{}/bin/erl", root, platform), FAKE_SCRIPT, 0o755),
        TarEntry::file(&format!("{}/release/{}/Install", root, platform), FAKE_SCRIPT, 0o755),
    ])
}

/// A packaged release artifact with `./`-relative entries.
pub fn otp_artifact_tarball() -> Vec<u8> {
    tarball(&[
        TarEntry::dir("./"),
        TarEntry::dir("./bin/"),
        TarEntry::file("./bin/erl", FAKE_SCRIPT, 0o755),
        TarEntry::file("./Install", FAKE_SCRIPT, 0o755),
        TarEntry::dir("./releases/"),
        TarEntry::file("./releases/RELEASES", b"[].\n", 0o644),
    ])
}

/// Create `<dir>/release/<platform>/{bin/erl,Install}` and return `<dir>/release`.
pub fn release_layout(dir: &Path, platform: &str) -> PathBuf {
    let release = dir.join("release");
    let platform_dir = release.join(platform);
    fs::create_dir_all(platform_dir.join("bin")).unwrap();
    fs::write(platform_dir.join("bin").join("erl"), FAKE_SCRIPT).unwrap();
    fs::write(platform_dir.join("Install"), FAKE_SCRIPT).unwrap();
    release
}

/// A manifest document in the `otp_versions.table` format.
pub fn catalog_document(versions: &[&str]) -> String {
    versions
        .iter()
        .map(|v| format!("OTP-{} : erts-11.1 kernel-7.1 stdlib-3.13 # compiler-7.6.4\n", v))
        .collect()
}
