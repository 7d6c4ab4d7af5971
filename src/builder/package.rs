//! Packaging a built release layout into a single artifact.
//!
//! Artifacts are gzip-compressed tarballs of the platform sub-directory's
//! contents with `./`-relative entries (`./`, `./bin/`, `./bin/erl`, ...), so
//! installers strip exactly one leading component.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header, HeaderMode};
use walkdir::WalkDir;

use crate::builder::otp::OtpBuilder;
use crate::core::{SetupError, SetupResult};
use crate::util::fs::single_subdirectory;

/// File name of the artifact produced by the install pipeline.
pub const RELEASE_ARCHIVE: &str = "release.tar.gz";

/// Find the single platform-named directory under `release`.
pub fn locate_release_subdirectory(release: &Path) -> SetupResult<PathBuf> {
    single_subdirectory(release, "platform release directory")
}

/// Archive the platform sub-directory of `release` into `<release>/<name>`.
pub fn archive(release: &Path, output_name: &str) -> SetupResult<PathBuf> {
    let subdir = locate_release_subdirectory(release)?;
    let output = release.join(output_name);

    tracing::info!("Archiving {} to {}", subdir.display(), output.display());

    write_archive(&subdir, &output).map_err(|e| {
        let _ = fs::remove_file(&output);
        SetupError::Archive {
            path: subdir.clone(),
            reason: e.to_string(),
        }
    })?;

    Ok(output)
}

/// Build `source` and archive its release layout as `asset_name`.
pub fn make_release_asset(builder: &OtpBuilder<'_>, source: &Path, asset_name: &str) -> SetupResult<PathBuf> {
    let release = builder.make(source)?;
    archive(&release, asset_name)
}

fn write_archive(dir: &Path, output: &Path) -> io::Result<()> {
    let file = File::create(output)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);

    let root = fs::metadata(dir)?;
    let mut header = directory_header(&root);
    append_raw(&mut builder, &mut header, "./", io::empty())?;

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(io::Error::other)?;
        let name = archive_name(relative)?;
        let metadata = fs::symlink_metadata(entry.path())?;
        let file_type = metadata.file_type();

        if file_type.is_dir() {
            let mut header = directory_header(&metadata);
            append_raw(&mut builder, &mut header, &format!("{}/", name), io::empty())?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            let mut header = Header::new_gnu();
            header.set_metadata_in_mode(&metadata, HeaderMode::Complete);
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            append_symlink(&mut builder, &mut header, &name, utf8(&target)?)?;
        } else if file_type.is_file() {
            let mut header = Header::new_gnu();
            header.set_metadata_in_mode(&metadata, HeaderMode::Complete);
            header.set_entry_type(EntryType::Regular);
            header.set_size(metadata.len());
            append_raw(&mut builder, &mut header, &name, File::open(entry.path())?)?;
        }
    }

    let mut writer = builder.into_inner()?.finish()?;
    writer.flush()
}

fn directory_header(metadata: &fs::Metadata) -> Header {
    let mut header = Header::new_gnu();
    header.set_metadata_in_mode(metadata, HeaderMode::Complete);
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header
}

fn utf8(path: &Path) -> io::Result<&str> {
    path.to_str().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("non UTF-8 path: {}", path.display()),
        )
    })
}

fn archive_name(relative: &Path) -> io::Result<String> {
    let mut name = String::from(".");
    for component in relative.components() {
        name.push('/');
        name.push_str(utf8(Path::new(component.as_os_str()))?);
    }
    Ok(name)
}

/// Append an entry whose name is written verbatim.
///
/// `Header::set_path` drops `.` components, which would lose the leading
/// `./` that installers strip. Names longer than the ustar field use a GNU
/// long-name record.
pub(crate) fn append_raw<W: Write>(
    builder: &mut Builder<W>,
    header: &mut Header,
    name: &str,
    data: impl Read,
) -> io::Result<()> {
    let bytes = name.as_bytes();

    if bytes.len() > header.as_old().name.len() {
        append_long_record(builder, EntryType::GNULongName, bytes)?;
    }
    fill_field(&mut header.as_old_mut().name, bytes);
    header.set_cksum();

    builder.append(header, data)
}

/// Append a symlink entry; targets longer than the ustar field use a GNU
/// long-link record.
fn append_symlink<W: Write>(
    builder: &mut Builder<W>,
    header: &mut Header,
    name: &str,
    target: &str,
) -> io::Result<()> {
    let bytes = target.as_bytes();

    if bytes.len() > header.as_old().linkname.len() {
        append_long_record(builder, EntryType::GNULongLink, bytes)?;
    }
    fill_field(&mut header.as_old_mut().linkname, bytes);

    append_raw(builder, header, name, io::empty())
}

fn append_long_record<W: Write>(builder: &mut Builder<W>, kind: EntryType, value: &[u8]) -> io::Result<()> {
    let mut long = Header::new_gnu();
    fill_field(&mut long.as_old_mut().name, b"././@LongLink");
    long.set_entry_type(kind);
    long.set_mode(0o644);
    long.set_size(value.len() as u64 + 1);
    long.set_cksum();
    builder.append(&long, value.chain(&[0u8][..]))
}

/// Copy `value` into a fixed header field, truncating and zero-padding.
fn fill_field(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field.fill(0);
    field[..len].copy_from_slice(&value[..len]);
}
