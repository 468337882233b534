//! ZIP archive creation and verification.
//!
//! Archives are built reproducibly: entries are sorted by relative path and
//! carry fixed timestamps and permissions, so identical staging directories
//! always produce byte-identical archives.

use super::error::PackagingError;
use log::{debug, warn};
use std::fs;
use std::io::{self, Seek, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Archives every regular file under `source_dir` into a new file at
/// `archive_path`.
///
/// Entry names are paths relative to `source_dir` with `/` separators.
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns [`PackagingError::Io`] when `archive_path` already exists or the
/// tree cannot be walked or read, or [`PackagingError::Zip`] when the archive
/// cannot be written.
pub fn create_zip(source_dir: &Path, archive_path: &Path) -> Result<usize, PackagingError> {
    write_zip(source_dir, fs::File::create_new(archive_path)?)
}

/// Writes every regular file under `source_dir` as a ZIP stream to `writer`.
///
/// # Errors
///
/// As for [`create_zip`].
pub fn write_zip<W: Write + Seek>(source_dir: &Path, writer: W) -> Result<usize, PackagingError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| io::Error::other("archive entry outside source directory"))?;
        entries.push((entry_name(relative), entry.path().to_path_buf()));
    }
    entries.sort();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    let mut zip = ZipWriter::new(writer);
    for (name, path) in &entries {
        debug!("adding {name} from {}", source_dir.display());
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut fs::File::open(path)?, &mut zip)?;
    }
    zip.finish()?;
    Ok(entries.len())
}

/// Checks that an archive exists, is non-empty, opens, and that every entry
/// reads back with a valid CRC.
///
/// Problems are logged and reported as `false`; they are not errors.
#[must_use]
pub fn verify_archive(archive_path: &Path) -> bool {
    match check_archive(archive_path) {
        Ok(()) => true,
        Err(reason) => {
            warn!("archive {} failed verification: {reason}", archive_path.display());
            false
        }
    }
}

fn check_archive(archive_path: &Path) -> Result<(), String> {
    let metadata = fs::metadata(archive_path).map_err(|e| format!("not readable: {e}"))?;
    if metadata.len() == 0 {
        return Err("archive is empty".to_owned());
    }
    let file = fs::File::open(archive_path).map_err(|e| format!("cannot open: {e}"))?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("not a ZIP archive: {e}"))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| format!("entry {index} unreadable: {e}"))?;
        let name = entry.name().to_owned();
        io::copy(&mut entry, &mut io::sink()).map_err(|e| format!("entry {name} corrupt: {e}"))?;
    }
    Ok(())
}

/// Validates a target name and returns it as a relative path.
///
/// Rejects empty names, absolute paths, and any `..` component so staged
/// files always stay inside the release directory.
///
/// # Errors
///
/// Returns [`PackagingError::InvalidTargetName`] for unsafe names.
pub fn validate_target_name(name: &str) -> Result<PathBuf, PackagingError> {
    let invalid = || PackagingError::InvalidTargetName {
        name: name.to_owned(),
    };
    let path = Path::new(name);
    if name.trim().is_empty() || path.is_absolute() {
        return Err(invalid());
    }
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok(relative)
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
