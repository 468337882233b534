//! Release staging and archive assembly.

use super::archive::{validate_target_name, verify_archive, write_zip};
use super::checksum::{Checksums, compute_checksums};
use super::error::PackagingError;
use crate::config::ScenepackConfig;
use crate::formatter::{format_filename, normalize_metadata};
use crate::nfo::NfoFormatter;
use crate::release::ReleaseDescriptor;
use crate::rules::RuleSpec;
use crate::rules::spec::DEFAULT_ZIP_MAX_FILES;
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Result of a packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageOutput {
    /// Whether the archive passed verification.
    pub success: bool,
    /// Path to the created archive.
    pub archive_path: PathBuf,
    /// Digests of the archive.
    pub checksums: Checksums,
    /// Directory holding the staged release.
    pub staging_path: PathBuf,
}

/// Builds release archives.
#[derive(Debug, Clone)]
pub struct PackagingEngine {
    formatter: NfoFormatter,
    chunk_size: usize,
    max_files: usize,
}

impl PackagingEngine {
    /// An engine rendering NFOs with `formatter`.
    #[must_use]
    pub fn new(formatter: NfoFormatter, config: &ScenepackConfig) -> Self {
        Self {
            formatter,
            chunk_size: config.packaging.checksum_chunk_size(),
            max_files: DEFAULT_ZIP_MAX_FILES,
        }
    }

    /// An engine sized by a rule: NFO width and ZIP file limit come from
    /// `spec`, the checksum chunk size from `config`.
    #[must_use]
    pub fn from_rules(spec: &RuleSpec, config: &ScenepackConfig) -> Self {
        Self {
            max_files: spec.packaging.zip.max_files,
            ..Self::new(NfoFormatter::new(spec.packaging.nfo.max_width), config)
        }
    }

    /// An engine configured entirely from `config`: NFO width from `[nfo]`,
    /// checksum chunk size from `[packaging]`.
    #[must_use]
    pub fn from_config(config: &ScenepackConfig) -> Self {
        Self::new(NfoFormatter::new(config.nfo.max_width()), config)
    }

    /// The formatter used for generated NFOs.
    #[must_use]
    pub const fn formatter(&self) -> &NfoFormatter {
        &self.formatter
    }

    /// Packages `release` under `output_dir`.
    ///
    /// The release is staged in `output_dir/<name>`, with an NFO named
    /// `<name>.nfo`, and archived to `output_dir/<name>.zip`. A failed
    /// verification is reported through [`PackageOutput::success`].
    ///
    /// # Errors
    ///
    /// Input errors and an existing staging directory or archive are reported
    /// before anything is written. Later filesystem and archive errors remove
    /// whatever this run created before propagating; pre-existing files are
    /// never touched.
    pub fn package(
        &self,
        release: &ReleaseDescriptor,
        output_dir: &Path,
    ) -> Result<PackageOutput, PackagingError> {
        let targets = self.preflight(release)?;

        let archive_path = output_dir.join(format_filename(&release.name, "zip"));
        if archive_path.exists() {
            return Err(PackagingError::ArchiveExists { path: archive_path });
        }
        let staging_path = output_dir.join(&release.name);
        if staging_path.exists() {
            return Err(PackagingError::StagingExists { path: staging_path });
        }

        fs::create_dir_all(output_dir)?;
        match fs::create_dir(&staging_path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(PackagingError::StagingExists { path: staging_path });
            }
            Err(err) => return Err(err.into()),
        }
        info!("staging {} in {}", release.name, staging_path.display());

        let built = self
            .stage(release, &targets, &staging_path)
            .and_then(|()| self.archive(&staging_path, &archive_path));
        match built {
            Ok(checksums) => {
                let success = verify_archive(&archive_path);
                info!(
                    "packaged {} (sha256 {}, verified: {success})",
                    archive_path.display(),
                    checksums.sha256
                );
                Ok(PackageOutput {
                    success,
                    archive_path,
                    checksums,
                    staging_path,
                })
            }
            Err(err) => {
                error!("packaging {} failed: {err}", release.name);
                discard(&staging_path);
                Err(err)
            }
        }
    }

    fn preflight(&self, release: &ReleaseDescriptor) -> Result<Vec<PathBuf>, PackagingError> {
        let name = release.name.as_str();
        if name.trim().is_empty() {
            return Err(PackagingError::EmptyReleaseName);
        }
        if !is_single_component(name) {
            return Err(PackagingError::InvalidReleaseName {
                name: name.to_owned(),
            });
        }
        if release.files.is_empty() {
            return Err(PackagingError::EmptyFileList);
        }
        let count = release.files.len() + 1;
        if count > self.max_files {
            return Err(PackagingError::TooManyFiles {
                count,
                max: self.max_files,
            });
        }

        let nfo = PathBuf::from(format_filename(name, "nfo"));
        let mut seen = BTreeSet::new();
        let mut targets = Vec::with_capacity(release.files.len());
        for file in &release.files {
            let target_name = file.target_name();
            let target = validate_target_name(&target_name)?;
            if target == nfo {
                return Err(PackagingError::ReservedTarget { name: target_name });
            }
            if !seen.insert(target.clone()) {
                return Err(PackagingError::DuplicateTarget { name: target_name });
            }
            targets.push(target);
        }
        Ok(targets)
    }

    fn stage(
        &self,
        release: &ReleaseDescriptor,
        targets: &[PathBuf],
        staging_path: &Path,
    ) -> Result<(), PackagingError> {
        for (file, target) in release.files.iter().zip(targets) {
            if !file.path.is_file() {
                return Err(PackagingError::MissingSource {
                    path: file.path.clone(),
                });
            }
            let destination = staging_path.join(target);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file.path, &destination)?;
            info!("copied {} to {}", file.path.display(), destination.display());
        }

        let nfo_path = staging_path.join(format_filename(&release.name, "nfo"));
        fs::write(&nfo_path, self.nfo_text(release))?;
        info!("wrote {}", nfo_path.display());
        Ok(())
    }

    /// Writes the archive and digests it. The archive file is created
    /// exclusively, and removed again only if this call created it.
    fn archive(
        &self,
        staging_path: &Path,
        archive_path: &Path,
    ) -> Result<Checksums, PackagingError> {
        let file = fs::File::create_new(archive_path).map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                PackagingError::ArchiveExists {
                    path: archive_path.to_path_buf(),
                }
            } else {
                PackagingError::Io(err)
            }
        })?;

        let digested = write_zip(staging_path, file).and_then(|entries| {
            info!("created {} with {entries} entries", archive_path.display());
            Ok(compute_checksums(archive_path, self.chunk_size)?)
        });
        if digested.is_err() {
            let _ = fs::remove_file(archive_path);
        }
        digested
    }

    fn nfo_text(&self, release: &ReleaseDescriptor) -> String {
        if let Some(content) = &release.nfo_content {
            return content.clone();
        }
        let mut metadata = normalize_metadata(&release.metadata);
        if !release.group.trim().is_empty() {
            metadata.insert("group".to_owned(), Value::from(release.group.trim()));
        }
        if let Some(date) = release.date.as_deref().filter(|d| !d.trim().is_empty()) {
            metadata.insert("date".to_owned(), Value::from(date.trim()));
        }
        self.formatter.render(&metadata, None)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Removes a staging directory this run created, ignoring one already gone.
fn discard(staging_path: &Path) {
    if staging_path.exists() {
        let _ = fs::remove_dir_all(staging_path);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
