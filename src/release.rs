//! Caller-supplied release descriptors.
//!
//! A [`ReleaseDescriptor`] is plain data handed to the validator and the
//! packaging engine. The core never mutates it; packaging works on copies of
//! the metadata when it needs to merge in the group and date.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Free-form release metadata keyed by field name.
pub type Metadata = BTreeMap<String, Value>;

/// A release as described by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseDescriptor {
    /// Release (directory) name, e.g. `Author-Title-EPUB-2024-GROUP`.
    pub name: String,
    /// Releasing group.
    pub group: String,
    /// Release category such as `EBOOK`.
    pub release_type: String,
    /// Descriptive metadata (title, author, isbn, ...).
    pub metadata: Metadata,
    /// Payload files to stage.
    pub files: Vec<FileEntry>,
    /// Release date rendered into the NFO footer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Pre-rendered NFO text; when set the formatter is bypassed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfo_content: Option<String>,
}

impl ReleaseDescriptor {
    /// Create a descriptor with a name and group and no files.
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            ..Self::default()
        }
    }

    /// Add a payload file; bare paths are staged under their own file name.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<FileEntry>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Set a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One payload file, optionally renamed inside the release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FileEntryRepr")]
pub struct FileEntry {
    /// Source path on disk.
    pub path: PathBuf,
    /// Target name relative to the release directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FileEntry {
    /// A file kept under its source file name.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
        }
    }

    /// A file renamed to `name` inside the release.
    #[must_use]
    pub fn renamed(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
        }
    }

    /// Name the file carries inside the release.
    ///
    /// Falls back to the source file name, or the whole path when it has no
    /// final component.
    #[must_use]
    pub fn target_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.path.file_name().map_or_else(
                || self.path.to_string_lossy().into_owned(),
                |n| n.to_string_lossy().into_owned(),
            ),
        }
    }

    /// Path used for extension checks: the target name when set.
    #[must_use]
    pub fn effective_path(&self) -> &Path {
        self.name.as_deref().map_or(self.path.as_path(), Path::new)
    }
}

impl From<PathBuf> for FileEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for FileEntry {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntryRepr {
    Bare(PathBuf),
    Named {
        path: PathBuf,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<FileEntryRepr> for FileEntry {
    fn from(repr: FileEntryRepr) -> Self {
        match repr {
            FileEntryRepr::Bare(path) => Self::new(path),
            FileEntryRepr::Named { path, name } => Self { path, name },
        }
    }
}

/// Render a metadata value as display text.
///
/// Strings are returned verbatim, arrays are joined with `", "`, null becomes
/// the empty string and everything else uses its JSON form.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Whether a metadata value counts as missing.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
