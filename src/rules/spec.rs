//! Structured rule specification types.
//!
//! Every section of a [`RuleSpec`] has a canonical eBook-2022 default. The
//! parser substitutes these defaults section by section, so a spec is never
//! partially empty.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum release directory name length accepted by the Scene.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 243;

/// Naming template of the eBook-2022 rules.
pub const DEFAULT_NAMING_PATTERN: &str = "GroupName-Author-Title-Format-Language-Year-ISBN-eBook";

/// Accepted payload extensions of the eBook-2022 rules.
pub const DEFAULT_FILE_FORMATS: [&str; 7] = [".pdf", ".epub", ".cbz", ".azw", ".kf8", ".prc", ".mobi"];

/// Companion files required by the eBook-2022 rules.
pub const DEFAULT_REQUIRED_FILES: [&str; 3] = ["zip", "diz", "nfo"];

/// Allowed ZIP volume sizes in bytes (5, 10, 50, 100, 150, 200, 250 MB).
pub const DEFAULT_ZIP_SIZES_BYTES: [u64; 7] = [
    5_000_000,
    10_000_000,
    50_000_000,
    100_000_000,
    150_000_000,
    200_000_000,
    250_000_000,
];

/// Maximum number of files in one ZIP.
pub const DEFAULT_ZIP_MAX_FILES: usize = 99;

/// NFO line width.
pub const DEFAULT_NFO_WIDTH: usize = 80;

/// DIZ line width.
pub const DEFAULT_DIZ_WIDTH: usize = 44;

/// DIZ line count.
pub const DEFAULT_DIZ_HEIGHT: usize = 30;

/// Structured, machine-usable form of a Scene rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// Accepted payload extensions, lowercase with a leading dot.
    pub file_formats: BTreeSet<String>,
    /// Release naming constraints.
    pub naming: NamingSpec,
    /// Required companion file tokens (`zip`, `diz`, `nfo`, `rar`).
    pub required_files: BTreeSet<String>,
    /// Per-container packaging constraints.
    pub packaging: PackagingSpec,
    /// Metadata fields that must be present and non-blank.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
    /// Metadata fields whose absence only produces a warning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_fields: Vec<String>,
    /// Field name to regular expression the field value must match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata_formats: BTreeMap<String, String>,
}

impl Default for RuleSpec {
    fn default() -> Self {
        Self {
            file_formats: default_file_formats(),
            naming: NamingSpec::default(),
            required_files: default_required_files(),
            packaging: PackagingSpec::default(),
            required_fields: Vec::new(),
            recommended_fields: Vec::new(),
            metadata_formats: BTreeMap::new(),
        }
    }
}

/// The default accepted extensions as a sorted set.
#[must_use]
pub fn default_file_formats() -> BTreeSet<String> {
    DEFAULT_FILE_FORMATS.iter().map(|f| (*f).to_owned()).collect()
}

/// The default required companion files as a sorted set.
#[must_use]
pub fn default_required_files() -> BTreeSet<String> {
    DEFAULT_REQUIRED_FILES.iter().map(|f| (*f).to_owned()).collect()
}

/// Release naming constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingSpec {
    /// Naming template such as `GroupName-Author-Title`.
    pub pattern: String,
    /// Component separators used by the template.
    pub separators: Vec<String>,
    /// Template components in order.
    pub components: Vec<NamingComponent>,
    /// Maximum release name length in characters.
    pub max_length: usize,
    /// Regular expression a release name must fully match.
    #[serde(default, rename = "regex", skip_serializing_if = "Option::is_none")]
    pub name_regex: Option<String>,
    /// Regular expression describing the whole set of allowed characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_chars: Option<String>,
}

impl NamingSpec {
    /// Build a spec from a parsed template where every component is a
    /// required free-form string.
    #[must_use]
    pub fn from_template(pattern: &str) -> Self {
        let components = pattern
            .split('-')
            .map(|name| NamingComponent {
                name: name.to_owned(),
                required: true,
                constraint: ComponentConstraint::Format("string".to_owned()),
            })
            .collect();
        Self {
            pattern: pattern.to_owned(),
            separators: vec!["-".to_owned()],
            components,
            max_length: DEFAULT_MAX_NAME_LENGTH,
            name_regex: None,
            allowed_chars: None,
        }
    }

    /// Look up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&NamingComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

impl Default for NamingSpec {
    fn default() -> Self {
        let component = |name: &str, required: bool, constraint: ComponentConstraint| {
            NamingComponent {
                name: name.to_owned(),
                required,
                constraint,
            }
        };
        let format = |f: &str| ComponentConstraint::Format(f.to_owned());
        let values = ["EPUB", "PDF", "CBZ", "MOBI", "AZW", "KF8", "PRC"]
            .iter()
            .map(|v| (*v).to_owned())
            .collect();

        Self {
            pattern: DEFAULT_NAMING_PATTERN.to_owned(),
            separators: vec!["-".to_owned()],
            components: vec![
                component("GroupName", true, format("SceneGroup")),
                component("Author", true, format("AuthorName")),
                component("Title", true, format("BookTitle")),
                component("Format", true, ComponentConstraint::Values(values)),
                component("Language", false, format("ISO639")),
                component("Year", true, format("YYYY")),
                component("ISBN", false, format("ISBN13")),
                component(
                    "eBook",
                    true,
                    ComponentConstraint::Fixed("eBook".to_owned()),
                ),
            ],
            max_length: DEFAULT_MAX_NAME_LENGTH,
            name_regex: None,
            allowed_chars: None,
        }
    }
}

/// One component of a naming template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingComponent {
    /// Component name as written in the template.
    pub name: String,
    /// Whether the component must appear.
    pub required: bool,
    /// Shape of acceptable values.
    #[serde(flatten)]
    pub constraint: ComponentConstraint,
}

/// Shape of values accepted for a naming component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentConstraint {
    /// A named value format such as `YYYY` or `string`.
    Format(String),
    /// One of a closed set of values.
    Values(Vec<String>),
    /// Exactly this literal.
    Fixed(String),
}

/// Constraints per container type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PackagingSpec {
    /// ZIP volume constraints.
    pub zip: ZipSpec,
    /// RAR constraints.
    pub rar: RarSpec,
    /// NFO constraints.
    pub nfo: NfoSpec,
    /// DIZ constraints.
    pub diz: DizSpec,
}

/// ZIP volume constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipSpec {
    /// Whether ZIP packaging is mandatory.
    pub required: bool,
    /// Allowed volume sizes in bytes.
    pub allowed_sizes_bytes: BTreeSet<u64>,
    /// Maximum number of files inside one ZIP.
    pub max_files: usize,
}

impl Default for ZipSpec {
    fn default() -> Self {
        Self {
            required: true,
            allowed_sizes_bytes: DEFAULT_ZIP_SIZES_BYTES.into_iter().collect(),
            max_files: DEFAULT_ZIP_MAX_FILES,
        }
    }
}

/// RAR constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RarSpec {
    /// Whether RAR packaging is mandatory.
    pub required: bool,
}

/// NFO constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfoSpec {
    /// Whether an NFO is mandatory.
    pub required: bool,
    /// Maximum line width in columns.
    pub max_width: usize,
}

impl Default for NfoSpec {
    fn default() -> Self {
        Self {
            required: true,
            max_width: DEFAULT_NFO_WIDTH,
        }
    }
}

/// DIZ constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DizSpec {
    /// Whether a `file_id.diz` is mandatory.
    pub required: bool,
    /// Maximum line width in columns.
    pub max_width: usize,
    /// Maximum number of lines.
    pub max_height: usize,
}

impl Default for DizSpec {
    fn default() -> Self {
        Self {
            required: true,
            max_width: DEFAULT_DIZ_WIDTH,
            max_height: DEFAULT_DIZ_HEIGHT,
        }
    }
}
